//! 横截面测量.
//!
//! 对一帧四标签掩码:
//!
//! 1. 提取两个背景区的内边缘作为管道两侧轮廓, 排成曲线并沿主方向对齐;
//! 2. 按弧长每隔固定间隔在两条轮廓上各取一点, 连线读取标签剖面;
//! 3. 由剖面得到管道宽度、管腔宽度和单侧细胞层厚度, 汇总为均值与标准差.
//!
//! 弧长默认取 "点序号 × 尺度". 轮廓弯曲时这会偏离真实间距, 可改用 [`ArcLength::Euclidean`].
//!
//! [`ArcLength::Euclidean`]: crate::config::ArcLength::Euclidean

mod outline;
mod sample;

pub use outline::{outline_of, principal_axis, OutlinePair};
pub use sample::{arc_positions, cross_section, sample_sections, CrossSection, SampleStats};

use crate::config::MeasureParams;
use crate::consts::gray::*;
use crate::error::FrameResult;
use crate::table::{MeasurementRow, WidthStat};
use crate::LabelSlice;
use log::debug;
use ndarray::Array2;

/// 一帧的测量结果.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameMeasurement {
    /// 表格行.
    pub row: MeasurementRow,

    /// 诊断图: 已标注区域为 1, 采样线为 5, 轮廓为 3.
    pub diagnostic: Array2<u8>,

    /// 采样统计.
    pub stats: SampleStats,
}

/// 诊断图底图: 已标注像素为 [`DIAG_LABELED`], 其余为 0.
#[inline]
fn labeled_map(slice: LabelSlice) -> Array2<u8> {
    slice
        .array_view()
        .map(|&p| if is_labeled(p) { DIAG_LABELED } else { 0 })
}

/// 横截面测量器.
#[derive(Copy, Clone, Debug, Default)]
pub struct CrossProfileMeasurer {
    params: MeasureParams,
}

impl CrossProfileMeasurer {
    /// 初始化.
    #[inline]
    pub fn new(params: MeasureParams) -> Self {
        Self { params }
    }

    /// 管腔与细胞组织的面积 (物理单位).
    #[inline]
    fn areas(&self, slice: LabelSlice) -> (f64, f64) {
        let counts = slice.numeric_statistics();
        let unit = self.params.scale.powi(2);
        (
            counts[LUMEN as usize] as f64 * unit,
            counts[CELLS as usize] as f64 * unit,
        )
    }

    /// 测量第 `frame` 帧.
    ///
    /// 轮廓退化时返回 [`crate::FrameError::DegenerateOutline`], 此时可用
    /// [`Self::degenerate`] 获得只含面积的结果.
    pub fn measure(&self, frame: usize, slice: LabelSlice) -> FrameResult<FrameMeasurement> {
        let p = &self.params;
        let pair = OutlinePair::trace(slice, p.outline_window)?;
        let (sections, stats) = sample_sections(slice, &pair, p);
        debug!(
            "frame {frame}: {} of {} cross sections valid ({} on border, {} without lumen)",
            stats.valid, stats.planned, stats.on_border, stats.no_lumen
        );

        let mut diagnostic = labeled_map(slice);
        for pos in sections.iter().flat_map(|s| s.line.iter()) {
            diagnostic[*pos] = DIAG_PROFILE;
        }
        for &pos in pair.points() {
            diagnostic[pos] = DIAG_OUTLINE;
        }

        let (lumen_area, cells_area) = self.areas(slice);
        let collect = |f: fn(&CrossSection) -> f64| -> Vec<f64> { sections.iter().map(f).collect() };
        let row = MeasurementRow {
            frame,
            width_measurements: stats.valid,
            tubule: WidthStat::of(&collect(|s| s.tubule), p.scale),
            lumen: WidthStat::of(&collect(|s| s.lumen), p.scale),
            cells: WidthStat::of(&collect(|s| s.cells), p.scale),
            lumen_area,
            cells_area,
        };
        Ok(FrameMeasurement {
            row,
            diagnostic,
            stats,
        })
    }

    /// 轮廓无法提取时的结果: 宽度为 NaN, 面积照常计算.
    pub fn degenerate(&self, frame: usize, slice: LabelSlice) -> FrameMeasurement {
        let (lumen_area, cells_area) = self.areas(slice);
        FrameMeasurement {
            row: MeasurementRow {
                lumen_area,
                cells_area,
                ..MeasurementRow::nan(frame)
            },
            diagnostic: labeled_map(slice),
            stats: SampleStats::default(),
        }
    }

    /// 测量第 `frame` 帧; 失败时退化为 [`Self::degenerate`], 并附带错误.
    pub fn measure_or_degenerate(
        &self,
        frame: usize,
        slice: LabelSlice,
    ) -> (FrameMeasurement, FrameResult<()>) {
        match self.measure(frame, slice) {
            Ok(m) => (m, Ok(())),
            Err(e) => (self.degenerate(frame, slice), Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArcLength;
    use crate::error::FrameError;
    use ndarray::s;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// 横向直管: 背景 1 在上, 背景 2 在下, 管腔居中.
    fn straight() -> Array2<u8> {
        let mut m = Array2::from_elem((100, 200), CELLS);
        m.slice_mut(s![..20, ..]).fill(BACKGROUND_1);
        m.slice_mut(s![80.., ..]).fill(BACKGROUND_2);
        m.slice_mut(s![40..60, ..]).fill(LUMEN);
        m
    }

    #[test]
    fn test_straight_tubule() {
        let m = straight();
        let out = CrossProfileMeasurer::default()
            .measure(7, LabelSlice::new(m.view()))
            .unwrap();

        // 第 0 个采样点位于图像左边缘.
        assert_eq!(out.stats.planned, 20);
        assert_eq!(out.stats.on_border, 1);
        assert_eq!(out.row.width_measurements, 19);
        assert_eq!(out.row.frame, 7);

        assert!(f64_eq(out.row.tubule.mean, 61.0));
        assert!(f64_eq(out.row.tubule.std, 0.0));
        assert!(f64_eq(out.row.lumen.mean, 19.0));
        assert!(f64_eq(out.row.cells.mean, 21.0));
        assert!(f64_eq(out.row.lumen_area, 20.0 * 200.0));
        assert!(f64_eq(out.row.cells_area, 40.0 * 200.0));
    }

    #[test]
    fn test_scale_and_spacing() {
        let m = straight();
        let params = MeasureParams {
            scale: 0.5,
            spacing: 20.0,
            ..MeasureParams::default()
        };
        let out = CrossProfileMeasurer::new(params)
            .measure(0, LabelSlice::new(m.view()))
            .unwrap();
        // 弧长终点 199 * 0.5, 每 20 个单位采一次.
        assert_eq!(out.stats.planned, 5);
        assert_eq!(out.row.width_measurements, 4);
        assert!(f64_eq(out.row.tubule.mean, 30.5));
        assert!(f64_eq(out.row.lumen_area, 20.0 * 200.0 * 0.25));
    }

    #[test]
    fn test_euclidean_matches_index_on_straight_outline() {
        let m = straight();
        let params = MeasureParams {
            arc_length: ArcLength::Euclidean,
            ..MeasureParams::default()
        };
        let a = CrossProfileMeasurer::new(params)
            .measure(0, LabelSlice::new(m.view()))
            .unwrap();
        let b = CrossProfileMeasurer::default()
            .measure(0, LabelSlice::new(m.view()))
            .unwrap();
        assert_eq!(a.row, b.row);
    }

    #[test]
    fn test_diagnostic_layers() {
        let m = straight();
        let out = CrossProfileMeasurer::default()
            .measure(0, LabelSlice::new(m.view()))
            .unwrap();
        let d = &out.diagnostic;
        assert_eq!(d[(5, 5)], DIAG_LABELED);
        assert_eq!(d[(19, 5)], DIAG_OUTLINE);
        assert_eq!(d[(80, 5)], DIAG_OUTLINE);
        assert_eq!(d[(30, 10)], DIAG_PROFILE);
        assert_eq!(d[(30, 11)], 0);
        assert_eq!(d[(50, 11)], DIAG_LABELED);
    }

    #[test]
    fn test_degenerate_frame() {
        let m = Array2::from_elem((50, 50), CELLS);
        let measurer = CrossProfileMeasurer::default();
        let (out, err) = measurer.measure_or_degenerate(3, LabelSlice::new(m.view()));
        assert_eq!(err, Err(FrameError::DegenerateOutline(BACKGROUND_1, 0)));
        assert!(out.row.tubule.mean.is_nan());
        assert_eq!(out.row.width_measurements, 0);
        assert!(f64_eq(out.row.cells_area, 2500.0));
        assert!(out.diagnostic.iter().all(|&v| v == 0));
    }
}
