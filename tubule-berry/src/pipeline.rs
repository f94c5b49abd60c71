//! 完整处理流程.
//!
//! 各阶段严格依次执行: (背景去除) → 全片阈值 → 阈值平滑 → 逐帧掩码 → (囊泡抑制) →
//! 逐帧测量 → 测量表派生列. 单帧失败只记入报告, 配置错误在处理前返回.

use crate::background::BackgroundRemover;
use crate::config::PipelineConfig;
use crate::error::{ConfigResult, FrameError};
use crate::mask::{mask_diagnostic, MaskBuilder};
use crate::measure::{CrossProfileMeasurer, FrameMeasurement, SampleStats};
use crate::table::{MeasurementRow, MeasurementTable};
use crate::threshold::{FrameThresholder, ThresholdSeries};
use crate::vesicle::VesicleSuppressor;
use crate::{Idx2d, LabelMovie, Movie, OwnedLabelSlice};
use log::{info, warn};
use ndarray::{Array2, Array3, Array4, Axis};

/// 单帧处理结果.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// 测量成功.
    Measured(SampleStats),

    /// 掩码构建失败, 该帧掩码全为细胞, 测量行全为 NaN.
    MaskFailed(FrameError),

    /// 掩码正常但无法测量, 宽度为 NaN.
    MeasureFailed(FrameError),
}

impl FrameOutcome {
    /// 是否测量成功?
    #[inline]
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured(_))
    }

    /// 失败原因.
    #[inline]
    pub fn error(&self) -> Option<&FrameError> {
        match self {
            Self::Measured(_) => None,
            Self::MaskFailed(e) | Self::MeasureFailed(e) => Some(e),
        }
    }
}

/// 运行报告.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// 逐帧结果.
    pub outcomes: Vec<FrameOutcome>,

    /// 逐帧被囊泡抑制改为管腔的像素数. 未启用时全为 0.
    pub vesicle_pixels: Vec<usize>,
}

impl RunReport {
    /// 失败帧的序号.
    pub fn failed_frames(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(t, o)| (!o.is_measured()).then_some(t))
            .collect()
    }

    /// 测量成功的帧数.
    pub fn measured(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_measured()).count()
    }
}

/// 一次运行的全部输出.
#[derive(Clone, Debug)]
pub struct RunOutput {
    /// 背景去除后的影像. 未启用时为 `None`.
    pub cleaned: Option<Movie>,

    /// 阈值序列. 输入本身为标签时为 `None`.
    pub thresholds: Option<ThresholdSeries>,

    /// 最终掩码序列.
    pub masks: LabelMovie,

    /// 掩码诊断图, `(t, h, w, 3)`. 输入本身为标签时为 `None`.
    pub mask_diagnostics: Option<Array4<u8>>,

    /// 测量表.
    pub table: MeasurementTable,

    /// 测量诊断图, `(t, h, w)`.
    pub measurement_diagnostics: Array3<u8>,

    /// 运行报告.
    pub report: RunReport,
}

/// 将逐帧二维数组沿时间轴堆叠.
fn stack_frames(shape: Idx2d, frames: &[Array2<u8>]) -> Array3<u8> {
    let mut out = Array3::zeros((frames.len(), shape.0, shape.1));
    for (mut dst, src) in out.axis_iter_mut(Axis(0)).zip(frames.iter()) {
        dst.assign(src);
    }
    out
}

/// 处理流程.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// 以给定配置初始化. 配置非法时返回错误.
    pub fn new(config: PipelineConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 当前配置.
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 从强度影像构建掩码. 返回掩码、逐帧错误及阈值序列.
    fn mask_movie(
        &self,
        source: &Movie,
    ) -> (LabelMovie, Vec<Option<FrameError>>, ThresholdSeries) {
        let c = &self.config;
        let thresholds = FrameThresholder::new(c.threshold).threshold_movie(source);

        info!("Masking {} frames", source.len());
        let builder = MaskBuilder::new(c.mask);
        let built = source.map_frames(|t, frame| builder.build(frame, thresholds.smoothed[t]));

        let shape = source.frame_shape();
        let mut errors = Vec::with_capacity(built.len());
        let mut slices = Vec::with_capacity(built.len());
        for (t, r) in built.into_iter().enumerate() {
            match r {
                Ok(s) => {
                    slices.push(s);
                    errors.push(None);
                }
                Err(e) => {
                    warn!("frame {t}: masking failed: {e}");
                    slices.push(OwnedLabelSlice::cells(shape));
                    errors.push(Some(e));
                }
            }
        }
        (LabelMovie::from_slices(shape, slices), errors, thresholds)
    }

    /// 执行完整流程.
    pub fn run(&self, movie: &Movie) -> ConfigResult<RunOutput> {
        let c = &self.config;
        let (t, h, w) = movie.shape();
        info!("Processing movie of {t} frames, {h} x {w}");

        let mut cleaned = None;
        let mut thresholds = None;
        let (mut masks, mask_errors) = if c.apply_masking {
            if c.remove_background {
                cleaned = Some(BackgroundRemover::new(c.background_multiplier).remove(movie)?);
            }
            let source = cleaned.as_ref().unwrap_or(movie);
            let (masks, errors, series) = self.mask_movie(source);
            thresholds = Some(series);
            (masks, errors)
        } else {
            (LabelMovie::from_movie(movie)?, vec![None; t])
        };
        let failed: Vec<bool> = mask_errors.iter().map(Option::is_some).collect();

        let mut vesicle_pixels = vec![0; t];
        if c.remove_vesicles {
            let correction = VesicleSuppressor::new(c.vesicle.clone()).correct(&masks, &failed);
            masks = correction.masks;
            vesicle_pixels = correction.relabeled;
        }

        let mask_diagnostics = c.apply_masking.then(|| {
            let source = cleaned.as_ref().unwrap_or(movie);
            let mut rgb = Array4::zeros((t, h, w, 3));
            for (i, mut dst) in rgb.axis_iter_mut(Axis(0)).enumerate() {
                dst.assign(&mask_diagnostic(source.frame_at(i), masks.slice_at(i)));
            }
            rgb
        });

        info!("Measuring {t} frames");
        let measurer = CrossProfileMeasurer::new(c.measure_params());
        let measured = masks.map_slices(|i, slice| measurer.measure_or_degenerate(i, slice));

        let mut rows = Vec::with_capacity(t);
        let mut diagnostics = Vec::with_capacity(t);
        let mut outcomes = Vec::with_capacity(t);
        for (i, ((m, result), mask_err)) in measured.into_iter().zip(mask_errors).enumerate() {
            let (m, outcome) = match (mask_err, result) {
                (Some(e), _) => {
                    let nan = FrameMeasurement {
                        row: MeasurementRow::nan(i),
                        diagnostic: Array2::zeros((h, w)),
                        stats: SampleStats::default(),
                    };
                    (nan, FrameOutcome::MaskFailed(e))
                }
                (None, Ok(())) => {
                    let stats = m.stats;
                    (m, FrameOutcome::Measured(stats))
                }
                (None, Err(e)) => {
                    warn!("frame {i}: measurement failed: {e}");
                    (m, FrameOutcome::MeasureFailed(e))
                }
            };
            rows.push(m.row);
            diagnostics.push(m.diagnostic);
            outcomes.push(outcome);
        }

        let report = RunReport {
            outcomes,
            vesicle_pixels,
        };
        info!(
            "Done: {} of {t} frames measured, {} vesicle pixels relabeled",
            report.measured(),
            report.vesicle_pixels.iter().sum::<usize>()
        );

        Ok(RunOutput {
            cleaned,
            thresholds,
            masks,
            mask_diagnostics,
            table: MeasurementTable::new(rows, c.series_window),
            measurement_diagnostics: stack_frames((h, w), &diagnostics),
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::gray::*;
    use crate::error::ConfigError;
    use crate::phantom::TubulePhantom;

    fn init_logger() {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Info)
            .init();
    }

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_invalid_config_aborts() {
        assert_eq!(
            Pipeline::new(PipelineConfig::new(-1.0, 10.0)).unwrap_err(),
            ConfigError::InvalidScale(-1.0)
        );
    }

    #[test]
    fn test_shrinking_lumen_end_to_end() {
        init_logger();
        let phantom = TubulePhantom::new((100, 200), 60, 30);
        let movie = phantom.movie(&[30, 20, 10]).unwrap();
        let out = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(&movie)
            .unwrap();

        assert_eq!(out.report.failed_frames(), Vec::<usize>::new());
        assert_eq!(out.thresholds.as_ref().map(|s| s.len()), Some(3));
        assert_eq!(out.mask_diagnostics.as_ref().map(|d| d.dim()), Some((3, 100, 200, 3)));
        assert_eq!(out.measurement_diagnostics.dim(), (3, 100, 200));

        let area = out.table.column("lumen_area").unwrap();
        assert!(area[0] > area[1] && area[1] > area[2], "{area:?}");
        let norm = out.table.column("lumen_normalized_area").unwrap();
        assert_eq!(norm[0], 1.0);
        assert!(norm.iter().all(|&v| v <= 1.0));

        let lumen = out.table.column("lumen_mean_width").unwrap();
        for (got, want) in lumen.iter().zip([30.0, 20.0, 10.0]) {
            assert!((got - want).abs() <= 1.0, "lumen {got} vs {want}");
        }
        let tubule = out.table.column("tubule_mean_width").unwrap();
        assert!(tubule.iter().all(|&v| (v - 60.0).abs() <= 1.0), "{tubule:?}");
    }

    #[test]
    fn test_prelabeled_input() {
        let phantom = TubulePhantom::new((100, 200), 60, 20);
        let labels = phantom.labels().mapv(i32::from);
        let data = ndarray::stack(Axis(0), &[labels.view(), labels.view()]).unwrap();
        let mut config = PipelineConfig::new(0.5, 10.0);
        config.apply_masking = false;

        let out = Pipeline::new(config)
            .unwrap()
            .run(&Movie::new(data).unwrap())
            .unwrap();
        assert!(out.thresholds.is_none() && out.mask_diagnostics.is_none());
        assert_eq!(out.report.measured(), 2);
        let row = out.table.rows()[1];
        assert!(f64_eq(row.lumen_area, phantom.labels().iter().filter(|&&v| v == LUMEN).count() as f64 * 0.25));
    }

    #[test]
    fn test_invalid_labels_abort() {
        let mut data = Array3::<i32>::zeros((2, 10, 10));
        data[(1, 3, 3)] = 7;
        let mut config = PipelineConfig::default();
        config.apply_masking = false;
        assert_eq!(
            Pipeline::new(config)
                .unwrap()
                .run(&Movie::new(data).unwrap())
                .unwrap_err(),
            ConfigError::InvalidLabel { index: 1, value: 7 }
        );
    }

    #[test]
    fn test_failed_frame_is_reported() {
        let phantom = TubulePhantom::new((100, 200), 60, 20);
        let good = phantom.frame();
        let blank = Array2::from_elem((100, 200), 180);
        let movie = Movie::from_frames([good.clone(), blank, good]).unwrap();
        let out = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(&movie)
            .unwrap();

        assert_eq!(out.report.failed_frames(), vec![1]);
        assert!(matches!(out.report.outcomes[1], FrameOutcome::MaskFailed(_)));
        assert_eq!(out.masks.slice_at(1).count(CELLS), 100 * 200);
        let row = out.table.rows()[1];
        assert!(row.tubule.mean.is_nan() && row.lumen_area.is_nan());
        assert!(out.table.rows()[0].tubule.mean.is_finite());
    }
}
