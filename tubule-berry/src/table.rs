//! 测量表: 逐帧测量结果及全片派生列.

use crate::algo::{normalize_by_max, running_average};
use std::io::{self, Write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一组宽度样本的均值与总体标准差.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WidthStat {
    /// 均值.
    pub mean: f64,

    /// 总体标准差.
    pub std: f64,
}

impl WidthStat {
    /// 无样本时的统计量.
    pub const NAN: Self = Self {
        mean: f64::NAN,
        std: f64::NAN,
    };

    /// 以 `scale` 缩放后的统计量. 样本为空时两者均为 NaN.
    pub fn of(samples: &[f64], scale: f64) -> Self {
        if samples.is_empty() {
            return Self::NAN;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean: mean * scale,
            std: var.sqrt() * scale,
        }
    }
}

/// 一帧的测量结果.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementRow {
    /// 帧序号.
    pub frame: usize,

    /// 有效横截面样本个数.
    pub width_measurements: usize,

    /// 管道宽度.
    pub tubule: WidthStat,

    /// 管腔宽度.
    pub lumen: WidthStat,

    /// 单侧细胞层厚度.
    pub cells: WidthStat,

    /// 管腔面积.
    pub lumen_area: f64,

    /// 细胞组织面积.
    pub cells_area: f64,
}

impl MeasurementRow {
    /// 宽度与面积全为 NaN 的行, 用于掩码构建失败的帧.
    pub fn nan(frame: usize) -> Self {
        Self {
            frame,
            width_measurements: 0,
            tubule: WidthStat::NAN,
            lumen: WidthStat::NAN,
            cells: WidthStat::NAN,
            lumen_area: f64::NAN,
            cells_area: f64::NAN,
        }
    }
}

/// 需要派生平滑、归一化列的指标.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Metric {
    /// 管道平均宽度.
    TubuleWidth,
    /// 管腔平均宽度.
    LumenWidth,
    /// 细胞层平均厚度.
    CellsWidth,
    /// 管腔面积.
    LumenArea,
    /// 细胞组织面积.
    CellsArea,
}

impl Metric {
    /// 全部指标, 按列顺序排列.
    pub const ALL: [Metric; 5] = [
        Metric::TubuleWidth,
        Metric::LumenWidth,
        Metric::CellsWidth,
        Metric::LumenArea,
        Metric::CellsArea,
    ];

    /// 在行中的取值.
    #[inline]
    fn value(self, row: &MeasurementRow) -> f64 {
        match self {
            Metric::TubuleWidth => row.tubule.mean,
            Metric::LumenWidth => row.lumen.mean,
            Metric::CellsWidth => row.cells.mean,
            Metric::LumenArea => row.lumen_area,
            Metric::CellsArea => row.cells_area,
        }
    }
}

/// 一个指标的派生列.
#[derive(Clone, Debug, PartialEq)]
pub struct Derived {
    /// 平滑值.
    pub smoothed: Vec<f64>,

    /// 除以最大值后的归一化值.
    pub normalized: Vec<f64>,

    /// 归一化值再平滑.
    pub smoothed_normalized: Vec<f64>,
}

impl Derived {
    fn new(values: &[f64], window: usize) -> Self {
        let normalized = normalize_by_max(values);
        Self {
            smoothed: running_average(values, window),
            smoothed_normalized: running_average(&normalized, window),
            normalized,
        }
    }
}

/// 导出时的列名, 顺序固定.
pub const COLUMNS: [&str; 25] = [
    "frame",
    "width_measurements",
    "tubule_mean_width",
    "tubule_mean_width_std",
    "tubule_smoothed_width",
    "tubule_normalized_width",
    "tubule_smoothed_normalized_width",
    "lumen_mean_width",
    "lumen_mean_width_std",
    "lumen_smoothed_width",
    "lumen_normalized_width",
    "lumen_smoothed_normalized_width",
    "cells_mean_width",
    "cells_mean_width_std",
    "cells_smoothed_width",
    "cells_normalized_width",
    "cells_smoothed_normalized_width",
    "lumen_area",
    "lumen_smoothed_area",
    "lumen_normalized_area",
    "lumen_smoothed_normalized_area",
    "cells_area",
    "cells_smoothed_area",
    "cells_normalized_area",
    "cells_smoothed_normalized_area",
];

/// 全片测量表.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementTable {
    rows: Vec<MeasurementRow>,
    derived: Vec<Derived>,
}

impl MeasurementTable {
    /// 由逐帧结果构建, 并以窗口 `window` 计算派生列.
    pub fn new(rows: Vec<MeasurementRow>, window: usize) -> Self {
        let derived = Metric::ALL
            .iter()
            .map(|m| {
                let values: Vec<f64> = rows.iter().map(|r| m.value(r)).collect();
                Derived::new(&values, window)
            })
            .collect();
        Self { rows, derived }
    }

    /// 行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 逐帧结果.
    #[inline]
    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    /// 指标的派生列.
    pub fn derived(&self, metric: Metric) -> &Derived {
        let i = Metric::ALL.iter().position(|&m| m == metric).unwrap_or_default();
        &self.derived[i]
    }

    /// 列名.
    #[inline]
    pub fn header() -> &'static [&'static str] {
        &COLUMNS
    }

    /// 第 `i` 行按列顺序的全部取值.
    pub fn record(&self, i: usize) -> [f64; 25] {
        let r = &self.rows[i];
        let d = |m: Metric| self.derived(m);
        let width = |stat: WidthStat, m: Metric| {
            let x = d(m);
            [stat.mean, stat.std, x.smoothed[i], x.normalized[i], x.smoothed_normalized[i]]
        };
        let area = |v: f64, m: Metric| {
            let x = d(m);
            [v, x.smoothed[i], x.normalized[i], x.smoothed_normalized[i]]
        };

        let mut out = [0.0; 25];
        out[0] = r.frame as f64;
        out[1] = r.width_measurements as f64;
        out[2..7].copy_from_slice(&width(r.tubule, Metric::TubuleWidth));
        out[7..12].copy_from_slice(&width(r.lumen, Metric::LumenWidth));
        out[12..17].copy_from_slice(&width(r.cells, Metric::CellsWidth));
        out[17..21].copy_from_slice(&area(r.lumen_area, Metric::LumenArea));
        out[21..25].copy_from_slice(&area(r.cells_area, Metric::CellsArea));
        out
    }

    /// 按列名取整列. 列名不存在时返回 `None`.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let c = COLUMNS.iter().position(|&n| n == name)?;
        Some((0..self.len()).map(|i| self.record(i)[c]).collect())
    }

    /// 以制表符分隔写出, 首行为列名.
    pub fn write_tsv<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{}", COLUMNS.join("\t"))?;
        for i in 0..self.len() {
            let rec = self.record(i);
            write!(w, "{}\t{}", self.rows[i].frame, self.rows[i].width_measurements)?;
            for v in &rec[2..] {
                write!(w, "\t{v}")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn row(frame: usize, lumen_area: f64) -> MeasurementRow {
        MeasurementRow {
            frame,
            width_measurements: 3,
            tubule: WidthStat { mean: 10.0, std: 1.0 },
            lumen: WidthStat { mean: 4.0, std: 0.5 },
            cells: WidthStat { mean: 3.0, std: 0.25 },
            lumen_area,
            cells_area: 100.0,
        }
    }

    #[test]
    fn test_width_stat() {
        let s = WidthStat::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 0.5);
        assert!(f64_eq(s.mean, 2.5));
        assert!(f64_eq(s.std, 1.0));

        let e = WidthStat::of(&[], 1.0);
        assert!(e.mean.is_nan() && e.std.is_nan());
    }

    #[test]
    fn test_columns_and_derivations() {
        let rows = vec![row(0, 40.0), row(1, 20.0), row(2, 10.0)];
        let table = MeasurementTable::new(rows, 1);
        assert_eq!(MeasurementTable::header().len(), 25);
        assert_eq!(
            table.column("lumen_normalized_area"),
            Some(vec![1.0, 0.5, 0.25])
        );
        assert_eq!(table.column("lumen_smoothed_area"), Some(vec![40.0, 20.0, 10.0]));
        assert_eq!(table.column("tubule_mean_width_std"), Some(vec![1.0; 3]));
        assert_eq!(table.column("frame"), Some(vec![0.0, 1.0, 2.0]));
        assert_eq!(table.column("nope"), None);
    }

    #[test]
    fn test_nan_rows_are_ignored_by_normalization() {
        let rows = vec![row(0, 40.0), MeasurementRow::nan(1), row(2, 80.0)];
        let table = MeasurementTable::new(rows, 3);
        let norm = table.column("lumen_normalized_area").unwrap();
        assert!(f64_eq(norm[0], 0.5) && norm[1].is_nan() && f64_eq(norm[2], 1.0));

        let smoothed = table.column("lumen_smoothed_area").unwrap();
        assert!(smoothed.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_write_tsv() {
        let table = MeasurementTable::new(vec![row(0, 40.0), MeasurementRow::nan(1)], 1);
        let mut buf = Vec::new();
        table.write_tsv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("frame\twidth_measurements\ttubule_mean_width\t"));
        assert_eq!(lines[1].split('\t').count(), 25);
        assert!(lines[1].starts_with("0\t3\t10\t1\t"));
        assert!(lines[2].starts_with("1\t0\tNaN\t"));
    }
}
