//! 合成管道影像, 用于测试与消融实验.
//!
//! 管道沿宽度方向延伸, 背景 1 在上、背景 2 在下. 管腔两端留出一段细胞组织,
//! 使管腔被细胞完全包围. 可选的正弦弯曲让轮廓不再是直线.

use crate::consts::gray::*;
use crate::error::ConfigResult;
use crate::{Idx2d, Movie};
use ndarray::Array2;
use std::f64::consts::TAU;

/// 合成管道参数.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TubulePhantom {
    /// 图像形状.
    pub shape: Idx2d,

    /// 管道宽度 (像素).
    pub tubule_width: usize,

    /// 管腔宽度 (像素).
    pub lumen_width: usize,

    /// 管腔两端到图像左右边缘的距离.
    pub lumen_margin: usize,

    /// 中线弯曲振幅 (像素).
    pub amplitude: f64,

    /// 图像宽度内的弯曲周期数.
    pub periods: f64,

    /// 背景、细胞、管腔的强度.
    pub intensities: [i32; 3],
}

impl TubulePhantom {
    /// 水平直管.
    pub fn new(shape: Idx2d, tubule_width: usize, lumen_width: usize) -> Self {
        Self {
            shape,
            tubule_width,
            lumen_width,
            lumen_margin: 10,
            amplitude: 0.0,
            periods: 1.0,
            intensities: [20, 180, 20],
        }
    }

    /// 以正弦曲线弯曲中线.
    pub fn with_bend(self, amplitude: f64, periods: f64) -> Self {
        Self {
            amplitude,
            periods,
            ..self
        }
    }

    /// 更换管腔宽度.
    pub fn with_lumen_width(self, lumen_width: usize) -> Self {
        Self {
            lumen_width,
            ..self
        }
    }

    /// 第 `col` 列的中线行坐标.
    #[inline]
    fn center(&self, col: usize) -> f64 {
        let (h, w) = self.shape;
        h as f64 / 2.0 + self.amplitude * (TAU * self.periods * col as f64 / w as f64).sin()
    }

    /// 以 `center` 为中心、宽 `width` 的行区间起点.
    #[inline]
    fn band_start(center: f64, width: usize) -> usize {
        (center - width as f64 / 2.0).round().max(0.0) as usize
    }

    /// 真值标签.
    pub fn labels(&self) -> Array2<u8> {
        let (_, w) = self.shape;
        let lumen_cols = self.lumen_margin..w.saturating_sub(self.lumen_margin);
        Array2::from_shape_fn(self.shape, |(i, j)| {
            let c = self.center(j);
            let t0 = Self::band_start(c, self.tubule_width);
            let l0 = Self::band_start(c, self.lumen_width);
            if i < t0 {
                BACKGROUND_1
            } else if i >= t0 + self.tubule_width {
                BACKGROUND_2
            } else if lumen_cols.contains(&j) && (l0..l0 + self.lumen_width).contains(&i) {
                LUMEN
            } else {
                CELLS
            }
        })
    }

    /// 强度帧.
    pub fn frame(&self) -> Array2<i32> {
        let [bg, cells, lumen] = self.intensities;
        self.labels().map(|&p| match p {
            CELLS => cells,
            LUMEN => lumen,
            _ => bg,
        })
    }

    /// 管腔宽度逐帧为 `lumen_widths` 的强度影像.
    pub fn movie(&self, lumen_widths: &[usize]) -> ConfigResult<Movie> {
        Movie::from_frames(lumen_widths.iter().map(|&lw| self.with_lumen_width(lw).frame()))
    }
}
