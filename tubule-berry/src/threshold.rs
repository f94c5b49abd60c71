//! 逐帧自适应强度阈值.
//!
//! 沿水平中线、垂直中线、主对角线与反对角线四条轴采样强度, 拼接后平滑、降序排列,
//! 以拐点处的强度作为该帧阈值. 全片阈值序列再整体平滑一次以抑制帧间抖动.

use crate::algo::{kneedle, points_between, running_average};
use crate::config::ThresholdParams;
use crate::{FrameSlice, Movie};
use log::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 全片阈值序列.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdSeries {
    /// 逐帧原始阈值.
    pub raw: Vec<f64>,

    /// 整体平滑后的阈值, 供掩码构建使用.
    pub smoothed: Vec<f64>,
}

impl ThresholdSeries {
    /// 帧数.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// 帧阈值计算器.
#[derive(Copy, Clone, Debug, Default)]
pub struct FrameThresholder {
    params: ThresholdParams,
}

impl FrameThresholder {
    /// 初始化.
    #[inline]
    pub fn new(params: ThresholdParams) -> Self {
        Self { params }
    }

    /// 四条轴线上的强度剖面, 按水平中线、垂直中线、主对角线、反对角线顺序拼接.
    pub fn axis_profile(frame: FrameSlice) -> Vec<f64> {
        let (h, w) = frame.shape();
        let main = points_between((0, 0), (h - 1, w - 1));
        let anti = points_between((h - 1, 0), (0, w - 1));

        let mut profile = Vec::with_capacity(h + w + main.len() + anti.len());
        profile.extend(frame.row(h / 2));
        profile.extend(frame.col(w / 2));
        profile.extend(frame.sample(main.iter()));
        profile.extend(frame.sample(anti.iter()));
        profile
    }

    /// 单帧原始阈值.
    pub fn frame_threshold(&self, frame: FrameSlice) -> f64 {
        let mut profile = running_average(&Self::axis_profile(frame), self.params.profile_window);
        profile.sort_unstable_by(|a, b| b.total_cmp(a));
        kneedle(&profile).map_or(f64::NAN, |k| k.value)
    }

    /// 阈值序列的平滑窗口, 至少为 1.
    #[inline]
    pub fn series_window(&self, frames: usize) -> usize {
        ((frames as f64 * self.params.series_fraction).floor() as usize).max(1)
    }

    /// 计算全片阈值, 并整体平滑.
    pub fn threshold_movie(&self, movie: &Movie) -> ThresholdSeries {
        info!("Thresholding {} frames", movie.len());
        let raw = movie.map_frames(|t, frame| {
            let thr = self.frame_threshold(frame);
            debug!("frame {t}: raw threshold {thr:.3}");
            thr
        });
        let window = self.series_window(raw.len());
        let smoothed = running_average(&raw, window);
        ThresholdSeries { raw, smoothed }
    }
}
