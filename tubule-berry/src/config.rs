//! 运行配置. 所有组件都从构造参数中读取配置, 不存在全局可变状态.

use crate::consts::*;
use crate::error::{ConfigError, ConfigResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 横截面采样时, 轮廓点累积弧长的计算方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArcLength {
    /// 第 `i` 个点的位置为 `i * scale`. 在弯曲的管道上会低估实际间距.
    #[default]
    PointIndex,

    /// 相邻点欧氏距离的累积和乘以 `scale`.
    Euclidean,
}

/// 帧阈值参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdParams {
    /// 轴线剖面的平滑窗口.
    pub profile_window: usize,

    /// 阈值序列平滑窗口占总帧数的比例.
    pub series_fraction: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            profile_window: PROFILE_SMOOTHING_WINDOW,
            series_fraction: THRESHOLD_SMOOTHING_FRACTION,
        }
    }
}

/// 掩码构建参数.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaskParams {
    /// 二值化后去噪的开运算窗口.
    pub clean_window: usize,

    /// 不经拐点检测而全部保留的最大组件数.
    pub knee_bypass_len: usize,

    /// 组件最小面积 (不含).
    pub min_object_area: usize,

    /// 空洞填充的闭运算窗口.
    pub hole_fill_window: usize,

    /// 空洞填充轮数.
    pub hole_fill_rounds: usize,

    /// 管腔闭运算窗口.
    pub lumen_closing_window: usize,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            clean_window: CLEAN_WINDOW,
            knee_bypass_len: KNEE_BYPASS_LEN,
            min_object_area: MIN_OBJECT_AREA,
            hole_fill_window: HOLE_FILL_WINDOW,
            hole_fill_rounds: HOLE_FILL_ROUNDS,
            lumen_closing_window: LUMEN_CLOSING_WINDOW,
        }
    }
}

/// 囊泡抑制参数.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VesicleParams {
    /// 参考的相邻帧偏移.
    pub offsets: Vec<isize>,

    /// 候选区域腐蚀窗口.
    pub erosion_window: usize,

    /// 不经拐点检测而全部保留的最大候选数.
    pub knee_bypass_len: usize,

    /// 候选区域最小面积 (含).
    pub min_area: usize,

    /// 修正后管腔闭运算窗口.
    pub closing_window: usize,
}

impl Default for VesicleParams {
    fn default() -> Self {
        Self {
            offsets: VESICLE_OFFSETS.to_vec(),
            erosion_window: VESICLE_EROSION_WINDOW,
            knee_bypass_len: KNEE_BYPASS_LEN,
            min_area: MIN_VESICLE_AREA,
            closing_window: VESICLE_CLOSING_WINDOW,
        }
    }
}

/// 横截面测量参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasureParams {
    /// 每像素对应的物理长度.
    pub scale: f64,

    /// 采样间隔, 与 `scale` 同单位.
    pub spacing: f64,

    /// 弧长计算方式.
    pub arc_length: ArcLength,

    /// 提取轮廓的腐蚀窗口.
    pub outline_window: usize,
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            spacing: DEFAULT_SPACING,
            arc_length: ArcLength::default(),
            outline_window: OUTLINE_EROSION_WINDOW,
        }
    }
}

/// 一次完整运行的配置.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// 每像素对应的物理长度, 必须为正.
    pub scale: f64,

    /// 采样间隔, 必须为正.
    pub spacing: f64,

    /// 是否执行囊泡抑制.
    pub remove_vesicles: bool,

    /// 是否从强度影像构建掩码. 为 `false` 时输入本身即为标签.
    pub apply_masking: bool,

    /// 构建掩码前是否去除背景.
    pub remove_background: bool,

    /// 背景去除时的背景减除系数.
    pub background_multiplier: f64,

    /// 弧长计算方式.
    pub arc_length: ArcLength,

    /// 测量表派生列的平滑窗口.
    pub series_window: usize,

    /// 帧阈值参数.
    pub threshold: ThresholdParams,

    /// 掩码构建参数.
    pub mask: MaskParams,

    /// 囊泡抑制参数.
    pub vesicle: VesicleParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            spacing: DEFAULT_SPACING,
            remove_vesicles: false,
            apply_masking: true,
            remove_background: false,
            background_multiplier: BACKGROUND_MULTIPLIER,
            arc_length: ArcLength::default(),
            series_window: SERIES_SMOOTHING_WINDOW,
            threshold: ThresholdParams::default(),
            mask: MaskParams::default(),
            vesicle: VesicleParams::default(),
        }
    }
}

/// 正的有限数?
#[inline]
fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

impl PipelineConfig {
    /// 以给定尺度与采样间隔创建, 其余取默认值.
    pub fn new(scale: f64, spacing: f64) -> Self {
        Self {
            scale,
            spacing,
            ..Self::default()
        }
    }

    /// 检查配置是否合法.
    pub fn validate(&self) -> ConfigResult<()> {
        if !is_positive(self.scale) {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        if !is_positive(self.spacing) {
            return Err(ConfigError::InvalidSpacing(self.spacing));
        }
        if !self.background_multiplier.is_finite() || self.background_multiplier < 0.0 {
            return Err(ConfigError::InvalidParameter("background_multiplier"));
        }
        if self.series_window == 0 {
            return Err(ConfigError::InvalidParameter("series_window"));
        }

        let t = &self.threshold;
        if t.profile_window == 0 {
            return Err(ConfigError::InvalidParameter("threshold.profile_window"));
        }
        if !(t.series_fraction.is_finite() && (0.0..=1.0).contains(&t.series_fraction)) {
            return Err(ConfigError::InvalidParameter("threshold.series_fraction"));
        }

        let m = &self.mask;
        for (v, name) in [
            (m.clean_window, "mask.clean_window"),
            (m.hole_fill_window, "mask.hole_fill_window"),
            (m.lumen_closing_window, "mask.lumen_closing_window"),
        ] {
            if v == 0 {
                return Err(ConfigError::InvalidParameter(name));
            }
        }

        let v = &self.vesicle;
        if v.erosion_window == 0 {
            return Err(ConfigError::InvalidParameter("vesicle.erosion_window"));
        }
        if v.closing_window == 0 {
            return Err(ConfigError::InvalidParameter("vesicle.closing_window"));
        }
        if v.offsets.contains(&0) {
            return Err(ConfigError::InvalidParameter("vesicle.offsets"));
        }
        Ok(())
    }

    /// 测量器使用的参数.
    #[inline]
    pub fn measure_params(&self) -> MeasureParams {
        MeasureParams {
            scale: self.scale,
            spacing: self.spacing,
            arc_length: self.arc_length,
            ..MeasureParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_invalid_scale_and_spacing() {
        assert_eq!(
            PipelineConfig::new(0.0, 10.0).validate(),
            Err(ConfigError::InvalidScale(0.0))
        );
        assert_eq!(
            PipelineConfig::new(1.0, -2.0).validate(),
            Err(ConfigError::InvalidSpacing(-2.0))
        );
        assert!(matches!(
            PipelineConfig::new(f64::NAN, 1.0).validate(),
            Err(ConfigError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_invalid_tunables() {
        let mut c = PipelineConfig::default();
        c.mask.hole_fill_window = 0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidParameter("mask.hole_fill_window"))
        );

        let mut c = PipelineConfig::default();
        c.vesicle.offsets.push(0);
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidParameter("vesicle.offsets"))
        );

        let mut c = PipelineConfig::default();
        c.vesicle.closing_window = 0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidParameter("vesicle.closing_window"))
        );
    }

    #[test]
    fn test_measure_params_follow_config() {
        let mut c = PipelineConfig::new(0.5, 4.0);
        c.arc_length = ArcLength::Euclidean;
        let p = c.measure_params();
        assert_eq!(p.scale, 0.5);
        assert_eq!(p.spacing, 4.0);
        assert_eq!(p.arc_length, ArcLength::Euclidean);
        assert_eq!(p.outline_window, OUTLINE_EROSION_WINDOW);
    }
}
