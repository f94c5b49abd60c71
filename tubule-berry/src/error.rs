//! 运行时错误.

use crate::Idx2d;
use thiserror::Error;

/// 配置或输入错误. 出现该错误时不会处理任何帧.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 像素尺度必须为正的有限数.
    #[error("像素尺度必须为正的有限数, 但得到了 `{0}`")]
    InvalidScale(f64),

    /// 采样间隔必须为正的有限数.
    #[error("采样间隔必须为正的有限数, 但得到了 `{0}`")]
    InvalidSpacing(f64),

    /// 影像不含任何帧, 或帧为空图像.
    #[error("影像为空")]
    EmptyMovie,

    /// 第 `index` 帧形状与第一帧不一致.
    #[error("第 {index} 帧形状为 {found:?}, 与第一帧形状 {expected:?} 不一致")]
    ShapeMismatch {
        /// 帧序号.
        index: usize,
        /// 第一帧的形状.
        expected: Idx2d,
        /// 该帧的形状.
        found: Idx2d,
    },

    /// 已有标签中出现了非法像素值.
    #[error("第 {index} 帧存在非法标签值 `{value}`")]
    InvalidLabel {
        /// 帧序号.
        index: usize,
        /// 非法值.
        value: i32,
    },

    /// 其它非法参数, 携带参数名.
    #[error("非法参数 `{0}`")]
    InvalidParameter(&'static str),
}

/// 单帧处理错误. 该错误只会被记录, 不会中止整个运行.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// 空白掩码中连通区域不足三个.
    #[error("空白区域只有 {0} 个, 至少需要 3 个")]
    InsufficientRegions(usize),

    /// 最大两两质心距离不唯一, 无法区分背景和管腔.
    #[error("最大质心距离不唯一, 无法确定区域角色")]
    AmbiguousRoles,

    /// 某个背景区域的轮廓点过少.
    ///
    /// 第一个参数代表背景标签, 第二个参数代表实际轮廓点数.
    #[error("背景 {0} 的轮廓只有 {1} 个点")]
    DegenerateOutline(u8, usize),
}

/// 读写文件时的错误.
#[derive(Error, Debug)]
pub enum ExportError {
    /// 底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// 图像编码错误.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// 写 `.npy` 错误.
    #[error(transparent)]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    /// 读 `.npy` 错误.
    #[error(transparent)]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    /// 读入的数据不是合法影像.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 配置层面的结果.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 单帧层面的结果.
pub type FrameResult<T> = Result<T, FrameError>;

/// 读写文件的结果.
pub type ExportResult<T> = Result<T, ExportError>;
