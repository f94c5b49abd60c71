//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 标签切片中, 细胞组织 (及其余未分类区域) 的像素值.
    pub const CELLS: u8 = 0;

    /// 标签切片中, 第一背景区的像素值.
    pub const BACKGROUND_1: u8 = 1;

    /// 标签切片中, 第二背景区的像素值.
    pub const BACKGROUND_2: u8 = 2;

    /// 标签切片中, 管腔的像素值.
    pub const LUMEN: u8 = 3;

    /// 测量诊断图中, 已标注区域 (非细胞) 的像素值.
    pub const DIAG_LABELED: u8 = 1;

    /// 测量诊断图中, 轮廓曲线的像素值.
    pub const DIAG_OUTLINE: u8 = 3;

    /// 测量诊断图中, 横截面采样线的像素值.
    pub const DIAG_PROFILE: u8 = 5;

    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道暗灰色.
    pub const DARK_GRAY: u8 = 0b_0100_0000;

    /// 单通道灰色.
    pub const GRAY: u8 = 0b_1000_0000;

    /// 单通道亮灰色.
    pub const LIGHT_GRAY: u8 = 0b_1100_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 像素是否是管腔?
    #[inline]
    pub const fn is_lumen(p: u8) -> bool {
        matches!(p, LUMEN)
    }

    /// 像素是否是细胞组织?
    #[inline]
    pub const fn is_cells(p: u8) -> bool {
        matches!(p, CELLS)
    }

    /// 像素是否是 (任一) 背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND_1 | BACKGROUND_2)
    }

    /// 像素是否已被标注 (背景或管腔)?
    #[inline]
    pub const fn is_labeled(p: u8) -> bool {
        !is_cells(p)
    }

    /// 像素是否是合法标签值?
    #[inline]
    pub const fn is_valid_label(p: u8) -> bool {
        matches!(p, CELLS | BACKGROUND_1 | BACKGROUND_2 | LUMEN)
    }
}

/// 组件过滤时, 不经过拐点检测而全部保留的最大组件个数.
pub const KNEE_BYPASS_LEN: usize = 5;

/// 细胞组织组件的最小面积 (不含). 面积不大于该值的组件会被丢弃.
pub const MIN_OBJECT_AREA: usize = 2500;

/// 囊泡候选区域的最小面积 (含).
pub const MIN_VESICLE_AREA: usize = 500;

/// 囊泡抑制时参考的相邻帧偏移量.
pub const VESICLE_OFFSETS: [isize; 4] = [-10, -5, 5, 10];

/// 阈值轴线剖面的平滑窗口.
pub const PROFILE_SMOOTHING_WINDOW: usize = 10;

/// 阈值序列平滑窗口占总帧数的比例.
pub const THRESHOLD_SMOOTHING_FRACTION: f64 = 0.2;

/// 测量表派生列的平滑窗口.
pub const SERIES_SMOOTHING_WINDOW: usize = 20;

/// 二值化后去噪用的开运算窗口.
pub const CLEAN_WINDOW: usize = 3;

/// 空洞填充用的闭运算窗口.
pub const HOLE_FILL_WINDOW: usize = 5;

/// 空洞填充的轮数.
pub const HOLE_FILL_ROUNDS: usize = 3;

/// 管腔闭运算窗口.
pub const LUMEN_CLOSING_WINDOW: usize = 10;

/// 囊泡候选区域的腐蚀窗口.
pub const VESICLE_EROSION_WINDOW: usize = 5;

/// 囊泡修正后管腔闭运算窗口.
pub const VESICLE_CLOSING_WINDOW: usize = 3;

/// 提取轮廓时的腐蚀窗口.
pub const OUTLINE_EROSION_WINDOW: usize = 3;

/// 默认采样间隔 (物理单位).
pub const DEFAULT_SPACING: f64 = 10.0;

/// 背景去除时的默认背景减除系数.
pub const BACKGROUND_MULTIPLIER: f64 = 0.5;
