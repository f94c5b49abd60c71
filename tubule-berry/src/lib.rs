#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对马氏管 (Malpighian tubule) 延时显微影像逐帧分割, 并沿管道测量管径.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 输入为 `(t, h, w)` 的单通道强度影像, 或已标注的 `0..=3` 标签影像.
//! 2. 单帧失败 (区域不足, 轮廓退化等) 不会中断整片处理, 失败帧在结果表中以 `NaN` 占位.
//! 3. 配置错误或标签非法会在处理开始前报错.
//!
//! # 标签约定
//!
//! | 值 | 含义 |
//! | --- | --- |
//! | 0 | 细胞组织 |
//! | 1 | 背景 1 |
//! | 2 | 背景 2 |
//! | 3 | 管腔 |
//!
//! # 开发计划
//!
//! ### 拐点检测与序列平滑 ✅
//!
//! Kneedle 拐点, 滑动平均, 按最大值归一化.
//!
//! 实现位于 `tubule-berry/src/algo`.
//!
//! ### 8-邻域连通组件与二值形态学 ✅
//!
//! 实现位于 `tubule-berry/src/eight` 与 `tubule-berry/src/morph.rs`.
//!
//! ### 逐帧阈值 ✅
//!
//! 沿主轴取强度剖面, 在平滑剖面上寻找拐点, 再对阈值序列做时间平滑.
//!
//! 实现位于 `tubule-berry/src/threshold.rs`.
//!
//! ### 四标签掩码 ✅
//!
//! 阈值化, 组件过滤, 空洞填充, 按质心几何关系分配背景 1、背景 2 与管腔.
//!
//! 实现位于 `tubule-berry/src/mask.rs`.
//!
//! ### 囊泡抑制 ✅
//!
//! 与相邻帧比较, 把短暂侵入管腔的细胞区域改回管腔.
//!
//! 实现位于 `tubule-berry/src/vesicle.rs`.
//!
//! ### 横截面测量 ✅
//!
//! 1. 如何得到两条管壁轮廓? ✅
//! 2. 如何沿轮廓按固定物理距离采样? ✅
//! 3. 如何排除触及图像边缘或不含管腔的截面? ✅
//!
//! 上述问题的答案:
//!
//! 1. 对背景 1 与背景 2 各自做内边缘提取, 以最近邻排序成曲线,
//!   再沿主轴排序并裁剪到相同长度.
//! 2. 累积弧长可按点数或欧氏距离计算, 二者都提供以便对比.
//! 3. 截面端点取自轮廓, 截面中第一个与最后一个管腔像素决定管腔宽度.
//!
//! 实现位于 `tubule-berry/src/measure/*`.
//!
//! ### 小功能 ✅
//!
//! 1. 背景去除 (可选). ✅
//! 2. 测量表的派生列与导出. ✅
//! 3. 合成管道影像, 用于测试与消融实验. ✅

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 高精度通用索引 / 向量.
pub type Idx2dF = (f64, f64);

type Predicate = fn(u8) -> bool;

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 影像与标签影像的基础数据结构.
mod data;

pub use data::{
    FrameSlice, ImgWriteRaw, ImgWriteVis, LabelMovie, LabelSlice, LabelSliceMut, Movie,
    OwnedLabelSlice,
};

pub mod algo;
pub mod background;
pub mod config;
pub mod consts;
pub mod eight;
pub mod error;
pub mod export;
pub mod mask;
pub mod measure;
pub mod morph;
pub mod phantom;
pub mod pipeline;
pub mod prelude;
pub mod table;
pub mod threshold;
pub mod vesicle;
