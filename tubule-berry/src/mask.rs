//! 单帧四标签掩码构建.
//!
//! 流程: 二值化 → 开运算去噪 → 组件过滤 → 空洞填充 → 区域角色分配.
//! 任一帧失败只产生 [`FrameError`], 不影响其它帧.

use crate::algo::knee_cutoff;
use crate::config::MaskParams;
use crate::consts::gray::*;
use crate::eight::{components8, fill_holes, sort_by_area_desc, Component};
use crate::error::{FrameError, FrameResult};
use crate::morph;
use crate::{FrameSlice, Idx2dF, LabelSlice, OwnedLabelSlice};
use itertools::Itertools;
use ndarray::{Array2, Array3, Zip};
use ordered_float::OrderedFloat;

/// 三个最大空白区域的角色, 值为区域在面积降序中的位置 (0, 1, 2).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Roles {
    /// 第一背景区.
    pub background_1: usize,

    /// 第二背景区.
    pub background_2: usize,

    /// 管腔.
    pub lumen: usize,
}

#[inline]
fn distance((a0, a1): Idx2dF, (b0, b1): Idx2dF) -> f64 {
    (a0 - b0).hypot(a1 - b1)
}

/// 根据三个区域的质心分配角色.
///
/// 两两距离严格最大的一对为两个背景区 (面积序在前者为第一背景区), 剩下的为管腔.
/// 最大距离不唯一时返回 [`FrameError::AmbiguousRoles`].
pub fn assign_roles(centroids: [Idx2dF; 3]) -> FrameResult<Roles> {
    let pairs: Vec<((usize, usize), f64)> = (0..3)
        .tuple_combinations()
        .map(|(i, j)| ((i, j), distance(centroids[i], centroids[j])))
        .collect();
    let max = pairs
        .iter()
        .map(|p| OrderedFloat(p.1))
        .max()
        .ok_or(FrameError::AmbiguousRoles)?;
    let mut best = pairs.iter().filter(|p| OrderedFloat(p.1) == max);
    match (best.next(), best.next()) {
        (Some(&((i, j), _)), None) => Ok(Roles {
            background_1: i,
            background_2: j,
            lumen: 3 - i - j,
        }),
        _ => Err(FrameError::AmbiguousRoles),
    }
}

/// 单帧掩码构建器.
#[derive(Copy, Clone, Debug, Default)]
pub struct MaskBuilder {
    params: MaskParams,
}

impl MaskBuilder {
    /// 初始化.
    #[inline]
    pub fn new(params: MaskParams) -> Self {
        Self { params }
    }

    /// 二值化: 强度严格大于 `threshold` 的像素为前景.
    pub fn binarize(frame: FrameSlice, threshold: f64) -> Array2<bool> {
        frame.data().map(|&v| v as f64 > threshold)
    }

    /// 细胞组织掩码: 去噪后按面积过滤前景组件, 只保留拐点以内且面积足够大的组件.
    pub fn object_mask(&self, frame: FrameSlice, threshold: f64) -> Array2<bool> {
        let p = &self.params;
        let fg = morph::open(Self::binarize(frame, threshold).view(), p.clean_window);

        let mut comps = components8(fg.view());
        sort_by_area_desc(&mut comps);
        let areas: Vec<usize> = comps.iter().map(Component::area).collect();
        let keep = knee_cutoff(&areas, p.knee_bypass_len);

        let mut object = Array2::from_elem(fg.dim(), false);
        comps
            .iter()
            .take(keep)
            .filter(|c| c.area() > p.min_object_area)
            .flat_map(|c| c.pixels.iter())
            .for_each(|&pos| object[pos] = true);
        object
    }

    /// 空白掩码: 细胞组织的补集, 经若干轮开运算消除细小空白.
    pub fn empty_mask(&self, object: &Array2<bool>) -> Array2<bool> {
        let p = &self.params;
        let mut empty = object.map(|v| !v);
        for _ in 0..p.hole_fill_rounds {
            empty = morph::open(empty.view(), p.hole_fill_window);
        }
        empty
    }

    /// 在空白掩码上分配背景 1、背景 2 与管腔.
    ///
    /// 空白区域不足三个时返回 [`FrameError::InsufficientRegions`].
    pub fn structure(&self, empty: &Array2<bool>) -> FrameResult<OwnedLabelSlice> {
        let mut comps = components8(empty.view());
        if comps.len() < 3 {
            return Err(FrameError::InsufficientRegions(comps.len()));
        }
        sort_by_area_desc(&mut comps);
        let top = [&comps[0], &comps[1], &comps[2]];
        let roles = assign_roles(top.map(Component::centroid))?;

        let lumen = top[roles.lumen].to_mask(empty.dim());
        let lumen = fill_holes(morph::close(lumen.view(), self.params.lumen_closing_window).view());

        let mut out = OwnedLabelSlice::cells(empty.dim());
        let mut s = out.as_mutable();
        s.fill_batch(top[roles.background_1].pixels.iter().copied(), BACKGROUND_1);
        s.fill_batch(top[roles.background_2].pixels.iter().copied(), BACKGROUND_2);
        s.paint(lumen.view(), LUMEN);
        Ok(out)
    }

    /// 构建单帧四标签掩码.
    pub fn build(&self, frame: FrameSlice, threshold: f64) -> FrameResult<OwnedLabelSlice> {
        let object = self.object_mask(frame, threshold);
        let empty = self.empty_mask(&object);
        self.structure(&empty)
    }
}

/// 掩码诊断图: 红色通道为已标注区域的内边缘, 绿色通道为原强度 (截断到 0..=255).
///
/// 返回 `(h, w, 3)` 数组.
pub fn mask_diagnostic(frame: FrameSlice, mask: LabelSlice) -> Array3<u8> {
    let labeled = mask.mask_by(is_labeled);
    let edge = morph::inner_edge(labeled.view(), crate::consts::OUTLINE_EROSION_WINDOW);
    let (h, w) = frame.shape();
    let mut rgb = Array3::<u8>::zeros((h, w, 3));
    Zip::indexed(&edge)
        .and(&frame.data())
        .for_each(|(i, j), &e, &v| {
            rgb[(i, j, 0)] = if e { WHITE } else { BLACK };
            rgb[(i, j, 1)] = v.clamp(0, 255) as u8;
        });
    rgb
}
