//! 邻域与连通区域相关的二值图像操作.

mod core;

pub use self::core::{components8, fill_holes, regions, sort_by_area_desc, Component};

use crate::Idx2d;
use either::Either;

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

/// 像素连通规则.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Connectivity {
    /// 上下左右.
    Four,

    /// 上下左右及四个对角.
    Eight,
}

impl Connectivity {
    /// 获得 `pos` 在该规则下的邻居索引. 不检查越界.
    #[inline]
    pub(crate) fn neighbours(self, pos: Idx2d) -> impl Iterator<Item = Idx2d> {
        match self {
            Self::Four => Either::Left(neighbour4(pos).into_iter()),
            Self::Eight => Either::Right(neighbour8(pos).into_iter()),
        }
    }
}
