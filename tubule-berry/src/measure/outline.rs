//! 管道两侧轮廓的提取与对齐.

use crate::algo::sort_curve;
use crate::consts::gray::{BACKGROUND_1, BACKGROUND_2};
use crate::error::{FrameError, FrameResult};
use crate::morph;
use crate::{Idx2d, LabelSlice};
use ndarray::Axis;

/// 轮廓至少应有的点数.
const MIN_OUTLINE_POINTS: usize = 3;

/// 背景 `label` 的内边缘像素, 按行优先顺序排列.
pub fn outline_of(slice: LabelSlice, label: u8, window: usize) -> Vec<Idx2d> {
    let mask = slice.mask_of(label);
    morph::inner_edge(mask.view(), window)
        .indexed_iter()
        .filter_map(|(pos, &e)| e.then_some(pos))
        .collect()
}

/// 曲线的主方向: 首尾两点在各轴上的跨度按图像尺寸归一化后, 取较大者.
/// 跨度相同时取列方向.
pub fn principal_axis(curve: &[Idx2d], (h, w): Idx2d) -> Axis {
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return Axis(1);
    };
    let dy = first.0.abs_diff(last.0) as f64 / h as f64;
    let dx = first.1.abs_diff(last.1) as f64 / w as f64;
    if dy > dx {
        Axis(0)
    } else {
        Axis(1)
    }
}

/// 保留 `curve` 中间长度为 `len` 的部分.
#[inline]
fn center_crop(curve: &mut Vec<Idx2d>, len: usize) {
    if curve.len() > len {
        let offset = (curve.len() - len) / 2;
        curve.drain(..offset);
        curve.truncate(len);
    }
}

/// 已排序、对齐的两条轮廓, 长度相同.
#[derive(Clone, Debug, PartialEq)]
pub struct OutlinePair {
    /// 背景 1 一侧.
    pub first: Vec<Idx2d>,

    /// 背景 2 一侧.
    pub second: Vec<Idx2d>,
}

impl OutlinePair {
    /// 提取、排序并对齐两侧轮廓.
    ///
    /// 任一轮廓少于三个点时返回 [`FrameError::DegenerateOutline`].
    pub fn trace(slice: LabelSlice, window: usize) -> FrameResult<Self> {
        let mut curves = [BACKGROUND_1, BACKGROUND_2].map(|label| outline_of(slice, label, window));
        for (label, c) in [BACKGROUND_1, BACKGROUND_2].into_iter().zip(curves.iter()) {
            if c.len() < MIN_OUTLINE_POINTS {
                return Err(FrameError::DegenerateOutline(label, c.len()));
            }
        }
        let [first, second] = curves.each_mut();
        *first = sort_curve(first);
        *second = sort_curve(second);

        let axis = principal_axis(first, slice.shape());
        for c in [&mut *first, &mut *second] {
            c.sort_by_key(|p| if axis == Axis(0) { p.0 } else { p.1 });
        }

        let len = first.len().min(second.len());
        center_crop(first, len);
        center_crop(second, len);

        let [first, second] = curves;
        Ok(Self { first, second })
    }

    /// 轮廓长度.
    #[inline]
    pub fn len(&self) -> usize {
        self.first.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// 依次迭代两条轮廓上的所有点.
    pub fn points(&self) -> impl Iterator<Item = &Idx2d> {
        self.first.iter().chain(self.second.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::gray::*;
    use ndarray::{s, Array2};

    /// 横向管道: 上方为背景 1, 下方为背景 2.
    fn horizontal(h: usize, w: usize, tubule: (usize, usize)) -> Array2<u8> {
        let mut m = Array2::from_elem((h, w), CELLS);
        m.slice_mut(s![..tubule.0, ..]).fill(BACKGROUND_1);
        m.slice_mut(s![tubule.1.., ..]).fill(BACKGROUND_2);
        m
    }

    #[test]
    fn test_outline_of_band() {
        let m = horizontal(30, 40, (10, 20));
        let o = outline_of(LabelSlice::new(m.view()), BACKGROUND_1, 3);
        assert_eq!(o.len(), 40);
        assert!(o.iter().all(|p| p.0 == 9));
    }

    #[test]
    fn test_principal_axis() {
        assert_eq!(principal_axis(&[(0, 0), (1, 30)], (50, 50)), Axis(1));
        assert_eq!(principal_axis(&[(0, 0), (30, 1)], (50, 50)), Axis(0));
        // 跨度按图像尺寸归一化.
        assert_eq!(principal_axis(&[(0, 0), (20, 30)], (25, 100)), Axis(0));
    }

    #[test]
    fn test_trace_aligns_lengths() {
        // 背景 2 只占一部分宽度, 其轮廓更短.
        let mut m = horizontal(40, 60, (10, 30));
        m.slice_mut(s![30.., ..10]).fill(CELLS);
        let pair = OutlinePair::trace(LabelSlice::new(m.view()), 3).unwrap();
        assert_eq!(pair.first.len(), pair.second.len());
        assert!(pair.first.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(pair.second.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(pair.first.iter().all(|p| p.0 == 9));
    }

    #[test]
    fn test_degenerate_outline() {
        let mut m = Array2::from_elem((20, 20), CELLS);
        m.slice_mut(s![..5, ..]).fill(BACKGROUND_1);
        m[(19, 19)] = BACKGROUND_2;
        assert_eq!(
            OutlinePair::trace(LabelSlice::new(m.view()), 3),
            Err(FrameError::DegenerateOutline(BACKGROUND_2, 1))
        );
    }
}
