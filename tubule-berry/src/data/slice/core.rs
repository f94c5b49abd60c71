use crate::consts::gray::*;
use crate::{Idx2d, Predicate};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use std::ops::{Index, IndexMut};

/// 不可变、借用的二维标签切片.
#[derive(Clone, Copy)]
pub struct LabelSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LabelMovie`] 或 [`OwnedLabelSlice`].
    ///
    /// 这里有意把代码写死为 `ArrayView` 降低灵活性, 但使结构的意图更加明确.
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for LabelSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维标签切片.
pub struct LabelSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LabelMovie`] 或 [`OwnedLabelSlice`].
    ///
    /// 这里有意把代码写死为 `ArrayViewMut` 降低灵活性, 但使结构的意图更加明确.
    data: ArrayViewMut2<'a, u8>,
}

/// 可变方法集合.
impl<'a> LabelSliceMut<'a> {
    /// 将 `it` 中的每个索引对应的像素改为 `new`.
    pub fn fill_batch<I: IntoIterator<Item = Idx2d>>(&mut self, it: I, new: u8) {
        for pos in it.into_iter() {
            self[pos] = new;
        }
    }

    /// 将 `mask` 为 `true` 的像素改为 `new`. 返回其中原值不为 `new` 的像素个数.
    ///
    /// `mask` 形状必须与切片一致, 否则程序 panic.
    pub fn paint(&mut self, mask: ArrayView2<bool>, new: u8) -> usize {
        assert_eq!(mask.shape(), self.data.shape(), "掩码形状不符");
        let mut cnt = 0usize;
        ndarray::Zip::from(&mut self.data)
            .and(&mask)
            .for_each(|p, &m| {
                if m && *p != new {
                    *p = new;
                    cnt += 1;
                }
            });
        cnt
    }
}

impl Index<Idx2d> for LabelSliceMut<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// label 不可变方法集合.
macro_rules! impl_label_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获得 **底层** 数据的一份不可变 shallow copy.
            #[inline]
            pub fn array_view(&self) -> ArrayView2<u8> {
                self.data.view()
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                let &[h, w] = self.data.shape() else {
                    unreachable!()
                };
                (h, w)
            }

            /// 统计图像中值为 `label` 的像素总个数.
            #[inline]
            pub fn count(&self, label: u8) -> usize {
                self.data.iter().filter(|&p| *p == label).count()
            }

            /// 获取标签的基本统计信息.
            ///
            /// 统计信息格式为: \[细胞, 背景 1, 背景 2, 管腔\] 像素数.
            /// 该操作不会统计任何其他像素信息.
            pub fn numeric_statistics(&self) -> [usize; 4] {
                let mut ans = [0; 4];
                for pixel in self.data.iter().filter(|p| is_valid_label(**p)) {
                    ans[*pixel as usize] += 1;
                }
                ans
            }

            /// 判断一个索引是否位于图像的边缘.
            #[inline]
            pub fn is_at_border(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h == 0 || w == 0 || h.saturating_add(1) == h_len || w.saturating_add(1) == w_len
            }

            /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
                self.data.indexed_iter()
            }

            /// 获得 `label` 的二值掩码.
            pub fn mask_of(&self, label: u8) -> Array2<bool> {
                self.data.map(|&p| p == label)
            }

            /// 获得满足 `pred` 的像素的二值掩码.
            pub fn mask_by(&self, pred: Predicate) -> Array2<bool> {
                self.data.map(|&p| pred(p))
            }
        }
    };
}
impl_label_slice_immut!('a, LabelSlice<'a>, ArrayView2<'a, u8>);
impl_label_slice_immut!('a, LabelSliceMut<'a>, ArrayViewMut2<'a, u8>);

impl IndexMut<Idx2d> for LabelSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的二维标签切片.
///
/// `OwnedLabelSlice` 仅提供到 `LabelSlice` 和 `LabelSliceMut`
/// 的轻量转换和底层数据移动, 不提供任何其它方法.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedLabelSlice {
    data: Array2<u8>,
}

impl OwnedLabelSlice {
    /// 以给定数据初始化.
    #[inline]
    pub fn from_raw(data: Array2<u8>) -> Self {
        Self { data }
    }

    /// 创建形状为 `(h, w)` 的全细胞 (全 0) 切片.
    #[inline]
    pub fn cells((h, w): Idx2d) -> Self {
        Self {
            data: Array2::from_elem((h, w), CELLS),
        }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immut(&self) -> LabelSlice<'_> {
        LabelSlice::new(self.data.view())
    }

    /// 获得可变切片引用.
    #[inline]
    pub fn as_mutable(&mut self) -> LabelSliceMut<'_> {
        LabelSliceMut::new(self.data.view_mut())
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }
}

/// 不可变、借用的二维强度帧.
#[derive(Clone, Copy)]
pub struct FrameSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::Movie`].
    data: ArrayView2<'a, i32>,
}

impl Index<Idx2d> for FrameSlice<'_> {
    type Output = i32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> FrameSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub fn new(data: ArrayView2<'a, i32>) -> Self {
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'a, i32> {
        self.data
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 第 `h` 行的强度剖面.
    pub fn row(&self, h: usize) -> Vec<f64> {
        self.data.row(h).iter().map(|&v| v as f64).collect()
    }

    /// 第 `w` 列的强度剖面.
    pub fn col(&self, w: usize) -> Vec<f64> {
        self.data.column(w).iter().map(|&v| v as f64).collect()
    }

    /// 按 `points` 顺序读取强度. 越界索引会被跳过.
    pub fn sample<'p, I: IntoIterator<Item = &'p Idx2d>>(&self, points: I) -> Vec<f64> {
        points
            .into_iter()
            .filter_map(|p| self.data.get(*p).map(|&v| v as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn test_paint_counts_changes() {
        let mut owned = OwnedLabelSlice::cells((4, 6));
        let mut mask = Array2::from_elem((4, 6), false);
        mask.slice_mut(s![1..3, ..]).fill(true);

        let mut slice = owned.as_mutable();
        slice.fill_batch([(1, 0), (1, 1)], LUMEN);
        assert_eq!(slice.paint(mask.view(), LUMEN), 10);
        assert_eq!(slice.paint(mask.view(), LUMEN), 0);
        assert_eq!(owned.as_immut().numeric_statistics(), [12, 0, 0, 12]);
    }

    #[test]
    fn test_border_and_masks() {
        let mut data = Array2::from_elem((3, 4), BACKGROUND_1);
        data[(1, 1)] = LUMEN;
        data[(1, 2)] = CELLS;
        let owned = OwnedLabelSlice::from_raw(data);
        let slice = owned.as_immut();

        assert!(slice.is_at_border((0, 1)));
        assert!(slice.is_at_border((1, 3)));
        assert!(!slice.is_at_border((1, 1)));
        assert_eq!(slice.mask_of(LUMEN).iter().filter(|&&v| v).count(), 1);
        assert_eq!(slice.mask_by(is_labeled).iter().filter(|&&v| v).count(), 11);
        assert_eq!(slice.count(BACKGROUND_1), 10);
    }
}
