use std::ops::Index;

use ndarray::{Array2, Array3, ArrayView, ArrayView3, Axis, Ix3};
use num::ToPrimitive;

use crate::consts::gray::is_valid_label;
use crate::error::{ConfigError, ConfigResult};
use crate::{Idx2d, Idx3d};

pub mod slice;

pub use slice::{
    FrameSlice, ImgWriteRaw, ImgWriteVis, LabelSlice, LabelSliceMut, OwnedLabelSlice,
};

/// 取 `Array3` 的 `(t, h, w)` 形状.
#[inline]
fn shape3<T>(data: &Array3<T>) -> Idx3d {
    let &[t, h, w] = data.shape() else {
        unreachable!()
    };
    (t, h, w)
}

/// 延时显微影像. 强度以 `i32` 保存, 按 `(t, h, w)` 组织.
///
/// 构造时保证非空且每帧形状一致, 之后只读.
#[derive(Debug, Clone)]
pub struct Movie {
    data: Array3<i32>,
}

impl Index<Idx3d> for Movie {
    type Output = i32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl Movie {
    /// 直接以 `(t, h, w)` 数组创建. 帧数或帧面积为 0 时返回 `EmptyMovie`.
    pub fn new(data: Array3<i32>) -> ConfigResult<Self> {
        if data.is_empty() {
            return Err(ConfigError::EmptyMovie);
        }
        Ok(Self { data })
    }

    /// 由逐帧二维数组创建. 任一帧与第一帧形状不一致时返回 `ShapeMismatch`.
    pub fn from_frames<I: IntoIterator<Item = Array2<i32>>>(frames: I) -> ConfigResult<Self> {
        let frames: Vec<Array2<i32>> = frames.into_iter().collect();
        let Some(first) = frames.first() else {
            return Err(ConfigError::EmptyMovie);
        };
        let expected = first.dim();
        if let Some((index, f)) = frames.iter().enumerate().find(|(_, f)| f.dim() != expected) {
            return Err(ConfigError::ShapeMismatch {
                index,
                expected,
                found: f.dim(),
            });
        }

        let (h, w) = expected;
        let mut data = Array3::<i32>::zeros((frames.len(), h, w));
        for (mut dst, src) in data.axis_iter_mut(Axis(0)).zip(frames.iter()) {
            dst.assign(src);
        }
        Self::new(data)
    }

    /// 由任意原始数值类型的 `(t, h, w)` 数组创建, 数值截断为 `i32`.
    ///
    /// 存在无法表示为 `i32` 的值 (如 NaN, 溢出) 时返回 `InvalidParameter`.
    pub fn from_array<T: ToPrimitive>(data: ArrayView3<T>) -> ConfigResult<Self> {
        let mut out = Array3::<i32>::zeros(data.raw_dim());
        for (dst, src) in out.iter_mut().zip(data.iter()) {
            *dst = src.to_i32().ok_or(ConfigError::InvalidParameter("movie"))?;
        }
        Self::new(out)
    }

    /// 帧数.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape().0
    }

    /// 是否没有任何帧. 由构造保证总是返回 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(t, h, w)` 形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        shape3(&self.data)
    }

    /// 单帧形状 `(h, w)`.
    #[inline]
    pub fn frame_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取第 `index` 帧视图.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn frame_at(&self, index: usize) -> FrameSlice<'_> {
        FrameSlice::new(self.data.index_axis(Axis(0), index))
    }

    /// 获取能按时间升序迭代帧的迭代器.
    #[inline]
    pub fn frame_iter(&self) -> impl ExactSizeIterator<Item = FrameSlice> {
        self.data.axis_iter(Axis(0)).map(FrameSlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, i32, Ix3> {
        self.data.view()
    }

    /// 对每帧实施 `op`, 结果按帧序收集. 启用 `rayon` 时并行执行.
    #[cfg(feature = "rayon")]
    pub fn map_frames<R, F>(&self, op: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize, FrameSlice) -> R + Sync + Send,
    {
        self.data
            .axis_iter(Axis(0))
            .into_par_iter()
            .enumerate()
            .map(|(i, v)| op(i, FrameSlice::new(v)))
            .collect()
    }

    /// 对每帧实施 `op`, 结果按帧序收集.
    #[cfg(not(feature = "rayon"))]
    pub fn map_frames<R, F>(&self, op: F) -> Vec<R>
    where
        F: Fn(usize, FrameSlice) -> R,
    {
        self.frame_iter().enumerate().map(|(i, f)| op(i, f)).collect()
    }
}

/// 标签影像, 按 `(t, h, w)` 组织, 值域为 0..=3.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelMovie {
    data: Array3<u8>,
}

impl Index<Idx3d> for LabelMovie {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl LabelMovie {
    /// 由逐帧标签切片拼接. 所有切片形状必须为 `shape`, 否则程序 panic.
    pub fn from_slices<I>(shape: Idx2d, slices: I) -> Self
    where
        I: IntoIterator<Item = OwnedLabelSlice>,
    {
        let slices: Vec<Array2<u8>> = slices.into_iter().map(OwnedLabelSlice::into_raw).collect();
        let (h, w) = shape;
        let mut data = Array3::<u8>::zeros((slices.len(), h, w));
        for (mut dst, src) in data.axis_iter_mut(Axis(0)).zip(slices.iter()) {
            dst.assign(src);
        }
        Self { data }
    }

    /// 将已有标签形式的强度影像转为标签影像.
    ///
    /// 若某帧存在 0..=3 之外的值, 返回 `InvalidLabel`.
    pub fn from_movie(movie: &Movie) -> ConfigResult<Self> {
        if let Some(((index, _, _), &value)) = movie
            .data()
            .indexed_iter()
            .find(|&(_, &v)| !(0..=3).contains(&v))
        {
            return Err(ConfigError::InvalidLabel { index, value });
        }
        let data = movie.data().mapv(|v| v as u8);
        debug_assert!(data.iter().all(|&v| is_valid_label(v)));
        Ok(Self { data })
    }

    /// 帧数.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape().0
    }

    /// 是否没有任何帧.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(t, h, w)` 形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        shape3(&self.data)
    }

    /// 获取第 `index` 帧不可变切片.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, index: usize) -> LabelSlice {
        LabelSlice::new(self.data.index_axis(Axis(0), index))
    }

    /// 获取能按时间升序迭代不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = LabelSlice> {
        self.data.axis_iter(Axis(0)).map(LabelSlice::new)
    }

    /// 获取能按时间升序迭代可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(&mut self) -> impl ExactSizeIterator<Item = LabelSliceMut> {
        self.data.axis_iter_mut(Axis(0)).map(LabelSliceMut::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 对每帧实施 `op`, 结果按帧序收集. 启用 `rayon` 时并行执行.
    #[cfg(feature = "rayon")]
    pub fn map_slices<R, F>(&self, op: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize, LabelSlice) -> R + Sync + Send,
    {
        self.data
            .axis_iter(Axis(0))
            .into_par_iter()
            .enumerate()
            .map(|(i, v)| op(i, LabelSlice::new(v)))
            .collect()
    }

    /// 对每帧实施 `op`, 结果按帧序收集.
    #[cfg(not(feature = "rayon"))]
    pub fn map_slices<R, F>(&self, op: F) -> Vec<R>
    where
        F: Fn(usize, LabelSlice) -> R,
    {
        self.slice_iter().enumerate().map(|(i, s)| op(i, s)).collect()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_movie_shape_mismatch() {
        let a = Array2::<i32>::zeros((4, 5));
        let b = Array2::<i32>::zeros((4, 6));
        let err = Movie::from_frames([a.clone(), a, b]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ShapeMismatch {
                index: 2,
                expected: (4, 5),
                found: (4, 6),
            }
        );
    }

    #[test]
    fn test_movie_empty() {
        assert_eq!(
            Movie::from_frames(Vec::<Array2<i32>>::new()).unwrap_err(),
            ConfigError::EmptyMovie
        );
        assert_eq!(
            Movie::new(Array3::zeros((3, 0, 4))).unwrap_err(),
            ConfigError::EmptyMovie
        );
    }

    #[test]
    fn test_movie_from_float_array() {
        let raw = Array3::from_shape_vec((1, 2, 2), vec![1.7f32, 2.0, -3.2, 9.0]).unwrap();
        let m = Movie::from_array(raw.view()).unwrap();
        assert_eq!(m.frame_at(0).data(), array![[1, 2], [-3, 9]]);

        let bad = Array3::from_elem((1, 1, 1), f64::NAN);
        assert!(Movie::from_array(bad.view()).is_err());
    }

    #[test]
    fn test_label_movie_validates() {
        let mut raw = Array3::<i32>::zeros((2, 3, 3));
        raw[(1, 2, 0)] = 4;
        let m = Movie::new(raw).unwrap();
        assert_eq!(
            LabelMovie::from_movie(&m).unwrap_err(),
            ConfigError::InvalidLabel { index: 1, value: 4 }
        );
    }

    #[test]
    fn test_map_keeps_order() {
        let frames = (0..6).map(|i| Array2::from_elem((2, 2), i));
        let m = Movie::from_frames(frames).unwrap();
        let firsts = m.map_frames(|i, f| (i, f[(0, 0)]));
        let expected: Vec<(usize, i32)> = (0..6usize).map(|i| (i, i as i32)).collect();
        assert_eq!(firsts, expected);
    }
}
