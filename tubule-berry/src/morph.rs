//! 正方形结构元的二值形态学操作.
//!
//! 图像外的像素不参与运算, 对二值图而言这与反射填充等价.
//! 结构元可分离, 因此每个操作都拆为行、列两次一维滑窗, 复杂度与窗口大小无关.

use ndarray::{Array2, ArrayView2, Axis};

/// 一维滑窗: 第 `i` 个输出覆盖 `[i - before, i + after]` 与图像的交集.
/// `all` 为真时要求窗口内全为前景 (腐蚀), 否则只要求存在前景 (膨胀).
fn filter_axis(
    mask: ArrayView2<bool>,
    axis: Axis,
    before: usize,
    after: usize,
    all: bool,
) -> Array2<bool> {
    let mut out = Array2::from_elem(mask.dim(), false);
    let mut prefix = Vec::new();
    for (src, mut dst) in mask.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        let n = src.len();
        prefix.clear();
        prefix.push(0usize);
        for &v in src.iter() {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + usize::from(v));
        }
        for i in 0..n {
            let lo = i.saturating_sub(before);
            let hi = (i + after + 1).min(n);
            let c = prefix[hi] - prefix[lo];
            dst[i] = if all { c == hi - lo } else { c > 0 };
        }
    }
    out
}

/// 在行、列两个方向上依次实施一维滑窗.
fn filter2(mask: ArrayView2<bool>, before: usize, after: usize, all: bool) -> Array2<bool> {
    let rows = filter_axis(mask, Axis(1), before, after, all);
    filter_axis(rows.view(), Axis(0), before, after, all)
}

/// 以 `size * size` 正方形为结构元的膨胀. 窗口为 `[i - size / 2, i + (size - 1) / 2]`.
///
/// `size` 为 0 时按 1 处理, 即恒等变换.
pub fn dilate(mask: ArrayView2<bool>, size: usize) -> Array2<bool> {
    let size = size.max(1);
    filter2(mask, size / 2, (size - 1) / 2, false)
}

/// 以 `size * size` 正方形为结构元的腐蚀. 窗口为膨胀窗口的镜像
/// `[i - (size - 1) / 2, i + size / 2]`, 保证偶数窗口的开、闭运算不产生平移.
///
/// `size` 为 0 时按 1 处理, 即恒等变换.
pub fn erode(mask: ArrayView2<bool>, size: usize) -> Array2<bool> {
    let size = size.max(1);
    filter2(mask, (size - 1) / 2, size / 2, true)
}

/// 开运算: 先腐蚀后膨胀. 去除小于结构元的前景斑点.
#[inline]
pub fn open(mask: ArrayView2<bool>, size: usize) -> Array2<bool> {
    dilate(erode(mask, size).view(), size)
}

/// 闭运算: 先膨胀后腐蚀. 填补小于结构元的前景缝隙.
#[inline]
pub fn close(mask: ArrayView2<bool>, size: usize) -> Array2<bool> {
    erode(dilate(mask, size).view(), size)
}

/// `mask` 与其腐蚀之差, 即前景的内边缘.
pub fn inner_edge(mask: ArrayView2<bool>, size: usize) -> Array2<bool> {
    let eroded = erode(mask, size);
    ndarray::Zip::from(&mask)
        .and(&eroded)
        .map_collect(|&m, &e| m && !e)
}
