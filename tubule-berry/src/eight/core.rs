use super::Connectivity;
use crate::{Area2d, Areas2d, Idx2d, Idx2dF};
use ndarray::{Array2, ArrayView2};
use std::cmp::Reverse;
use std::collections::VecDeque;

/// 二值图像中的一个连通区域.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    /// 区域编号, 按首像素的行优先顺序从 1 开始.
    pub id: usize,

    /// 区域内所有像素.
    pub pixels: Area2d,
}

/// 有序序列的中位数. 偶数个元素时取中间两个的均值.
fn median_sorted(v: &[usize]) -> f64 {
    let n = v.len();
    if n % 2 == 1 {
        v[n / 2] as f64
    } else {
        (v[n / 2 - 1] as f64 + v[n / 2] as f64) / 2.0
    }
}

impl Component {
    /// 面积 (像素个数).
    #[inline]
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// 以行、列坐标中位数表示的质心.
    ///
    /// 区域非空由构造保证.
    pub fn centroid(&self) -> Idx2dF {
        let mut hs: Vec<usize> = self.pixels.iter().map(|p| p.0).collect();
        let mut ws: Vec<usize> = self.pixels.iter().map(|p| p.1).collect();
        hs.sort_unstable();
        ws.sort_unstable();
        (median_sorted(&hs), median_sorted(&ws))
    }

    /// 将区域画到形状为 `shape` 的二值图上.
    pub fn to_mask(&self, shape: Idx2d) -> Array2<bool> {
        let mut mask = Array2::from_elem(shape, false);
        for &p in self.pixels.iter() {
            mask[p] = true;
        }
        mask
    }
}

/// 按 `conn` 连通规则获取 `mask` 中所有值为 `value` 的区域,
/// 区域按首像素的行优先顺序排列.
pub fn regions(mask: ArrayView2<bool>, value: bool, conn: Connectivity) -> Areas2d {
    let (h, w) = mask.dim();
    let mut seen = Array2::from_elem((h, w), false);
    let mut ans = Areas2d::with_capacity(4);
    let mut bfs_q = VecDeque::with_capacity(16);

    for (pos, &pix) in mask.indexed_iter() {
        if pix != value || seen[pos] {
            continue;
        }
        seen[pos] = true;
        bfs_q.push_back(pos);
        let mut this_area = Area2d::with_capacity(16);
        while let Some(cur) = bfs_q.pop_front() {
            this_area.push(cur);
            for neigh in conn.neighbours(cur) {
                if matches!(mask.get(neigh), Some(&v) if v == value) && !seen[neigh] {
                    seen[neigh] = true;
                    bfs_q.push_back(neigh);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

/// 8-连通前景区域标记. 编号按首像素的行优先顺序从 1 开始.
pub fn components8(mask: ArrayView2<bool>) -> Vec<Component> {
    regions(mask, true, Connectivity::Eight)
        .into_iter()
        .enumerate()
        .map(|(i, pixels)| Component { id: i + 1, pixels })
        .collect()
}

/// 按面积降序稳定排序, 面积相同时保留编号顺序.
#[inline]
pub fn sort_by_area_desc(components: &mut [Component]) {
    components.sort_by_key(|c| Reverse(c.area()));
}

/// 填充空洞: 不与图像边缘接触的 4-连通背景区域被置为前景.
pub fn fill_holes(mask: ArrayView2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    let at_border = |(i, j): Idx2d| i == 0 || j == 0 || i + 1 == h || j + 1 == w;

    let mut ans = mask.to_owned();
    for area in regions(mask, false, Connectivity::Four) {
        if area.iter().all(|p| !at_border(*p)) {
            area.into_iter().for_each(|p| ans[p] = true);
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn from_rows(rows: &[&str]) -> Array2<bool> {
        let h = rows.len();
        let w = rows[0].len();
        Array2::from_shape_fn((h, w), |(i, j)| rows[i].as_bytes()[j] == b'#')
    }

    #[test]
    fn test_components8_diagonal_merge() {
        let m = from_rows(&["#..#", ".#..", "....", "##.."]);
        let comps = components8(m.view());
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0].area(), 2);
        assert_eq!(comps[0].id, 1);
        assert_eq!(comps[1].pixels, vec![(0, 3)]);
        assert_eq!(comps[2].area(), 2);
    }

    #[test]
    fn test_four_connectivity_splits_diagonal() {
        let m = from_rows(&["#.", ".#"]);
        assert_eq!(regions(m.view(), true, Connectivity::Four).len(), 2);
        assert_eq!(regions(m.view(), true, Connectivity::Eight).len(), 1);
    }

    #[test]
    fn test_sort_is_stable() {
        let m = from_rows(&["#.#.###", "......."]);
        let mut comps = components8(m.view());
        sort_by_area_desc(&mut comps);
        let ids: Vec<usize> = comps.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_median_centroid() {
        let c = Component {
            id: 1,
            pixels: vec![(0, 0), (0, 1), (0, 9), (4, 2)],
        };
        assert_eq!(c.centroid(), (0.0, 1.5));
    }

    #[test]
    fn test_fill_holes() {
        let m = from_rows(&["#####", "#..##", "#####", "..#..", "....."]);
        let filled = fill_holes(m.view());
        assert!(filled[(1, 1)] && filled[(1, 2)]);
        // 接触边缘的背景不是空洞.
        assert!(!filled[(3, 0)] && !filled[(4, 4)]);
    }
}
