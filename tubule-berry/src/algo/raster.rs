//! 两像素之间的直线光栅化.

use crate::Idx2d;

/// 求连接 `start` 与 `stop` 的像素序列, 首为 `start`, 尾为 `stop`.
///
/// 取 `n = round(欧氏距离)` 个等距点 `start + round(d * shift / n)`, `d < n`,
/// 舍入为银行家舍入 (平局取偶). 若 `stop` 不在其中则追加之.
///
/// # 注意
///
/// 序列中可能出现相邻的重复像素, 调用方不应假设每一步都移动.
pub fn points_between(start: Idx2d, stop: Idx2d) -> Vec<Idx2d> {
    let dh = stop.0 as f64 - start.0 as f64;
    let dw = stop.1 as f64 - start.1 as f64;
    let n = dh.hypot(dw).round_ties_even() as usize;

    let mut points = Vec::with_capacity(n + 1);
    for d in 0..n {
        let (d, n) = (d as f64, n as f64);
        let h = start.0 as f64 + (d * dh / n).round_ties_even();
        let w = start.1 as f64 + (d * dw / n).round_ties_even();
        points.push((h as usize, w as usize));
    }
    if !points.contains(&stop) {
        points.push(stop);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::points_between;

    #[test]
    fn test_horizontal() {
        let p = points_between((5, 2), (5, 7));
        assert_eq!(p, vec![(5, 2), (5, 3), (5, 4), (5, 5), (5, 6), (5, 7)]);
    }

    #[test]
    fn test_reversed_vertical() {
        let p = points_between((9, 0), (6, 0));
        assert_eq!(p, vec![(9, 0), (8, 0), (7, 0), (6, 0)]);
    }

    #[test]
    fn test_single_point() {
        assert_eq!(points_between((3, 3), (3, 3)), vec![(3, 3)]);
    }

    #[test]
    fn test_diagonal_is_8_connected() {
        let p = points_between((0, 0), (19, 19));
        assert_eq!(p.first(), Some(&(0, 0)));
        assert_eq!(p.last(), Some(&(19, 19)));
        for w in p.windows(2) {
            assert!(w[0].0.abs_diff(w[1].0) <= 1 && w[0].1.abs_diff(w[1].1) <= 1);
        }
    }
}
