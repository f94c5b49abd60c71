//! 将无序的细曲线像素集排成首尾相接的序列.

use crate::Idx2d;
use binary_heap_plus::BinaryHeap;
use either::Either;

/// 两点欧氏距离的平方.
#[inline]
fn dist2(a: Idx2d, b: Idx2d) -> u64 {
    let dh = a.0.abs_diff(b.0) as u64;
    let dw = a.1.abs_diff(b.1) as u64;
    dh * dh + dw * dw
}

/// 求每个点最近的两个其它点的下标, 按 `(距离, 下标)` 升序.
///
/// 先沿跨度较大的坐标轴排序, 再向两侧扫描; 当轴向差的平方已超过当前第二近距离时,
/// 该方向不可能出现更近的点, 停止扫描.
fn two_nearest(points: &[Idx2d]) -> Vec<[usize; 2]> {
    let span = |f: fn(&Idx2d) -> usize| {
        let (lo, hi) = points
            .iter()
            .map(f)
            .fold((usize::MAX, 0), |(lo, hi), v| (lo.min(v), hi.max(v)));
        hi.saturating_sub(lo)
    };
    let key: fn(&Idx2d) -> usize = if span(|p| p.0) >= span(|p| p.1) {
        |p| p.0
    } else {
        |p| p.1
    };

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (key(&points[i]), i));
    let mut rank = vec![0usize; points.len()];
    for (r, &i) in order.iter().enumerate() {
        rank[i] = r;
    }

    let mut ans = Vec::with_capacity(points.len());
    for (i, &p) in points.iter().enumerate() {
        // 堆顶为当前两个候选中较远者.
        let mut heap: BinaryHeap<(u64, usize), _> =
            BinaryHeap::new_by(|a: &(u64, usize), b: &(u64, usize)| a.cmp(b));
        heap.reserve(3);

        let r = rank[i];
        let sides = [
            Either::Left(order[..r].iter().rev()),
            Either::Right(order[r + 1..].iter()),
        ];
        for side in sides {
            for &j in side {
                let axis = key(&p).abs_diff(key(&points[j])) as u64;
                if heap.len() == 2 && heap.peek().is_some_and(|top| axis * axis > top.0) {
                    break;
                }
                let cand = (dist2(p, points[j]), j);
                if heap.len() < 2 {
                    heap.push(cand);
                } else if heap.peek().is_some_and(|top| cand < *top) {
                    heap.pop();
                    heap.push(cand);
                }
            }
        }

        let sorted = heap.into_sorted_vec();
        ans.push([sorted[0].1, sorted[1].1]);
    }
    ans
}

/// 沿最近邻关系从 `seq` 尾部向外延伸, 直到两个最近邻都已访问.
fn extend(seq: &mut Vec<usize>, visited: &mut [bool], nn: &[[usize; 2]]) {
    while let Some(&last) = seq.last() {
        match nn[last].iter().find(|&&j| !visited[j]) {
            Some(&next) => {
                visited[next] = true;
                seq.push(next);
            }
            None => break,
        }
    }
}

/// 将一条细的开曲线的无序像素集排成连通序列.
///
/// 以第一个点及其两个最近邻为种子, 分别向两端贪心延伸, 每步取当前端点第一个未访问的最近邻;
/// 两个最近邻都已访问时该方向终止. 若曲线存在较大间隙或分叉, 结果可能只覆盖其中一段.
///
/// 少于 3 个点时原样返回.
pub fn sort_curve(points: &[Idx2d]) -> Vec<Idx2d> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let nn = two_nearest(points);
    let [a, b] = nn[0];
    let p0 = points[0];

    let mut visited = vec![false; points.len()];
    // `b` 比 `p0` 更靠近 `a` 时, 两个邻居在同一侧, `p0` 是端点.
    let mut seq = if dist2(points[a], points[b]) < dist2(p0, points[b]) {
        vec![0, a]
    } else {
        vec![a, 0, b]
    };
    for &i in seq.iter() {
        visited[i] = true;
    }

    extend(&mut seq, &mut visited, &nn);
    seq.reverse();
    extend(&mut seq, &mut visited, &nn);

    seq.into_iter().map(|i| points[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_walk(seq: &[Idx2d]) -> bool {
        seq.windows(2)
            .all(|w| w[0].0.abs_diff(w[1].0) <= 1 && w[0].1.abs_diff(w[1].1) <= 1)
    }

    #[test]
    fn test_two_nearest_line() {
        let pts: Vec<Idx2d> = (0..6).map(|i| (i, 3)).collect();
        let nn = two_nearest(&pts);
        assert_eq!(nn[0], [1, 2]);
        assert_eq!(nn[3], [2, 4]);
        assert_eq!(nn[5], [4, 3]);
    }

    #[test]
    fn test_shuffled_diagonal() {
        let line: Vec<Idx2d> = (0..20).map(|i| (i, i)).collect();
        // 7 与 20 互素, 得到一个确定的置换.
        let shuffled: Vec<Idx2d> = (0..20).map(|i| line[(i * 7 + 3) % 20]).collect();
        let sorted = sort_curve(&shuffled);
        assert_eq!(sorted.len(), 20);
        assert!(is_walk(&sorted));
        let increasing = sorted.windows(2).all(|w| w[0] < w[1]);
        let decreasing = sorted.windows(2).all(|w| w[0] > w[1]);
        assert!(increasing || decreasing);
    }

    #[test]
    fn test_seed_at_endpoint() {
        let line: Vec<Idx2d> = (0..20).map(|i| (i, i)).collect();
        let shuffled: Vec<Idx2d> = (0..20).map(|i| line[(i * 7) % 20]).collect();
        assert_eq!(shuffled[0], (0, 0));
        let sorted = sort_curve(&shuffled);
        assert_eq!(sorted.len(), 20);
        assert!(is_walk(&sorted));
    }

    #[test]
    fn test_bent_curve() {
        // 先向下, 再向右.
        let mut pts: Vec<Idx2d> = (0..10).map(|i| (i, 0)).collect();
        pts.extend((1..10).map(|j| (9, j)));
        pts.rotate_left(5);
        let sorted = sort_curve(&pts);
        assert_eq!(sorted.len(), 19);
        assert!(is_walk(&sorted));
    }

    #[test]
    fn test_tiny_input() {
        assert_eq!(sort_curve(&[(1, 1), (0, 0)]), vec![(1, 1), (0, 0)]);
    }
}
