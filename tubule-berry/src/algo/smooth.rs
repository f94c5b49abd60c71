//! 一维序列的滑动平均.

/// 边缘填充模式的滑动平均, 输出与输入等长.
///
/// 第 `i` 个输出为输入在窗口 `[i - window / 2, i - window / 2 + window)`
/// 与 `[0, len)` 交集上的均值. 奇数窗口严格居中; `window` 为 0 时按 1 处理,
/// 即恒等变换.
///
/// 窗口内的 NaN 会被忽略; 若窗口内全为 NaN, 则输出 NaN.
pub fn running_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let window = window.max(1);
    if window == 1 {
        return values.to_vec();
    }
    let half = window / 2;

    // 前缀和与前缀有效计数, 保证 O(n).
    let mut sum = Vec::with_capacity(n + 1);
    let mut cnt = Vec::with_capacity(n + 1);
    sum.push(0.0);
    cnt.push(0usize);
    for &v in values {
        let (s, c) = (sum[sum.len() - 1], cnt[cnt.len() - 1]);
        if v.is_nan() {
            sum.push(s);
            cnt.push(c);
        } else {
            sum.push(s + v);
            cnt.push(c + 1);
        }
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + window - half).min(n);
            match cnt[hi] - cnt[lo] {
                0 => f64::NAN,
                c => (sum[hi] - sum[lo]) / c as f64,
            }
        })
        .collect()
}

/// 忽略 NaN 的最大值. 若不存在非 NaN 值则返回 NaN.
pub fn nan_max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, f64::max)
}

/// 以忽略 NaN 的最大值归一化序列. 最大值为 NaN 或 0 时输出全为 NaN.
pub fn normalize_by_max(values: &[f64]) -> Vec<f64> {
    let max = nan_max(values);
    if max.is_nan() || max == 0.0 {
        return vec![f64::NAN; values.len()];
    }
    values.iter().map(|v| v / max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_constant_is_fixed_point() {
        let v = vec![4.25; 17];
        for w in [1, 2, 3, 10, 20, 40] {
            let s = running_average(&v, w);
            assert_eq!(s.len(), v.len());
            assert!(s.iter().all(|x| f64_eq(*x, 4.25)));
        }
    }

    #[test]
    fn test_window_one_is_identity() {
        let v = [3.0, -1.0, 8.5, 0.0, 2.0];
        assert_eq!(running_average(&v, 1), v.to_vec());
        assert_eq!(running_average(&v, 0), v.to_vec());
    }

    #[test]
    fn test_edge_padding() {
        // 窗口 3: 端点只平均两个值.
        let s = running_average(&[0.0, 3.0, 6.0, 9.0], 3);
        assert!(f64_eq(s[0], 1.5));
        assert!(f64_eq(s[1], 3.0));
        assert!(f64_eq(s[2], 6.0));
        assert!(f64_eq(s[3], 7.5));
    }

    #[test]
    fn test_nan_ignored() {
        let s = running_average(&[1.0, f64::NAN, 3.0], 3);
        assert!(f64_eq(s[1], 2.0));
        assert!(running_average(&[f64::NAN; 3], 3).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_normalize() {
        let n = normalize_by_max(&[2.0, f64::NAN, 4.0]);
        assert!(f64_eq(n[0], 0.5));
        assert!(n[1].is_nan());
        assert!(f64_eq(n[2], 1.0));
        assert!(normalize_by_max(&[0.0, 0.0]).iter().all(|v| v.is_nan()));
    }
}
