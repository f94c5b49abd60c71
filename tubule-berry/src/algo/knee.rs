//! 单调曲线拐点 (knee / elbow) 检测.

/// 拐点: 在序列中的下标及其值.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Knee {
    /// 拐点下标.
    pub index: usize,

    /// 拐点处的序列值.
    pub value: f64,
}

/// 求序列的拐点.
///
/// 连接 `(0, max)` 与 `(len - 1, min)` 作一条直线, 拐点为 `直线值 - 序列值`
/// 最大的位置. 若有多个最大值, 取下标最小者.
///
/// 序列为空或存在非有限值时返回 `None`; 长度为 1 时返回下标 0.
pub fn kneedle(values: &[f64]) -> Option<Knee> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    if values.len() == 1 {
        return Some(Knee {
            index: 0,
            value: values[0],
        });
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let gradient = (min - max) / (values.len() - 1) as f64;

    let mut best = (0usize, f64::NEG_INFINITY);
    for (i, &v) in values.iter().enumerate() {
        let d = max + gradient * i as f64 - v;
        // 严格大于, 保证平局时保留第一个.
        if d > best.1 {
            best = (i, d);
        }
    }
    Some(Knee {
        index: best.0,
        value: values[best.0],
    })
}

/// 对降序排列的面积序列应用两级保留策略, 返回应保留的最大若干项的个数.
///
/// 1. 序列长度不超过 `bypass_len` 时全部保留;
/// 2. 否则保留拐点下标个数的最大项.
pub fn knee_cutoff(areas_desc: &[usize], bypass_len: usize) -> usize {
    if areas_desc.len() <= bypass_len {
        return areas_desc.len();
    }
    let values: Vec<f64> = areas_desc.iter().map(|&a| a as f64).collect();
    kneedle(&values).map_or(areas_desc.len(), |k| k.index)
}
