//! 沿轮廓等距采样横截面.

use super::outline::OutlinePair;
use crate::algo::points_between;
use crate::config::{ArcLength, MeasureParams};
use crate::consts::gray::is_lumen;
use crate::{Idx2d, LabelSlice};
use either::Either;
use std::iter;

/// 曲线上每个点的累积弧长 (物理单位), 首点为 0.
pub fn arc_positions(curve: &[Idx2d], scale: f64, policy: ArcLength) -> Vec<f64> {
    let steps = match policy {
        ArcLength::PointIndex => Either::Left(iter::repeat(1.0).take(curve.len().saturating_sub(1))),
        ArcLength::Euclidean => Either::Right(curve.windows(2).map(|w| {
            let dh = w[0].0 as f64 - w[1].0 as f64;
            let dw = w[0].1 as f64 - w[1].1 as f64;
            dh.hypot(dw)
        })),
    };
    let cumulative = steps.scan(0.0, |acc, d| {
        *acc += d;
        Some(*acc)
    });
    iter::once(0.0)
        .chain(cumulative)
        .take(curve.len())
        .map(|p| p * scale)
        .collect()
}

/// 升序位置中最后一个不超过 `at` 的下标.
#[inline]
fn last_at_or_before(positions: &[f64], at: f64) -> Option<usize> {
    positions.partition_point(|&p| p <= at).checked_sub(1)
}

/// 一条有效横截面, 宽度以像素计.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossSection {
    /// 采样线上的像素.
    pub line: Vec<Idx2d>,

    /// 管道宽度: 采样线的步数, 即像素数减一.
    ///
    /// 按像素个数计宽度的工具会比这里多 1, 对比时需注意.
    pub tubule: f64,

    /// 管腔宽度: 首末管腔像素在采样线上的下标差.
    pub lumen: f64,

    /// 单侧细胞层厚度.
    pub cells: f64,
}

/// 采样统计.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SampleStats {
    /// 计划采样的位置数.
    pub planned: usize,

    /// 有效样本数.
    pub valid: usize,

    /// 端点位于图像边缘而跳过的样本数.
    pub on_border: usize,

    /// 采样线上没有管腔而跳过的样本数.
    pub no_lumen: usize,
}

/// 连接两点并读取采样线上的标签. 没有管腔时返回 `None`.
pub fn cross_section(slice: LabelSlice, a: Idx2d, b: Idx2d) -> Option<CrossSection> {
    let line = points_between(a, b);
    let first = line.iter().position(|&p| is_lumen(slice[p]))?;
    let last = line.iter().rposition(|&p| is_lumen(slice[p]))?;

    let tubule = (line.len() - 1) as f64;
    let lumen = (last - first) as f64;
    Some(CrossSection {
        line,
        tubule,
        lumen,
        cells: (tubule - lumen) / 2.0,
    })
}

/// 每隔 `params.spacing` 在两条轮廓上各取一点, 测量横截面.
pub fn sample_sections(
    slice: LabelSlice,
    pair: &OutlinePair,
    params: &MeasureParams,
) -> (Vec<CrossSection>, SampleStats) {
    let mut stats = SampleStats::default();
    let pos1 = arc_positions(&pair.first, params.scale, params.arc_length);
    let pos2 = arc_positions(&pair.second, params.scale, params.arc_length);
    let (Some(&end1), Some(&end2)) = (pos1.last(), pos2.last()) else {
        return (Vec::new(), stats);
    };

    // 采样位置数不超过轮廓点数.
    let steps = (end1 / params.spacing).floor().min((end2 / params.spacing).floor());
    let n = (steps as usize).min(pos1.len().min(pos2.len()));
    stats.planned = n.saturating_add(1);

    let mut sections = Vec::with_capacity(stats.planned);
    for i in 0..=n {
        let at = i as f64 * params.spacing;
        let (Some(k1), Some(k2)) = (last_at_or_before(&pos1, at), last_at_or_before(&pos2, at))
        else {
            continue;
        };
        let (a, b) = (pair.first[k1], pair.second[k2]);
        if slice.is_at_border(a) || slice.is_at_border(b) {
            stats.on_border += 1;
            continue;
        }
        match cross_section(slice, a, b) {
            Some(s) => sections.push(s),
            None => stats.no_lumen += 1,
        }
    }
    stats.valid = sections.len();
    (sections, stats)
}
