//! 时间维度的囊泡伪影抑制.
//!
//! 囊泡会短暂地挤入管腔, 使其在个别帧中被标为细胞组织. 若某块区域在相邻帧中是管腔,
//! 而在当前帧中不是, 且面积足够大, 就把它改回管腔.
//!
//! 相邻帧总是从未修正的掩码序列中读取, 因此各帧的修正互不影响, 可以并行.

use crate::algo::knee_cutoff;
use crate::config::VesicleParams;
use crate::consts::gray::*;
use crate::eight::{components8, fill_holes, sort_by_area_desc, Component};
use crate::morph;
use crate::{LabelMovie, LabelSlice};
use log::{debug, info};
use ndarray::{Array2, Zip};

/// 修正结果.
#[derive(Clone, Debug, PartialEq)]
pub struct VesicleCorrection {
    /// 修正后的掩码序列.
    pub masks: LabelMovie,

    /// 每帧被改为管腔的像素个数.
    pub relabeled: Vec<usize>,
}

/// 囊泡抑制器.
#[derive(Clone, Debug, Default)]
pub struct VesicleSuppressor {
    params: VesicleParams,
}

impl VesicleSuppressor {
    /// 初始化.
    #[inline]
    pub fn new(params: VesicleParams) -> Self {
        Self { params }
    }

    /// 候选像素: 在 `neighbour` 中是管腔, 而在 `current` 中不是.
    pub fn candidates(current: LabelSlice, neighbour: LabelSlice) -> Array2<bool> {
        Zip::from(&current.array_view())
            .and(&neighbour.array_view())
            .map_collect(|&c, &n| is_lumen(n) && !is_lumen(c))
    }

    /// 从候选像素中选出应被改回管腔的区域.
    ///
    /// 腐蚀后仍有种子像素的 8-连通候选区域以完整面积参与筛选,
    /// 先按拐点截断, 再丢弃面积小于下限的区域.
    pub fn select(&self, candidates: &Array2<bool>) -> Vec<Component> {
        let p = &self.params;
        let seeds = morph::erode(candidates.view(), p.erosion_window);

        let mut comps: Vec<Component> = components8(candidates.view())
            .into_iter()
            .filter(|c| c.pixels.iter().any(|&pos| seeds[pos]))
            .collect();
        sort_by_area_desc(&mut comps);
        let areas: Vec<usize> = comps.iter().map(Component::area).collect();
        let keep = knee_cutoff(&areas, p.knee_bypass_len);

        comps.truncate(keep);
        comps.retain(|c| c.area() >= p.min_area);
        comps
    }

    /// 第 `t` 帧需要改为管腔的像素, 为所有偏移结果的并集.
    ///
    /// 越界或掩码构建失败的相邻帧不产生候选.
    pub fn frame_patch(&self, masks: &LabelMovie, failed: &[bool], t: usize) -> Array2<bool> {
        let (_, h, w) = masks.shape();
        let mut patch = Array2::from_elem((h, w), false);
        if failed.get(t).copied().unwrap_or(false) {
            return patch;
        }

        let current = masks.slice_at(t);
        for &offset in self.params.offsets.iter() {
            let Some(n) = t.checked_add_signed(offset).filter(|&n| n < masks.len()) else {
                continue;
            };
            if failed.get(n).copied().unwrap_or(false) {
                continue;
            }
            let cand = Self::candidates(current, masks.slice_at(n));
            for c in self.select(&cand) {
                debug!("frame {t}: vesicle of {} pixels found against frame {n}", c.area());
                c.pixels.iter().for_each(|&pos| patch[pos] = true);
            }
        }
        patch
    }

    /// 修正整个掩码序列. `failed[t]` 为真表示第 `t` 帧掩码构建失败.
    ///
    /// 有修正的帧随后对管腔做闭运算并填充空洞, 没有修正的帧保持原样.
    pub fn correct(&self, masks: &LabelMovie, failed: &[bool]) -> VesicleCorrection {
        info!("Suppressing vesicles in {} frames", masks.len());
        let patches = masks.map_slices(|t, _| self.frame_patch(masks, failed, t));

        let mut corrected = masks.clone();
        let relabeled: Vec<usize> = corrected
            .slice_iter_mut()
            .zip(patches.iter())
            .map(|(mut s, patch)| {
                if !patch.iter().any(|&v| v) {
                    return 0;
                }
                let painted = s.paint(patch.view(), LUMEN);
                let lumen = morph::close(s.mask_of(LUMEN).view(), self.params.closing_window);
                let lumen = fill_holes(lumen.view());
                painted + s.paint(lumen.view(), LUMEN)
            })
            .collect();
        VesicleCorrection {
            masks: corrected,
            relabeled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnedLabelSlice;
    use ndarray::s;

    fn tubule((h, w): (usize, usize), lumen: (usize, usize, usize, usize)) -> Array2<u8> {
        let mut m = Array2::from_elem((h, w), CELLS);
        m.slice_mut(s![.., 0..20]).fill(BACKGROUND_1);
        m.slice_mut(s![.., w - 20..w]).fill(BACKGROUND_2);
        m.slice_mut(s![lumen.0..lumen.1, lumen.2..lumen.3]).fill(LUMEN);
        m
    }

    fn movie_with(frames: Vec<Array2<u8>>) -> LabelMovie {
        let shape = frames[0].dim();
        LabelMovie::from_slices(shape, frames.into_iter().map(OwnedLabelSlice::from_raw))
    }

    #[test]
    fn test_large_intrusion_is_relabeled() {
        let base = tubule((80, 120), (10, 70, 40, 80));
        let mut frames = vec![base.clone(); 11];
        frames[5].slice_mut(s![15..35, 45..75]).fill(CELLS);
        frames[5].slice_mut(s![50..60, 70..80]).fill(CELLS);
        let masks = movie_with(frames);

        let out = VesicleSuppressor::default().correct(&masks, &[false; 11]);
        let mut expected = vec![0; 11];
        expected[5] = 600;
        assert_eq!(out.relabeled, expected);

        let fixed = out.masks.slice_at(5);
        assert_eq!(fixed[(20, 50)], LUMEN);
        // 100 像素的侵入面积过小, 保持不变.
        assert_eq!(fixed[(55, 75)], CELLS);
        assert_eq!(out.masks.slice_at(0).array_view(), base.view());
    }

    #[test]
    fn test_corrected_lumen_is_closed_and_filled() {
        let mut base = tubule((80, 120), (10, 70, 40, 80));
        base.slice_mut(s![60..62, 50..52]).fill(CELLS);
        let mut frames = vec![base.clone(); 11];
        frames[5].slice_mut(s![15..35, 45..75]).fill(CELLS);
        let masks = movie_with(frames);

        let out = VesicleSuppressor::default().correct(&masks, &[false; 11]);
        let mut expected = vec![0; 11];
        expected[5] = 604;
        assert_eq!(out.relabeled, expected);

        // 管腔内封闭的小块只在有修正的帧中被填充.
        assert_eq!(out.masks.slice_at(5)[(60, 50)], LUMEN);
        assert_eq!(out.masks.slice_at(5)[(61, 51)], LUMEN);
        assert_eq!(out.masks.slice_at(0)[(60, 50)], CELLS);
        assert_eq!(out.masks.slice_at(0).array_view(), base.view());
    }

    #[test]
    fn test_failed_neighbours_are_ignored() {
        let base = tubule((80, 120), (10, 70, 40, 80));
        let mut frames = vec![base; 11];
        frames[5].slice_mut(s![15..35, 45..75]).fill(CELLS);
        let masks = movie_with(frames);

        let mut failed = [false; 11];
        failed[0] = true;
        failed[10] = true;
        let out = VesicleSuppressor::default().correct(&masks, &failed);
        assert!(out.relabeled.iter().all(|&n| n == 0));
        assert_eq!(out.masks, masks);
    }

    #[test]
    fn test_sliver_without_seed_is_kept() {
        let base = tubule((40, 720), (5, 35, 30, 690));
        let mut frames = vec![base; 6];
        frames[5].slice_mut(s![10..12, 40..690]).fill(CELLS);
        let masks = movie_with(frames);

        let out = VesicleSuppressor::default().correct(&masks, &[false; 6]);
        assert_eq!(out.relabeled[5], 0);
    }

    #[test]
    fn test_candidates() {
        let cur = tubule((40, 60), (10, 30, 25, 35));
        let mut prev = cur.clone();
        prev.slice_mut(s![5..10, 25..35]).fill(LUMEN);
        let cand = VesicleSuppressor::candidates(
            LabelSlice::new(cur.view()),
            LabelSlice::new(prev.view()),
        );
        assert_eq!(cand.iter().filter(|&&v| v).count(), 50);
    }
}
