mod profile;

use log::{debug, warn};
use tubule_berry::config::{ArcLength, MeasureParams};
use tubule_berry::measure::CrossProfileMeasurer;
use tubule_berry::phantom::TubulePhantom;
use tubule_berry::OwnedLabelSlice;

pub use profile::Profile;

/// 一种采样策略.
#[derive(Copy, Clone, Debug)]
pub struct Variant {
    /// 名称.
    pub name: &'static str,

    /// 弧长计算方式.
    pub arc_length: ArcLength,

    /// 采样间隔 (像素).
    pub spacing: f64,
}

/// 参与比较的全部策略.
pub const VARIANTS: [Variant; 4] = [
    Variant {
        name: "point-index/10",
        arc_length: ArcLength::PointIndex,
        spacing: 10.0,
    },
    Variant {
        name: "euclidean/10",
        arc_length: ArcLength::Euclidean,
        spacing: 10.0,
    },
    Variant {
        name: "point-index/5",
        arc_length: ArcLength::PointIndex,
        spacing: 5.0,
    },
    Variant {
        name: "euclidean/5",
        arc_length: ArcLength::Euclidean,
        spacing: 5.0,
    },
];

impl Variant {
    fn measurer(&self) -> CrossProfileMeasurer {
        CrossProfileMeasurer::new(MeasureParams {
            spacing: self.spacing,
            arc_length: self.arc_length,
            ..Default::default()
        })
    }
}

/// 在 `phantom` 的真值标签上逐帧测量, 第 `t` 帧管腔宽度为 `lumen_widths[t]`.
pub fn run_variant(v: &Variant, phantom: &TubulePhantom, lumen_widths: &[usize]) -> Profile {
    let measurer = v.measurer();
    let mut profile = Profile::new();
    for (t, &lw) in lumen_widths.iter().enumerate() {
        let truth = OwnedLabelSlice::from_raw(phantom.with_lumen_width(lw).labels());

        profile.target_start();
        let result = measurer.measure(t, truth.as_immut());
        profile.target_elapsed();

        match result {
            Ok(m) => {
                let errors = (
                    (m.row.lumen.mean - lw as f64).abs(),
                    (m.row.tubule.mean - phantom.tubule_width as f64).abs(),
                );
                debug!("{}: frame {t} errors {errors:?}", v.name);
                profile.count_measured(&m.stats, errors);
            }
            Err(e) => {
                warn!("{}: frame {t} failed: {e}", v.name);
                profile.count_failed();
            }
        }
    }
    profile.finish()
}
