//! 程序运行函数.

use crate::algos::{run_variant, VARIANTS};
use crate::result::AblationResult;
use log::info;
use std::thread;

/// 实际运行.
pub fn run() -> AblationResult {
    let frames = utils::frames_from_env();
    let phantom = utils::bent_tubule();
    let widths = utils::lumen_sweep(frames);
    info!(
        "Running sampling ablation: {} variants, {frames} frames, {} cores",
        VARIANTS.len(),
        utils::cpus()
    );

    thread::scope(|s| {
        let (p, w) = (&phantom, widths.as_slice());
        let handles = VARIANTS.map(|v| s.spawn(move || run_variant(&v, p, w)));

        AblationResult::from_iter(
            VARIANTS.iter().map(|v| v.name).zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            ),
        )
    })
}
