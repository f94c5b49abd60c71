//! 消融实验依赖的通用组件.

use tubule_berry::phantom::TubulePhantom;

const SEP: &str = "--------------------------------------------------------";

/// 指定帧数的环境变量.
pub const FRAMES_ENV: &str = "TUBULE_ABLATION_FRAMES";

/// 默认帧数.
const DEFAULT_FRAMES: usize = 30;

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 实验帧数. 优先读取环境变量 [`FRAMES_ENV`], 无法解析或为 0 时使用默认值.
pub fn frames_from_env() -> usize {
    std::env::var(FRAMES_ENV)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(DEFAULT_FRAMES)
}

/// 创建一般情况下合适的弯曲管道: 300 × 400, 管道宽 80, 振幅 25, 一个半周期.
#[inline]
pub fn bent_tubule() -> TubulePhantom {
    TubulePhantom::new((300, 400), 80, 40).with_bend(25.0, 1.5)
}

/// 逐帧管腔宽度: 从 40 线性收缩到 10.
pub fn lumen_sweep(frames: usize) -> Vec<usize> {
    let (from, to) = (40.0, 10.0);
    let last = frames.saturating_sub(1).max(1) as f64;
    (0..frames)
        .map(|t| (from + (to - from) * t as f64 / last).round() as usize)
        .collect()
}
