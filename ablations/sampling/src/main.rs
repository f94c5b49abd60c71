//! 横截面采样策略的消融实验: 在弯曲的合成管道上比较弧长计算方式与采样间隔.
//!
//! 帧数由环境变量 `TUBULE_ABLATION_FRAMES` 指定.

mod algos;
mod result;
mod runner;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::init_with_level(log::Level::Info)?;
    let result = runner::run();
    result.analyze(std::io::stdout().lock())?;
    Ok(())
}
