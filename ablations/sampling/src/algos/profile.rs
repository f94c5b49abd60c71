//! 采样策略运行统计.

use std::time::{Duration, Instant};
use tubule_berry::measure::SampleStats;

/// ablation 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 累加并返回本轮时长.
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时间 (微秒).
    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 平均值. 计数为 0 时为 `None`.
#[inline]
fn average(sum: f64, count: u64) -> Option<f64> {
    match count {
        0 => None,
        n => Some(sum / n as f64),
    }
}

/// 一种采样策略在全部帧上的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 成功测量的帧数.
    measured: u64,

    /// 轮廓退化而失败的帧数.
    failed: u64,

    /// 横截面计数: 计划, 有效, 触及边缘, 不含管腔.
    sections: SampleStats,

    /// 管腔宽度均值与真值之差的绝对值之和.
    lumen_error: f64,

    /// 管道宽度均值与真值之差的绝对值之和.
    tubule_error: f64,

    /// 参与误差统计的帧数 (宽度均值有限).
    scored: u64,

    /// 测量耗时.
    target_time: AccTimer,

    /// 总耗时, 包括生成标签的时间.
    real_time: AccTimer,

    /// 单帧最长耗时.
    most: Option<Duration>,
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            measured: 0,
            failed: 0,
            sections: SampleStats::default(),
            lumen_error: 0.0,
            tubule_error: 0.0,
            scored: 0,
            target_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
        }
    }

    /// 开始一帧的测量计时.
    #[inline]
    pub fn target_start(&mut self) {
        self.target_time.start();
    }

    /// 结束一帧的测量计时.
    #[inline]
    pub fn target_elapsed(&mut self) {
        let d = self.target_time.elapsed();
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
    }

    /// 记录一帧成功的测量, 附带管腔与管道宽度的绝对误差.
    pub fn count_measured(&mut self, stats: &SampleStats, (lumen, tubule): (f64, f64)) {
        self.measured += 1;
        self.sections.planned += stats.planned;
        self.sections.valid += stats.valid;
        self.sections.on_border += stats.on_border;
        self.sections.no_lumen += stats.no_lumen;
        if lumen.is_finite() && tubule.is_finite() {
            self.lumen_error += lumen;
            self.tubule_error += tubule;
            self.scored += 1;
        }
    }

    /// 记录一帧失败的测量.
    #[inline]
    pub fn count_failed(&mut self) {
        self.failed += 1;
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 成功测量的帧数.
    #[inline]
    pub fn get_measured(&self) -> u64 {
        self.measured
    }

    /// 失败的帧数.
    #[inline]
    pub fn get_failed(&self) -> u64 {
        self.failed
    }

    /// 横截面计数.
    #[inline]
    pub fn get_sections(&self) -> &SampleStats {
        &self.sections
    }

    /// 管腔宽度平均绝对误差.
    #[inline]
    pub fn get_lumen_mae(&self) -> Option<f64> {
        average(self.lumen_error, self.scored)
    }

    /// 管道宽度平均绝对误差.
    #[inline]
    pub fn get_tubule_mae(&self) -> Option<f64> {
        average(self.tubule_error, self.scored)
    }

    /// 测量总耗时 (微秒).
    #[inline]
    pub fn get_target_time_us(&self) -> u64 {
        self.target_time.total_us()
    }

    /// 单帧平均测量耗时 (微秒).
    #[inline]
    pub fn get_avg_target_time_us(&self) -> Option<f64> {
        average(self.get_target_time_us() as f64, self.measured + self.failed)
    }

    /// 总耗时 (微秒).
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.total_us()
    }

    /// 单帧最长测量耗时. 没有任何帧时为 `None`.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
