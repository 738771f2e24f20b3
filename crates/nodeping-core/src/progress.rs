//! 批量探测的进度通知
//!
//! [`ProgressTracker`] 只负责节奏判断，由调度器的收集循环单独持有；
//! [`ProgressSink`] 负责展示，实现必须是非阻塞的。

use std::time::{Duration, Instant};
use tracing::info;

/// 一次进度通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 已完成的节点数
    pub processed: usize,
    /// 节点总数
    pub total: usize,
    /// 批次开始至今的耗时
    pub elapsed: Duration,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// 进度接收方
pub trait ProgressSink: Send + Sync {
    /// 批次运行时间超过阈值时调用一次
    fn on_long_running(&self, _elapsed: Duration) {}

    /// 最多每个间隔调用一次，批次完成时必定调用
    fn on_progress(&self, progress: &Progress);
}

/// 丢弃所有通知
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _progress: &Progress) {}
}

/// 把进度写入日志
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_long_running(&self, _elapsed: Duration) {
        info!("本次总节点有点多，正在测试节点延迟中，请不要关闭窗口~");
    }

    fn on_progress(&self, progress: &Progress) {
        info!(
            "已测试 {}/{} 个节点，累计时间：{}",
            progress.processed,
            progress.total,
            format_elapsed(progress.elapsed)
        );
    }
}

/// 进度节奏
#[derive(Debug, Clone, Copy)]
pub struct ProgressCadence {
    /// 超过该时长后发出一次长时间运行提示
    pub notice_after: Duration,
    /// 两次进度通知的最小间隔
    pub interval: Duration,
}

impl Default for ProgressCadence {
    fn default() -> Self {
        Self {
            notice_after: Duration::from_secs(10),
            interval: Duration::from_secs(1),
        }
    }
}

/// 一次检查产生的事件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    /// 本次需要发出长时间运行提示
    pub long_running: Option<Duration>,
    /// 本次需要发出的进度
    pub progress: Option<Progress>,
}

/// 完成计数与通知节奏
#[derive(Debug)]
pub struct ProgressTracker {
    cadence: ProgressCadence,
    started: Instant,
    last_notice: Instant,
    long_notice_shown: bool,
    processed: usize,
    total: usize,
}

impl ProgressTracker {
    pub fn new(total: usize, cadence: ProgressCadence, started: Instant) -> Self {
        Self {
            cadence,
            started,
            last_notice: started,
            long_notice_shown: false,
            processed: 0,
            total,
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    /// 记录一个节点完成
    pub fn complete_one(&mut self, now: Instant) -> Tick {
        self.processed = (self.processed + 1).min(self.total);
        self.check(now, true)
    }

    /// 定时检查，不改变计数
    pub fn tick(&mut self, now: Instant) -> Tick {
        self.check(now, false)
    }

    fn check(&mut self, now: Instant, completed_one: bool) -> Tick {
        let elapsed = now.saturating_duration_since(self.started);
        let mut tick = Tick::default();

        if !self.long_notice_shown && elapsed > self.cadence.notice_after && !self.is_complete() {
            self.long_notice_shown = true;
            tick.long_running = Some(elapsed);
        }

        let finished_now = completed_one && self.is_complete();
        let due = now.saturating_duration_since(self.last_notice) >= self.cadence.interval;
        if finished_now || due {
            self.last_notice = now;
            tick.progress = Some(Progress {
                processed: self.processed,
                total: self.total,
                elapsed,
            });
        }

        tick
    }
}

/// 秒数转换为分钟和秒的格式
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let minutes = secs / 60;
    let seconds = secs % 60;
    if minutes > 0 {
        format!("{}分钟{}秒", minutes, seconds)
    } else {
        format!("{}秒", seconds)
    }
}
