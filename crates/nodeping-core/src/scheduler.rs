use crate::error::{Error, Result};
use crate::node::NodeRecord;
use crate::probe::{probe_node, ProbeOutcome, Prober, TcpProber};
use crate::progress::{Progress, ProgressCadence, ProgressSink, ProgressTracker, Tick};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// 调度选项
#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// 同时进行的探测数上限
    pub concurrency: usize,
    /// 单个节点的连接超时
    pub timeout: Duration,
    /// 进度通知节奏
    pub cadence: ProgressCadence,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency: 20,
            timeout: Duration::from_secs(5),
            cadence: ProgressCadence::default(),
        }
    }
}

/// 批量探测调度器
///
/// 每个节点一个任务，由信号量限制并发；结果经由通道回到唯一的收集循环，
/// 完成计数和通知节奏只在收集循环里修改。
pub struct Scheduler {
    options: SchedulerOptions,
    prober: Arc<dyn Prober>,
}

impl Scheduler {
    /// 使用TCP探测器创建调度器
    pub fn new(options: SchedulerOptions) -> Result<Self> {
        let prober = Arc::new(TcpProber::new(options.timeout));
        Self::with_prober(options, prober)
    }

    /// 使用自定义探测器创建调度器
    pub fn with_prober(options: SchedulerOptions, prober: Arc<dyn Prober>) -> Result<Self> {
        if options.concurrency == 0 {
            return Err(Error::Configuration("并发数必须大于0".to_string()));
        }
        if options.concurrency > Semaphore::MAX_PERMITS {
            return Err(Error::Configuration(format!(
                "并发数不能超过 {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if options.timeout.is_zero() {
            return Err(Error::Configuration("探测超时必须大于0".to_string()));
        }
        if options.cadence.interval.is_zero() {
            return Err(Error::Configuration("进度通知间隔必须大于0".to_string()));
        }
        Ok(Self { options, prober })
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// 探测所有节点，全部完成后返回
    ///
    /// 结果按输入顺序排列；成功的节点写入 `delay` 字段，其余节点的 `delay` 被移除。
    pub async fn run(
        &self,
        mut nodes: Vec<NodeRecord>,
        sink: &dyn ProgressSink,
    ) -> Vec<(NodeRecord, ProbeOutcome)> {
        let total = nodes.len();
        let started = Instant::now();
        let mut tracker = ProgressTracker::new(total, self.options.cadence, started);

        if total == 0 {
            sink.on_progress(&Progress { processed: 0, total: 0, elapsed: started.elapsed() });
            return Vec::new();
        }

        info!("开始测试 {} 个节点的延迟 (并发 {})", total, self.options.concurrency);

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let (tx, mut rx) = mpsc::channel::<(usize, ProbeOutcome)>(total);

        for (index, node) in nodes.iter().enumerate() {
            let tx = tx.clone();
            let semaphore = Arc::clone(&semaphore);
            let prober = Arc::clone(&self.prober);
            let node = node.clone();
            tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let outcome = AssertUnwindSafe(probe_node(prober.as_ref(), &node))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        error!("测试节点 '{}' 时发生未知异常", node.label());
                        ProbeOutcome::Unreachable
                    });
                let _ = tx.send((index, outcome)).await;
            });
        }
        drop(tx);

        let mut outcomes: Vec<Option<ProbeOutcome>> = vec![None; total];
        let mut ticker = tokio::time::interval(self.options.cadence.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval的第一次tick立即完成
        ticker.tick().await;

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some((index, outcome)) => {
                        if outcomes[index].is_none() {
                            match outcome {
                                ProbeOutcome::Reachable { latency_ms } => nodes[index].set_delay(latency_ms),
                                ProbeOutcome::Unreachable => nodes[index].clear_delay(),
                            }
                            outcomes[index] = Some(outcome);
                            emit(sink, tracker.complete_one(Instant::now()));
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => emit(sink, tracker.tick(Instant::now())),
            }
        }

        // 任务未回报结果（例如被运行时中止），按不可达处理
        for (index, slot) in outcomes.iter_mut().enumerate() {
            if slot.is_none() {
                error!("节点 '{}' 的测试任务没有返回结果", nodes[index].label());
                nodes[index].clear_delay();
                *slot = Some(ProbeOutcome::Unreachable);
                emit(sink, tracker.complete_one(Instant::now()));
            }
        }

        debug!("批次完成，耗时 {:?}", started.elapsed());

        nodes
            .into_iter()
            .zip(outcomes)
            .map(|(node, outcome)| (node, outcome.unwrap_or(ProbeOutcome::Unreachable)))
            .collect()
    }
}

fn emit(sink: &dyn ProgressSink, tick: Tick) {
    if let Some(elapsed) = tick.long_running {
        sink.on_long_running(elapsed);
    }
    if let Some(progress) = tick.progress {
        sink.on_progress(&progress);
    }
}
