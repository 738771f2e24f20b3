use crate::aggregate::{aggregate, ResultSets};
use crate::config::Config;
use crate::dedup::dedupe;
use crate::error::Result;
use crate::node::NodeRecord;
use crate::probe::{Prober, TcpProber};
use crate::progress::{format_elapsed, ProgressSink};
use crate::scheduler::Scheduler;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// 一次完整检查的结果
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// 划分好的节点
    pub results: ResultSets,
    /// 去重前的节点数
    pub parsed: usize,
    /// 去重移除的节点数
    pub duplicates: usize,
    /// 探测总耗时
    pub elapsed: Duration,
}

/// 去重、探测并划分节点
///
/// 配置错误在探测开始前返回；单个节点的失败只会让它进入不可达列表。
pub async fn check_nodes(
    nodes: Vec<NodeRecord>,
    config: &Config,
    prober: Arc<dyn Prober>,
    sink: &dyn ProgressSink,
) -> Result<CheckReport> {
    config.validate()?;
    let scheduler = Scheduler::with_prober(config.scheduler_options(), prober)?;

    let parsed = nodes.len();
    let deduped = dedupe(nodes);
    info!("去重前有 {} 个节点，去重后有 {} 个节点", parsed, deduped.nodes.len());

    let started = Instant::now();
    let outcomes = scheduler.run(deduped.nodes, sink).await;
    let results = aggregate(outcomes);
    let elapsed = started.elapsed();

    let summary = results.summary();
    info!("测试完成，总用时：{}", format_elapsed(elapsed));
    info!("正常节点数量: {}", summary.reachable);
    info!("超时节点数量: {}", summary.unreachable);

    Ok(CheckReport {
        results,
        parsed,
        duplicates: deduped.duplicates,
        elapsed,
    })
}

/// 使用TCP探测器的 [`check_nodes`]
pub async fn check_nodes_tcp(
    nodes: Vec<NodeRecord>,
    config: &Config,
    sink: &dyn ProgressSink,
) -> Result<CheckReport> {
    let prober = Arc::new(TcpProber::new(config.timeout()));
    check_nodes(nodes, config, prober, sink).await
}
