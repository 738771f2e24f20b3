use crate::node::NodeRecord;
use crate::probe::ProbeOutcome;

/// 最终输出的两组节点
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSets {
    /// 可用节点，按延迟升序
    pub reachable: Vec<NodeRecord>,
    /// 不可达节点，保持收到的顺序
    pub unreachable: Vec<NodeRecord>,
}

/// 节点计数摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub reachable: usize,
    pub unreachable: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.reachable + self.unreachable
    }
}

impl ResultSets {
    pub fn summary(&self) -> Summary {
        Summary {
            reachable: self.reachable.len(),
            unreachable: self.unreachable.len(),
        }
    }

    /// 延迟最低的节点
    pub fn fastest(&self) -> Option<&NodeRecord> {
        self.reachable.first()
    }
}

/// 按探测结果划分节点，可用节点按延迟稳定排序
///
/// 可用节点的 `delay` 总是取本次结果，不可达节点的 `delay` 被移除。
pub fn aggregate(outcomes: Vec<(NodeRecord, ProbeOutcome)>) -> ResultSets {
    let mut sets = ResultSets::default();
    let mut reachable = Vec::new();

    for (mut node, outcome) in outcomes {
        match outcome {
            ProbeOutcome::Reachable { latency_ms } => {
                node.set_delay(latency_ms);
                reachable.push(node);
            }
            ProbeOutcome::Unreachable => {
                node.clear_delay();
                sets.unreachable.push(node);
            }
        }
    }

    // sort_by 是稳定排序，相同延迟保持原顺序
    reachable.sort_by(|a, b| {
        let a = a.delay().unwrap_or(f64::INFINITY);
        let b = b.delay().unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    sets.reachable = reachable;
    sets
}
