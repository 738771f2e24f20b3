use crate::error::{Error, Result};
use crate::node::NodeRecord;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// 单个节点的探测结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    /// 连接成功，附带建立连接耗时（毫秒）
    Reachable { latency_ms: f64 },
    /// 超时、拒绝、解析失败或其他任何错误
    Unreachable,
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Reachable { latency_ms } => Some(*latency_ms),
            ProbeOutcome::Unreachable => None,
        }
    }
}

/// 探测目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

impl ProbeTarget {
    /// 从节点记录提取探测目标，缺少 `server` 或端口非法时拒绝
    pub fn from_node(node: &NodeRecord) -> Result<Self> {
        let host = node
            .server()
            .ok_or_else(|| Error::InvalidNode(format!("节点 '{}' 缺少 server 字段", node.label())))?;
        let port = node
            .port()
            .ok_or_else(|| Error::InvalidNode(format!("节点 '{}' 端口缺失或非法", node.label())))?;
        Ok(Self { host: host.to_string(), port })
    }
}

/// 探测器接口，调度器通过它测试节点
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome;
}

/// 基于TCP连接耗时的探测器
#[derive(Debug, Clone)]
pub struct TcpProber {
    /// 单次连接超时
    pub timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(5) }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        probe(&target.host, target.port, self.timeout).await
    }
}

/// 校验节点后交给探测器；非法节点直接判为不可达，不发起连接
pub async fn probe_node(prober: &dyn Prober, node: &NodeRecord) -> ProbeOutcome {
    match ProbeTarget::from_node(node) {
        Ok(target) => prober.probe(&target).await,
        Err(e) => {
            debug!("{}", e);
            ProbeOutcome::Unreachable
        }
    }
}

/// 测量到 `(host, port)` 的TCP连接耗时
///
/// 所有失败都归为 [`ProbeOutcome::Unreachable`]，错误细节只在debug级别记录。
pub async fn probe(host: &str, port: u16, connect_timeout: Duration) -> ProbeOutcome {
    if host.trim().is_empty() || port == 0 {
        debug!("跳过非法目标 '{}:{}'", host, port);
        return ProbeOutcome::Unreachable;
    }

    match connect_timed(host, port, connect_timeout).await {
        Ok(elapsed) => ProbeOutcome::Reachable { latency_ms: elapsed.as_secs_f64() * 1000.0 },
        Err(e) => {
            debug!("节点 {}:{} 不可达: {}", host, port, e);
            ProbeOutcome::Unreachable
        }
    }
}

async fn connect_timed(host: &str, port: u16, connect_timeout: Duration) -> Result<Duration> {
    let start = Instant::now();
    match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            let elapsed = start.elapsed();
            // 不交换任何数据，立即关闭
            drop(stream);
            Ok(elapsed)
        }
        Ok(Err(e)) => Err(Error::Io(e)),
        Err(_) => Err(Error::Timeout(connect_timeout.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn port_zero_and_empty_host_are_unreachable_without_network() {
        let start = Instant::now();
        assert_eq!(probe("127.0.0.1", 0, Duration::from_secs(5)).await, ProbeOutcome::Unreachable);
        assert_eq!(probe("", 80, Duration::from_secs(5)).await, ProbeOutcome::Unreachable);
        assert_eq!(probe("   ", 80, Duration::from_secs(5)).await, ProbeOutcome::Unreachable);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn local_listener_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let outcome = probe("127.0.0.1", port, Duration::from_secs(2)).await;
        match outcome {
            ProbeOutcome::Reachable { latency_ms } => assert!(latency_ms >= 0.0),
            ProbeOutcome::Unreachable => panic!("expected local listener to be reachable"),
        }
    }

    #[tokio::test]
    async fn closed_local_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert_eq!(probe("127.0.0.1", port, Duration::from_secs(2)).await, ProbeOutcome::Unreachable);
    }

    #[tokio::test]
    async fn test_net_address_times_out_as_unreachable() {
        let start = Instant::now();
        let outcome = probe("192.0.2.1", 9, Duration::from_secs(1)).await;
        assert_eq!(outcome, ProbeOutcome::Unreachable);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn unresolvable_host_is_unreachable() {
        let outcome = probe("nodeping.invalid", 443, Duration::from_secs(2)).await;
        assert_eq!(outcome, ProbeOutcome::Unreachable);
    }

    #[test]
    fn target_from_node_requires_server_and_port() {
        let ok = NodeRecord::new().with("server", "h.example").with("port", 443i64);
        assert_eq!(
            ProbeTarget::from_node(&ok).unwrap(),
            ProbeTarget { host: "h.example".to_string(), port: 443 }
        );
        assert!(matches!(
            ProbeTarget::from_node(&NodeRecord::new().with("port", 443i64)),
            Err(Error::InvalidNode(_))
        ));
        assert!(matches!(
            ProbeTarget::from_node(&NodeRecord::new().with("server", "h").with("port", 0i64)),
            Err(Error::InvalidNode(_))
        ));
    }

    #[tokio::test]
    async fn probe_node_rejects_invalid_record() {
        let prober = TcpProber::new(Duration::from_secs(1));
        let node = NodeRecord::new().with("name", "broken");
        assert_eq!(probe_node(&prober, &node).await, ProbeOutcome::Unreachable);
    }
}
