//! NodePing Core - proxy subscription dedup and TCP latency probing (core functionality)
//!
//! This library deduplicates proxy nodes by fingerprint, probes each node's TCP
//! connect latency under a bounded concurrency limit and splits the nodes into
//! reachable (sorted by latency) and unreachable sets.

// 导出模块
pub mod aggregate;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod node;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod scheduler;
pub mod subscription;

// 从模块导出核心类型
pub use aggregate::{aggregate, ResultSets, Summary};
pub use config::{Config, OutputSettings, SubscriptionSettings};
pub use dedup::{dedupe, Deduped};
pub use error::{Error, Result};
pub use fingerprint::{fingerprint, Fingerprint, COSMETIC_FIELDS};
pub use node::{NodeRecord, NodeValue};
pub use output::{format_node, render_nodes, save_nodes, FileSink, ResultSink};
pub use pipeline::{check_nodes, check_nodes_tcp, CheckReport};
pub use probe::{probe, probe_node, ProbeOutcome, ProbeTarget, Prober, TcpProber};
pub use progress::{format_elapsed, LogProgress, NoProgress, Progress, ProgressCadence, ProgressSink};
pub use scheduler::{Scheduler, SchedulerOptions};
pub use subscription::{is_gist_url, parse_subscription, FileSource, HttpSource, NodeSource};

/// Initialize the logger with default settings
///
/// Only binaries call this; the library never installs a global subscriber.
pub fn init_logger() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();
}
