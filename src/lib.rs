//! NodePing - proxy subscription dedup and TCP latency ranking
//!
//! This library re-exports the core engine and, with the `ui` feature, the console helpers.

// 重导出core库
pub use nodeping_core::{
    aggregate, check_nodes, check_nodes_tcp, dedupe, fingerprint, format_elapsed, format_node,
    init_logger, is_gist_url, parse_subscription, probe, render_nodes, save_nodes, CheckReport,
    Config, Error, FileSink, FileSource, HttpSource, LogProgress, NoProgress, NodeRecord,
    NodeSource, NodeValue, ProbeOutcome, ProbeTarget, Prober, Progress, ProgressSink, Result,
    ResultSets, ResultSink, Scheduler, SchedulerOptions, TcpProber,
};

// 可选的命令行界面
#[cfg(feature = "ui")]
pub mod ui;
