//! NodePing CLI - Command Line Interface for NodePing subscription checks
//!
//! This library holds the argument definitions and maps them onto the core `Config`.

use clap::Parser;
use nodeping_core::Config;
use std::path::PathBuf;

/// 命令行参数
#[derive(Debug, Clone, Parser)]
#[command(name = "nodeping-cli", version, about = "Deduplicate a proxy subscription and rank nodes by TCP latency")]
pub struct Cli {
    /// 订阅链接
    #[arg(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// 本地订阅YAML文件
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// 配置文件路径
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// 最大并发测试数
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// 单个节点连接超时（毫秒）
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// 可用节点输出文件
    #[arg(long)]
    pub reachable_out: Option<String>,

    /// 超时节点输出文件
    #[arg(long)]
    pub unreachable_out: Option<String>,

    /// 允许非GitHub Gist链接
    #[arg(long)]
    pub allow_any_host: bool,

    /// 不显示横幅
    #[arg(long)]
    pub no_banner: bool,
}

/// 节点来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceArg {
    Url(String),
    File(PathBuf),
}

impl Cli {
    /// 用命令行参数覆盖配置文件中的值
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(path) = &self.reachable_out {
            config.output.reachable_file = path.clone();
        }
        if let Some(path) = &self.unreachable_out {
            config.output.unreachable_file = path.clone();
        }
        if self.allow_any_host {
            config.subscription.gist_only = false;
        }
        if let Some(url) = &self.url {
            config.subscription.url = Some(url.clone());
        }
        config
    }

    /// 决定节点来源：本地文件优先，其次是链接（参数或配置）
    pub fn source(&self, config: &Config) -> Option<SourceArg> {
        if let Some(file) = &self.file {
            return Some(SourceArg::File(file.clone()));
        }
        config.subscription.url.clone().map(SourceArg::Url)
    }
}
