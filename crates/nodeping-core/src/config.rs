use crate::error::{Error, Result};
use crate::progress::ProgressCadence;
use crate::scheduler::SchedulerOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 最大并发测试数
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// 单个节点连接超时（毫秒）
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// 超过该秒数仍未完成时提示一次
    #[serde(default = "default_notice_after_secs")]
    pub notice_after_secs: u64,
    /// 进度通知最小间隔（毫秒）
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// 订阅设置
    #[serde(default)]
    pub subscription: SubscriptionSettings,
    /// 输出设置
    #[serde(default)]
    pub output: OutputSettings,
}

fn default_concurrency() -> usize { 20 }
fn default_timeout_ms() -> u64 { 5000 }
fn default_notice_after_secs() -> u64 { 10 }
fn default_progress_interval_ms() -> u64 { 1000 }

/// 订阅设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    /// 订阅链接（可选）
    #[serde(default)]
    pub url: Option<String>,
    /// 是否只接受GitHub Gist链接
    #[serde(default = "default_gist_only")]
    pub gist_only: bool,
    /// 下载超时（秒）
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_gist_only() -> bool { true }
fn default_fetch_timeout_secs() -> u64 { 5 }

/// 输出设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// 可用节点文件
    #[serde(default = "default_reachable_file")]
    pub reachable_file: String,
    /// 超时节点文件
    #[serde(default = "default_unreachable_file")]
    pub unreachable_file: String,
}

fn default_reachable_file() -> String { "normal_links.txt".to_string() }
fn default_unreachable_file() -> String { "timeout_links.txt".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_ms: default_timeout_ms(),
            notice_after_secs: default_notice_after_secs(),
            progress_interval_ms: default_progress_interval_ms(),
            subscription: SubscriptionSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            url: None,
            gist_only: default_gist_only(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            reachable_file: default_reachable_file(),
            unreachable_file: default_unreachable_file(),
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("无法读取配置文件: {}", e);
                return Err(Error::Configuration(format!("无法读取配置文件: {}", e)));
            }
        };

        let config = match toml::from_str::<Self>(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("配置文件格式错误: {}", e);
                warn!("尝试使用更宽松的解析方式...");
                Self::parse_with_fallbacks(&content)?
            }
        };
        config.validate()?;
        info!("成功读取配置: 并发 {}，超时 {}ms", config.concurrency, config.timeout_ms);
        Ok(config)
    }

    /// 逐个字段解析，类型不对的字段使用默认值
    fn parse_with_fallbacks(content: &str) -> Result<Self> {
        let table = content.parse::<toml::Table>()?;
        let mut config = Config::default();

        let positive = |key: &str| {
            table.get(key)
                .and_then(|v| v.as_integer())
                .filter(|v| *v > 0)
                .map(|v| v as u64)
        };
        if let Some(v) = positive("concurrency") {
            config.concurrency = v as usize;
        }
        if let Some(v) = positive("timeout_ms") {
            config.timeout_ms = v;
        }
        if let Some(v) = positive("notice_after_secs") {
            config.notice_after_secs = v;
        }
        if let Some(v) = positive("progress_interval_ms") {
            config.progress_interval_ms = v;
        }

        if let Some(sub) = table.get("subscription").and_then(|v| v.as_table()) {
            if let Some(url) = sub.get("url").and_then(|v| v.as_str()) {
                config.subscription.url = Some(url.to_string());
            }
            if let Some(gist_only) = sub.get("gist_only").and_then(|v| v.as_bool()) {
                config.subscription.gist_only = gist_only;
            }
            if let Some(secs) = sub.get("fetch_timeout_secs").and_then(|v| v.as_integer()) {
                if secs > 0 {
                    config.subscription.fetch_timeout_secs = secs as u64;
                }
            }
        }

        if let Some(out) = table.get("output").and_then(|v| v.as_table()) {
            if let Some(file) = out.get("reachable_file").and_then(|v| v.as_str()) {
                config.output.reachable_file = file.to_string();
            }
            if let Some(file) = out.get("unreachable_file").and_then(|v| v.as_str()) {
                config.output.unreachable_file = file.to_string();
            }
        }

        info!("使用宽松解析成功读取配置");
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 校验配置，在开始探测前发现错误
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Configuration("concurrency 必须大于0".to_string()));
        }
        if self.concurrency > Semaphore::MAX_PERMITS {
            return Err(Error::Configuration(format!(
                "concurrency 不能超过 {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Configuration("timeout_ms 必须大于0".to_string()));
        }
        if self.progress_interval_ms == 0 {
            return Err(Error::Configuration("progress_interval_ms 必须大于0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.subscription.fetch_timeout_secs)
    }

    /// 转换为调度选项
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            concurrency: self.concurrency,
            timeout: self.timeout(),
            cadence: ProgressCadence {
                notice_after: Duration::from_secs(self.notice_after_secs),
                interval: Duration::from_millis(self.progress_interval_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("nodeping-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn defaults_match_original_constants() {
        let config = Config::default();
        assert_eq!(config.concurrency, 20);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.output.reachable_file, "normal_links.txt");
        assert_eq!(config.output.unreachable_file, "timeout_links.txt");
        assert!(config.subscription.gist_only);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let config: Config = toml::from_str("concurrency = 8\n[output]\nreachable_file = \"ok.txt\"\n").unwrap();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.output.reachable_file, "ok.txt");
        assert_eq!(config.output.unreachable_file, "timeout_links.txt");
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("roundtrip");
        let mut config = Config::default();
        config.concurrency = 64;
        config.subscription.url = Some("https://gist.githubusercontent.com/x/raw".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.concurrency, 64);
        assert_eq!(loaded.subscription.url, config.subscription.url);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn lenient_parse_skips_bad_fields() {
        let path = temp_path("lenient");
        fs::write(&path, "concurrency = \"many\"\ntimeout_ms = 1500\n").unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.concurrency, 20);
        assert_eq!(loaded.timeout_ms, 1500);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = Config { concurrency: 0, ..Config::default() };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn oversized_concurrency_is_rejected() {
        let config = Config { concurrency: usize::MAX, ..Config::default() };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
        let config = Config { concurrency: Semaphore::MAX_PERMITS, ..Config::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_is_configuration_error() {
        assert!(matches!(
            Config::from_file("/nonexistent/nodeping.toml"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn scheduler_options_follow_config() {
        let config = Config { concurrency: 3, timeout_ms: 250, ..Config::default() };
        let options = config.scheduler_options();
        assert_eq!(options.concurrency, 3);
        assert_eq!(options.timeout, Duration::from_millis(250));
        assert_eq!(options.cadence.notice_after, Duration::from_secs(10));
    }
}
