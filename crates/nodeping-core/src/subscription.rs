//! 订阅内容的获取与解析

use crate::error::{Error, Result};
use crate::node::NodeRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// GitHub Gist 原始内容域名
pub const GIST_HOST: &str = "gist.githubusercontent.com";

/// 检查URL是否是GitHub Gist的URL
pub fn is_gist_url(url: &str) -> bool {
    url.contains(GIST_HOST)
}

/// 下载订阅内容
pub async fn fetch_subscription(client: &reqwest::Client, url: &str) -> Result<String> {
    info!("开始下载订阅内容: {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        error!("下载订阅内容时出错: HTTP {}", status);
        return Err(Error::Request(format!("HTTP状态码错误: {}", status)));
    }
    let body = response.text().await?;
    info!("订阅内容下载成功 ({} 字节)", body.len());
    Ok(body)
}

/// 解析订阅YAML，返回 `proxies` 下的节点
///
/// 空文档或缺少 `proxies` 时返回空列表；非映射的条目会被跳过。
pub fn parse_subscription(content: &str) -> Result<Vec<NodeRecord>> {
    if content.trim().is_empty() {
        warn!("解析后的内容为空，可能是YAML格式问题或内容为空。");
        return Ok(Vec::new());
    }

    let document: serde_yaml::Value = match serde_yaml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            error!("解析YAML订阅内容时出错: {}", e);
            error!("问题内容片段（前200个字符）:\n{}...", snippet(content, 200));
            return Err(e.into());
        }
    };

    if document.is_null() {
        warn!("解析后的内容为空，可能是YAML格式问题或内容为空。");
        return Ok(Vec::new());
    }

    let proxies = match document.get("proxies") {
        Some(serde_yaml::Value::Sequence(seq)) if !seq.is_empty() => seq.clone(),
        Some(serde_yaml::Value::Sequence(_)) | Some(serde_yaml::Value::Null) | None => {
            warn!("没有找到'proxies'字段，可能是配置格式问题或没有代理节点。");
            return Ok(Vec::new());
        }
        Some(_) => {
            return Err(Error::Subscription("'proxies' 字段不是列表".to_string()));
        }
    };

    let mut nodes = Vec::with_capacity(proxies.len());
    for (i, entry) in proxies.into_iter().enumerate() {
        match NodeRecord::from_yaml(entry) {
            Some(node) => nodes.push(node),
            None => warn!("跳过第 {} 个节点：不是键值映射", i + 1),
        }
    }
    Ok(nodes)
}

fn snippet(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// 节点来源
#[async_trait]
pub trait NodeSource: Send + Sync {
    /// 来源描述，用于日志
    fn describe(&self) -> String;

    /// 读取并解析节点
    async fn load(&self) -> Result<Vec<NodeRecord>>;
}

/// 通过HTTP下载订阅
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// 创建HTTP来源；`gist_only` 为真时只接受GitHub Gist链接
    pub fn new(url: impl Into<String>, gist_only: bool, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if gist_only && !is_gist_url(&url) {
            return Err(Error::Subscription("仅支持GitHub Gist的URL".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl NodeSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn load(&self) -> Result<Vec<NodeRecord>> {
        let content = fetch_subscription(&self.client, &self.url).await?;
        parse_subscription(&content)
    }
}

/// 从本地YAML文件读取
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NodeSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<NodeRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        parse_subscription(&content)
    }
}
