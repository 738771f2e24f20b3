use std::io;

/// Error type for NodePing operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO操作错误
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// 配置错误
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// 节点缺少探测所需字段
    #[error("Invalid node: {0}")]
    InvalidNode(String),
    /// 连接超时
    #[error("Connection timed out after {0}ms")]
    Timeout(u64),
    /// 连接错误
    #[error("Connection error: {0}")]
    Connection(String),
    /// 请求错误
    #[error("Request failed: {0}")]
    Request(String),
    /// 订阅内容错误
    #[error("Subscription error: {0}")]
    Subscription(String),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for NodePing operations
pub type Result<T> = std::result::Result<T, Error>;

/// 从reqwest错误转换
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Request(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Error::Connection(err.to_string())
        } else {
            Error::Request(err.to_string())
        }
    }
}

/// 从yaml错误转换
impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// 从toml错误转换
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// 从toml序列化错误转换
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
