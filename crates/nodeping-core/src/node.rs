//! 节点记录：订阅文档 `proxies` 中的一条代理配置
//!
//! 记录是开放的键值映射，字段顺序与文档中一致。探测只关心 `server` 和 `port`，
//! 其余字段原样保留，用于输出。

use indexmap::IndexMap;
use std::fmt;

/// 探测成功后写入记录的延迟字段
pub const DELAY_FIELD: &str = "delay";

/// 节点字段值
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<NodeValue>),
    Map(Vec<(String, NodeValue)>),
}

impl NodeValue {
    /// 从YAML值转换，标签会被剥离
    pub fn from_yaml(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => NodeValue::Null,
            Value::Bool(b) => NodeValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    NodeValue::Int(i)
                } else {
                    // u64超出i64范围或浮点数
                    NodeValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => NodeValue::Str(s),
            Value::Sequence(seq) => NodeValue::List(seq.into_iter().map(Self::from_yaml).collect()),
            Value::Mapping(map) => NodeValue::Map(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), Self::from_yaml(v)))
                    .collect(),
            ),
            Value::Tagged(tagged) => Self::from_yaml(tagged.value),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NodeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NodeValue::Int(i) => Some(*i as f64),
            NodeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// 规范字符串形式：布尔值小写，数字使用稳定的十进制，字符串原样
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            NodeValue::Null => out.push_str("null"),
            NodeValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            NodeValue::Int(i) => out.push_str(&i.to_string()),
            NodeValue::Float(f) => out.push_str(&format_float(*f)),
            NodeValue::Str(s) => out.push_str(s),
            NodeValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_canonical(out);
                }
                out.push(']');
            }
            NodeValue::Map(entries) => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(k);
                    out.push_str(": ");
                    v.write_canonical(out);
                }
                out.push('}');
            }
        }
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for NodeValue {
    fn from(s: &str) -> Self {
        NodeValue::Str(s.to_string())
    }
}

impl From<String> for NodeValue {
    fn from(s: String) -> Self {
        NodeValue::Str(s)
    }
}

impl From<i64> for NodeValue {
    fn from(i: i64) -> Self {
        NodeValue::Int(i)
    }
}

impl From<f64> for NodeValue {
    fn from(f: f64) -> Self {
        NodeValue::Float(f)
    }
}

impl From<bool> for NodeValue {
    fn from(b: bool) -> Self {
        NodeValue::Bool(b)
    }
}

/// 浮点数格式化：总是带小数点或指数，不会与整数写法相同；非有限值使用YAML写法
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { ".inf".to_string() } else { "-.inf".to_string() }
    } else {
        format!("{:?}", f)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match NodeValue::from_yaml(key) {
        NodeValue::Str(s) => s,
        other => other.canonical(),
    }
}

/// 一条代理节点记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeRecord {
    fields: IndexMap<String, NodeValue>,
}

impl NodeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从YAML映射构建记录；非映射返回 `None`
    pub fn from_yaml(value: serde_yaml::Value) -> Option<Self> {
        match NodeValue::from_yaml(value) {
            NodeValue::Map(entries) => Some(entries.into_iter().collect()),
            _ => None,
        }
    }

    /// 设置字段，已存在的字段保持原有位置
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<NodeValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// 链式构建，方便测试和手工构造
    pub fn with(mut self, key: impl Into<String>, value: impl Into<NodeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&NodeValue> {
        self.fields.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 服务器地址，空字符串视为缺失
    pub fn server(&self) -> Option<&str> {
        self.get("server")
            .and_then(NodeValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// 端口，接受整数或数字字符串，必须在 1..=65535 之间
    pub fn port(&self) -> Option<u16> {
        let raw = match self.get("port")? {
            NodeValue::Int(i) => *i,
            NodeValue::Str(s) => s.trim().parse::<i64>().ok()?,
            NodeValue::Float(f) if f.fract() == 0.0 => *f as i64,
            _ => return None,
        };
        u16::try_from(raw).ok().filter(|p| *p > 0)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(NodeValue::as_str)
    }

    /// 展示用标签：名称或 `server:port`
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!(
                "{}:{}",
                self.get("server").map(NodeValue::canonical).unwrap_or_default(),
                self.get("port").map(NodeValue::canonical).unwrap_or_default()
            ),
        }
    }

    pub fn delay(&self) -> Option<f64> {
        self.get(DELAY_FIELD).and_then(NodeValue::as_f64)
    }

    /// 写入探测延迟（毫秒，保留两位小数）
    pub fn set_delay(&mut self, latency_ms: f64) {
        let rounded = (latency_ms * 100.0).round() / 100.0;
        self.insert(DELAY_FIELD, NodeValue::Float(rounded));
    }

    /// 移除延迟字段，用于不可达的节点
    pub fn clear_delay(&mut self) {
        self.fields.shift_remove(DELAY_FIELD);
    }
}

impl FromIterator<(String, NodeValue)> for NodeRecord {
    fn from_iter<I: IntoIterator<Item = (String, NodeValue)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_accepts_integers_and_numeric_strings() {
        assert_eq!(NodeRecord::new().with("port", 443i64).port(), Some(443));
        assert_eq!(NodeRecord::new().with("port", " 8080 ").port(), Some(8080));
        assert_eq!(NodeRecord::new().with("port", 0i64).port(), None);
        assert_eq!(NodeRecord::new().with("port", -1i64).port(), None);
        assert_eq!(NodeRecord::new().with("port", 70000i64).port(), None);
        assert_eq!(NodeRecord::new().with("port", "abc").port(), None);
        assert_eq!(NodeRecord::new().port(), None);
    }

    #[test]
    fn server_rejects_blank() {
        assert_eq!(NodeRecord::new().with("server", "  ").server(), None);
        assert_eq!(NodeRecord::new().with("server", 1i64).server(), None);
        assert_eq!(NodeRecord::new().with("server", "a.example").server(), Some("a.example"));
    }

    #[test]
    fn set_delay_keeps_field_position_and_rounds() {
        let mut node = NodeRecord::new().with("server", "h").with("delay", 1.0).with("port", 1i64);
        node.set_delay(12.3456);
        let keys: Vec<&str> = node.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["server", "delay", "port"]);
        assert_eq!(node.delay(), Some(12.35));
    }

    #[test]
    fn clear_delay_removes_field_and_keeps_order() {
        let mut node = NodeRecord::new().with("server", "h").with("delay", 12.5).with("port", 1i64);
        node.clear_delay();
        assert_eq!(node.delay(), None);
        let keys: Vec<&str> = node.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["server", "port"]);
        // 没有delay时不做任何事
        node.clear_delay();
        assert_eq!(node.len(), 2);
    }

    #[test]
    fn large_integral_floats_differ_from_integers() {
        assert_eq!(NodeValue::Float(1e16).canonical(), "1e16");
        assert_ne!(
            NodeValue::Float(1e16).canonical(),
            NodeValue::Int(10_000_000_000_000_000).canonical()
        );
        assert_eq!(NodeValue::Float(12.35).canonical(), "12.35");
    }

    #[test]
    fn canonical_rendering() {
        assert_eq!(NodeValue::Bool(true).canonical(), "true");
        assert_eq!(NodeValue::Float(2.0).canonical(), "2.0");
        assert_eq!(NodeValue::Float(0.25).canonical(), "0.25");
        assert_eq!(NodeValue::Float(f64::INFINITY).canonical(), ".inf");
        assert_eq!(NodeValue::Null.canonical(), "null");
        let nested = NodeValue::Map(vec![
            ("path".to_string(), NodeValue::from("/ws")),
            ("hosts".to_string(), NodeValue::List(vec![NodeValue::from("a"), NodeValue::Int(1)])),
        ]);
        assert_eq!(nested.canonical(), "{path: /ws, hosts: [a, 1]}");
    }

    #[test]
    fn from_yaml_keeps_field_order() {
        let value: serde_yaml::Value =
            serde_yaml::from_str("{name: x, type: ss, server: h, port: 1, udp: true}").unwrap();
        let node = NodeRecord::from_yaml(value).unwrap();
        let keys: Vec<&str> = node.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "type", "server", "port", "udp"]);
        assert_eq!(node.get("udp"), Some(&NodeValue::Bool(true)));
    }

    #[test]
    fn from_yaml_rejects_scalars() {
        let value: serde_yaml::Value = serde_yaml::from_str("just a string").unwrap();
        assert!(NodeRecord::from_yaml(value).is_none());
    }
}
