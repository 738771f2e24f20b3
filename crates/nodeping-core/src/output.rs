//! 节点输出格式
//!
//! 每个文件以 `proxies:` 开头，随后每行一个 `  - {k: v, ...}` 节点，
//! 下游工具依赖这个格式，修改时要保持兼容。

use crate::aggregate::ResultSets;
use crate::error::Result;
use crate::node::{NodeRecord, NodeValue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// 字符串是否需要加引号：空串、含空白或含非字母数字字符
fn needs_quotes(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || !c.is_alphanumeric())
}

fn write_value(value: &NodeValue, out: &mut String) {
    match value {
        NodeValue::Str(s) if needs_quotes(s) => {
            out.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
        NodeValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
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
                write_value(v, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.canonical()),
    }
}

/// 把单个节点格式化为一行
pub fn format_node(node: &NodeRecord) -> String {
    let mut out = String::from("  - {");
    for (i, (key, value)) in node.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(key);
        out.push_str(": ");
        write_value(value, &mut out);
    }
    out.push('}');
    out
}

/// 渲染完整的节点列表文本
pub fn render_nodes(nodes: &[NodeRecord]) -> String {
    let mut out = String::from("proxies:\n");
    for node in nodes {
        out.push_str(&format_node(node));
        out.push('\n');
    }
    out
}

/// 把节点列表写入文件
pub fn save_nodes<P: AsRef<Path>>(nodes: &[NodeRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    match fs::write(path, render_nodes(nodes)) {
        Ok(()) => {
            info!("节点信息已保存到: {}", path.display());
            Ok(())
        }
        Err(e) => {
            error!("保存节点信息时出错: {}", e);
            Err(e.into())
        }
    }
}

/// 结果输出接口
pub trait ResultSink {
    fn persist(&self, sets: &ResultSets) -> Result<()>;
}

/// 把两组节点分别写入文件
#[derive(Debug, Clone)]
pub struct FileSink {
    pub reachable_path: PathBuf,
    pub unreachable_path: PathBuf,
}

impl FileSink {
    pub fn new(reachable_path: impl Into<PathBuf>, unreachable_path: impl Into<PathBuf>) -> Self {
        Self {
            reachable_path: reachable_path.into(),
            unreachable_path: unreachable_path.into(),
        }
    }
}

impl ResultSink for FileSink {
    fn persist(&self, sets: &ResultSets) -> Result<()> {
        save_nodes(&sets.reachable, &self.reachable_path)?;
        save_nodes(&sets.unreachable, &self.unreachable_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_strings_with_spaces_or_symbols() {
        let node = NodeRecord::new()
            .with("name", "HK 01")
            .with("type", "ss")
            .with("server", "1.2.3.4")
            .with("port", 8388i64)
            .with("cipher", "aes-128-gcm")
            .with("udp", true)
            .with("delay", 12.5);
        assert_eq!(
            format_node(&node),
            r#"  - {name: "HK 01", type: ss, server: "1.2.3.4", port: 8388, cipher: "aes-128-gcm", udp: true, delay: 12.5}"#
        );
    }

    #[test]
    fn empty_and_unicode_strings() {
        let node = NodeRecord::new().with("a", "").with("b", "香港").with("c", "say \"hi\"");
        assert_eq!(format_node(&node), r#"  - {a: "", b: 香港, c: "say \"hi\""}"#);
    }

    #[test]
    fn nested_values_use_flow_style() {
        let node = NodeRecord::new().with(
            "ws-opts",
            NodeValue::Map(vec![("path".to_string(), NodeValue::from("/ray"))]),
        );
        assert_eq!(format_node(&node), r#"  - {ws-opts: {path: "/ray"}}"#);
    }

    #[test]
    fn render_has_header_line() {
        let nodes = vec![NodeRecord::new().with("port", 1i64), NodeRecord::new().with("port", 2i64)];
        assert_eq!(render_nodes(&nodes), "proxies:\n  - {port: 1}\n  - {port: 2}\n");
        assert_eq!(render_nodes(&[]), "proxies:\n");
    }

    #[test]
    fn rendered_output_parses_back_as_yaml() {
        let node = NodeRecord::new()
            .with("name", "JP: Tokyo #1")
            .with("server", "jp.example.com")
            .with("port", 443i64)
            .with("tls", false);
        let text = render_nodes(&[node.clone()]);
        let value: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        let parsed = NodeRecord::from_yaml(value["proxies"][0].clone()).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn file_sink_writes_both_files() {
        let dir = std::env::temp_dir().join(format!("nodeping-sink-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let sink = FileSink::new(dir.join("normal.txt"), dir.join("timeout.txt"));
        let sets = ResultSets {
            reachable: vec![NodeRecord::new().with("server", "a")],
            unreachable: Vec::new(),
        };
        sink.persist(&sets).unwrap();
        assert_eq!(fs::read_to_string(dir.join("normal.txt")).unwrap(), "proxies:\n  - {server: a}\n");
        assert_eq!(fs::read_to_string(dir.join("timeout.txt")).unwrap(), "proxies:\n");
        fs::remove_dir_all(&dir).unwrap();
    }
}
