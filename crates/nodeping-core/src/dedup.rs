use crate::fingerprint::fingerprint;
use crate::node::NodeRecord;
use std::collections::HashSet;
use tracing::info;

/// 去重结果
#[derive(Debug, Clone, Default)]
pub struct Deduped {
    /// 保留的节点，保持首次出现的顺序
    pub nodes: Vec<NodeRecord>,
    /// 被移除的重复节点数
    pub duplicates: usize,
}

/// 按指纹去重，首次出现的节点胜出
pub fn dedupe(nodes: Vec<NodeRecord>) -> Deduped {
    let mut seen = HashSet::with_capacity(nodes.len());
    let mut kept = Vec::with_capacity(nodes.len());
    let mut duplicates = 0;

    for node in nodes {
        if seen.insert(fingerprint(&node)) {
            kept.push(node);
        } else {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        info!("移除了 {} 个重复的节点", duplicates);
    }

    Deduped { nodes: kept, duplicates }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(server: &str, port: i64, name: &str) -> NodeRecord {
        NodeRecord::new()
            .with("server", server)
            .with("port", port)
            .with("name", name)
    }

    #[test]
    fn same_server_port_different_name_collapses_to_first() {
        let result = dedupe(vec![node("10.0.0.1", 9999, "A"), node("10.0.0.1", 9999, "B")]);
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].name(), Some("A"));
        assert_eq!(result.duplicates, 1);
    }

    #[test]
    fn preserves_first_seen_order() {
        let input = vec![
            node("c", 3, "c"),
            node("a", 1, "a"),
            node("c", 3, "c-dup"),
            node("b", 2, "b"),
            node("a", 1, "a-dup"),
        ];
        let result = dedupe(input);
        let names: Vec<_> = result.nodes.iter().filter_map(|n| n.name()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(result.duplicates, 2);
    }

    #[test]
    fn idempotent_and_never_grows() {
        let input = vec![
            node("a", 1, "x"),
            node("a", 1, "y"),
            NodeRecord::new(),
            NodeRecord::new().with("name", "empty"),
            node("b", 1, "z"),
        ];
        let once = dedupe(input.clone());
        assert!(once.nodes.len() <= input.len());
        let twice = dedupe(once.nodes.clone());
        assert_eq!(twice.nodes, once.nodes);
        assert_eq!(twice.duplicates, 0);
    }

    #[test]
    fn malformed_records_dedupe_by_degenerate_key() {
        let result = dedupe(vec![
            NodeRecord::new().with("name", "a"),
            NodeRecord::new().with("tag", "b"),
        ]);
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.duplicates, 1);
    }

    #[test]
    fn empty_input() {
        let result = dedupe(Vec::new());
        assert!(result.nodes.is_empty());
        assert_eq!(result.duplicates, 0);
    }
}
