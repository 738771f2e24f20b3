use crate::node::NodeRecord;
use std::fmt;

/// 不参与节点身份比较的展示字段
pub const COSMETIC_FIELDS: &[&str] = &["name", "remarks", "group", "ps", "tag"];

/// 节点指纹，相等即视为同一节点
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 计算节点指纹
///
/// 去掉展示字段后按字段名字节序排序，渲染为 `key:value` 并以 `,` 连接。
/// 字段声明顺序和展示字段的差异不影响结果。
pub fn fingerprint(node: &NodeRecord) -> Fingerprint {
    let mut fields: Vec<_> = node
        .iter()
        .filter(|(key, _)| !COSMETIC_FIELDS.contains(key))
        .collect();
    fields.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let key = fields
        .iter()
        .map(|(k, v)| format!("{}:{}", k, v.canonical()))
        .collect::<Vec<_>>()
        .join(",");
    Fingerprint(key)
}
