// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;
use std::fmt;

/// 字段路径中的一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// 进入对象的指定字段
    Field(String),
    /// 展开数组（multiple 的组或全局字段）
    Each,
    /// 在模块块数组中选择指定类型的块
    Block(String),
}

/// 富文本字段在条目中的路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtePath {
    steps: Vec<PathStep>,
}

impl RtePath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// 顶层字段路径
    pub fn field(uid: impl Into<String>) -> Self {
        Self::new(vec![PathStep::Field(uid.into())])
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// 条目在该路径上是否存在值为 null 的字段
    pub fn resolves_to_null(&self, entry: &Value) -> bool {
        has_null_at(entry, &self.steps)
    }
}

impl fmt::Display for RtePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Field(uid) if i == 0 => write!(f, "{}", uid)?,
                PathStep::Field(uid) => write!(f, ".{}", uid)?,
                PathStep::Each => write!(f, "[]")?,
                PathStep::Block(uid) => write!(f, "[{}]", uid)?,
            }
        }
        Ok(())
    }
}

fn has_null_at(value: &Value, steps: &[PathStep]) -> bool {
    let Some((step, rest)) = steps.split_first() else {
        return false;
    };

    match step {
        PathStep::Field(uid) => match value.as_object().and_then(|obj| obj.get(uid)) {
            // 字段缺失说明该条目没有这个字段，不算问题
            None => false,
            Some(child) if rest.is_empty() => child.is_null(),
            Some(child) => has_null_at(child, rest),
        },
        PathStep::Each => match value {
            Value::Array(items) => items.iter().any(|item| has_null_at(item, rest)),
            other => has_null_at(other, rest),
        },
        PathStep::Block(uid) => match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get(uid))
                .any(|block| has_null_at(block, rest)),
            _ => false,
        },
    }
}

/// 富文本 null 检测器
///
/// 路径由内容类型的 schema 推导：JSON RTE、HTML RTE，以及嵌套在
/// 组、全局字段和模块块中的富文本字段。纯函数，无 I/O。
#[derive(Debug, Clone, Default)]
pub struct RteDetector {
    paths: Vec<RtePath>,
}

impl RteDetector {
    pub fn new(paths: Vec<RtePath>) -> Self {
        Self { paths }
    }

    /// 从内容类型 schema 推导富文本字段路径
    pub fn from_schema(schema: &[Value]) -> Self {
        let mut paths = Vec::new();
        collect_paths(schema, &mut Vec::new(), &mut paths);
        Self { paths }
    }

    pub fn paths(&self) -> &[RtePath] {
        &self.paths
    }

    /// schema 中没有任何富文本字段
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// 任一富文本字段存在且值为 null 时返回 true
    ///
    /// 字段缺失、空字符串、空对象都不会被标记。
    pub fn is_rte_null(&self, entry: &Value) -> bool {
        self.paths.iter().any(|path| path.resolves_to_null(entry))
    }
}

fn is_rich_text(field: &Value) -> bool {
    let metadata = &field["field_metadata"];
    match field["data_type"].as_str() {
        Some("json") => metadata["allow_json_rte"].as_bool().unwrap_or(false),
        Some("text") => metadata["allow_rich_text"].as_bool().unwrap_or(false),
        _ => false,
    }
}

fn collect_paths(fields: &[Value], prefix: &mut Vec<PathStep>, out: &mut Vec<RtePath>) {
    for field in fields {
        let Some(uid) = field["uid"].as_str() else {
            continue;
        };

        if is_rich_text(field) {
            let mut steps = prefix.clone();
            steps.push(PathStep::Field(uid.to_string()));
            out.push(RtePath::new(steps));
            continue;
        }

        match field["data_type"].as_str() {
            Some("group") | Some("global_field") => {
                let Some(nested) = field["schema"].as_array() else {
                    continue;
                };
                let depth = prefix.len();
                prefix.push(PathStep::Field(uid.to_string()));
                if field["multiple"].as_bool().unwrap_or(false) {
                    prefix.push(PathStep::Each);
                }
                collect_paths(nested, prefix, out);
                prefix.truncate(depth);
            }
            Some("blocks") => {
                let Some(blocks) = field["blocks"].as_array() else {
                    continue;
                };
                for block in blocks {
                    let (Some(block_uid), Some(nested)) =
                        (block["uid"].as_str(), block["schema"].as_array())
                    else {
                        continue;
                    };
                    let depth = prefix.len();
                    prefix.push(PathStep::Field(uid.to_string()));
                    prefix.push(PathStep::Block(block_uid.to_string()));
                    collect_paths(nested, prefix, out);
                    prefix.truncate(depth);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "rte_detector_test.rs"]
mod tests;
