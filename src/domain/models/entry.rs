// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// 内容类型标识符，在同一个stack内唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTypeId(String);

impl ContentTypeId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentTypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 语言代码（例如 "en-us"），按stack配置
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 单个已获取条目的检查记录
///
/// 每个条目处理时临时产生，只有受影响的条目才会转化为 [`AffectedEntry`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub entry_id: String,
    pub content_type_id: ContentTypeId,
    pub locale: Locale,
    pub version: u64,
    pub rte_is_null: bool,
}

impl EntryRecord {
    /// 受影响时对应的规范元组
    pub fn affected_at(&self, version: u64) -> AffectedEntry {
        AffectedEntry {
            entry_id: self.entry_id.clone(),
            content_type_id: self.content_type_id.clone(),
            locale: self.locale.clone(),
            version,
        }
    }
}

/// 受影响条目
///
/// 规范元组，创建后不可变；相等性由全部四个字段决定。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AffectedEntry {
    pub entry_id: String,
    pub content_type_id: ContentTypeId,
    pub locale: Locale,
    pub version: u64,
}

impl fmt::Display for AffectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} - {}",
            self.entry_id, self.content_type_id, self.locale, self.version
        )
    }
}

/// 受影响条目集合
///
/// 在完整元组上保证唯一，不保证迭代顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(HashSet<AffectedEntry>);

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入条目，已存在时返回 false
    pub fn insert(&mut self, entry: AffectedEntry) -> bool {
        self.0.insert(entry)
    }

    pub fn contains(&self, entry: &AffectedEntry) -> bool {
        self.0.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AffectedEntry> {
        self.0.iter()
    }

    /// 按 (条目, 内容类型, 语言, 版本) 排序后的列表，便于展示
    pub fn to_sorted_vec(&self) -> Vec<AffectedEntry> {
        let mut entries: Vec<AffectedEntry> = self.0.iter().cloned().collect();
        entries.sort();
        entries
    }
}

impl FromIterator<AffectedEntry> for ResultSet {
    fn from_iter<I: IntoIterator<Item = AffectedEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ResultSet {
    type Item = AffectedEntry;
    type IntoIter = std::collections::hash_set::IntoIter<AffectedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
