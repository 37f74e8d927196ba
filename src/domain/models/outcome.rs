// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entry::{ContentTypeId, Locale, ResultSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 扫描最终状态
///
/// 致命错误（认证失败、枚举失败）不会产生结果，而是以错误形式返回。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// 所有 (内容类型, 语言) 组合均已完成
    Completed,
    /// 至少一个组合耗尽重试预算或因取消而未完成
    PartiallyFailed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanStatus::Completed => write!(f, "completed"),
            ScanStatus::PartiallyFailed => write!(f, "partially_failed"),
        }
    }
}

/// 被跳过的 (内容类型, 语言) 组合
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailedPair {
    pub content_type_id: ContentTypeId,
    pub locale: Locale,
    /// 失败原因
    pub reason: String,
}

/// 扫描结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// 受影响条目
    pub affected: ResultSet,
    /// 未能完成的组合
    pub failed_pairs: Vec<FailedPair>,
    /// 最终状态
    pub status: ScanStatus,
    /// 调用方是否中途取消
    pub cancelled: bool,
    /// 扫描宇宙中的内容类型数量
    pub content_types_scanned: usize,
    /// 扫描宇宙中的语言
    pub locales: Vec<Locale>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanOutcome {
    /// 某个组合是否被记录为失败
    pub fn has_failed(&self, content_type_id: &ContentTypeId, locale: &Locale) -> bool {
        self.failed_pairs
            .iter()
            .any(|p| &p.content_type_id == content_type_id && &p.locale == locale)
    }
}
