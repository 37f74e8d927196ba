// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entry::{AffectedEntry, ResultSet};
use dashmap::DashSet;
use metrics::counter;

/// 结果聚合器
///
/// 受影响条目的并发去重集合，唯一性检查是扫描中唯一的同步点。
#[derive(Debug, Default)]
pub struct ResultAggregator {
    seen: DashSet<AffectedEntry>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个受影响条目，重复加入无副作用
    ///
    /// # 返回值
    ///
    /// 首次加入返回 true
    pub fn add(&self, entry: AffectedEntry) -> bool {
        let inserted = self.seen.insert(entry);
        if inserted {
            counter!("rtescan_affected_entries_total").increment(1);
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// 当前累积结果的快照
    pub fn snapshot(&self) -> ResultSet {
        self.seen.iter().map(|e| e.key().clone()).collect()
    }
}
