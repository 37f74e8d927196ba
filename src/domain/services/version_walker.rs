// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::{DeliveryApi, DeliveryError};
use crate::domain::models::entry::EntryRecord;
use crate::domain::services::progress::ProgressReporter;
use crate::domain::services::request_retry::request_with_retry;
use crate::domain::services::rte_detector::RteDetector;
use crate::utils::errors::PairError;
use crate::utils::retry_policy::RetryPolicy;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

/// 历史版本的检测结果
#[derive(Debug, Default)]
pub struct HistoryWalk {
    /// 富文本为 null 的历史版本，升序
    pub null_versions: Vec<u64>,
    /// 重试后仍无法获取的版本
    pub unresolved: Vec<(u64, PairError)>,
}

/// 版本遍历器
///
/// 富文本是否为 null 在版本历史上并不单调，每个历史版本都要单独获取并检测。
pub struct VersionWalker {
    api: Arc<dyn DeliveryApi>,
    policy: RetryPolicy,
    progress: ProgressReporter,
}

impl VersionWalker {
    pub fn new(api: Arc<dyn DeliveryApi>, policy: RetryPolicy, progress: ProgressReporter) -> Self {
        Self {
            api,
            policy,
            progress,
        }
    }

    /// 条目的全部版本号，`latest` 为最新版本
    pub fn list_versions(latest: u64) -> Vec<u64> {
        (1..=latest.max(1)).collect()
    }

    /// 获取条目指定版本并检测富文本字段
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(true))` - 该版本富文本为 null
    /// * `Ok(Some(false))` - 该版本正常
    /// * `Ok(None)` - 交付API不再提供该版本
    pub async fn check_version(
        &self,
        record: &EntryRecord,
        version: u64,
        detector: &RteDetector,
    ) -> Result<Option<bool>, PairError> {
        let path = format!(
            "/v3/content_types/{}/entries/{}",
            record.content_type_id, record.entry_id
        );
        let query = [
            ("locale", record.locale.to_string()),
            ("version", version.to_string()),
        ];
        let context = format!(
            "{} ({}) entry {} v{}",
            record.content_type_id, record.locale, record.entry_id, version
        );

        let body = match request_with_retry(
            self.api.as_ref(),
            &path,
            &query,
            &self.policy,
            &self.progress,
            &context,
        )
        .await
        {
            Ok(body) => body,
            Err(DeliveryError::NotFound(_)) => {
                debug!("{}: version not served, skipping", context);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let entry = body.get("entry").ok_or_else(|| {
            PairError::Rejected(DeliveryError::Decode(format!(
                "{}: entry missing from response",
                context
            )))
        })?;

        Ok(Some(detector.is_rte_null(entry)))
    }

    /// 逐个检测条目的历史版本
    ///
    /// 最新版本已由分页结果判定，不会重新获取。单个版本失败不影响其余版本，
    /// 失败的版本与错误一并返回，由调用方决定如何处理。
    pub async fn walk_history(&self, record: &EntryRecord, detector: &RteDetector) -> HistoryWalk {
        let history: Vec<u64> = Self::list_versions(record.version)
            .into_iter()
            .filter(|v| *v != record.version)
            .collect();

        let checks = history.iter().map(|&version| async move {
            (version, self.check_version(record, version, detector).await)
        });

        let mut walk = HistoryWalk::default();
        for (version, verdict) in join_all(checks).await {
            match verdict {
                Ok(Some(true)) => walk.null_versions.push(version),
                Ok(_) => {}
                Err(err) => walk.unresolved.push((version, err)),
            }
        }
        walk
    }

    /// 条目在哪些版本上富文本为 null
    ///
    /// 任一历史版本无法获取时返回该错误。
    pub async fn affected_versions(
        &self,
        record: &EntryRecord,
        detector: &RteDetector,
    ) -> Result<Vec<u64>, PairError> {
        let walk = self.walk_history(record, detector).await;
        if let Some((_, err)) = walk.unresolved.into_iter().next() {
            return Err(err);
        }

        let mut versions = walk.null_versions;
        if record.rte_is_null {
            versions.push(record.version);
        }
        versions.sort_unstable();
        Ok(versions)
    }
}
