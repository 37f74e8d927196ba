// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::{DeliveryApi, DeliveryError};
use crate::domain::models::entry::{ContentTypeId, Locale};
use crate::domain::services::progress::ProgressReporter;
use crate::domain::services::request_retry::request_with_retry;
use crate::utils::errors::PairError;
use crate::utils::retry_policy::RetryPolicy;
use futures::stream::{self, Stream, TryStreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 条目分页器
///
/// 以固定页大小按 skip 顺序翻页，第 N 页依赖第 N-1 页完成。
pub struct EntryPaginator {
    api: Arc<dyn DeliveryApi>,
    policy: RetryPolicy,
    page_size: u32,
    progress: ProgressReporter,
}

/// 单个组合的翻页状态
struct PageCursor {
    api: Arc<dyn DeliveryApi>,
    policy: RetryPolicy,
    progress: ProgressReporter,
    path: String,
    context: String,
    locale: String,
    page_size: u32,
    skip: u64,
    done: bool,
}

impl PageCursor {
    async fn next_page(mut self) -> Result<Option<(Vec<Value>, Self)>, PairError> {
        if self.done {
            return Ok(None);
        }

        let query = [
            ("locale", self.locale.clone()),
            ("include_count", "true".to_string()),
            ("skip", self.skip.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        let mut body = request_with_retry(
            self.api.as_ref(),
            &self.path,
            &query,
            &self.policy,
            &self.progress,
            &self.context,
        )
        .await?;

        let total = body["count"].as_u64();
        let entries = match body.get_mut("entries").map(Value::take) {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(PairError::Rejected(DeliveryError::Decode(
                    "entries missing from response".to_string(),
                )))
            }
        };

        debug!(
            "{}: fetched {} entries at skip {} (total {:?})",
            self.context,
            entries.len(),
            self.skip,
            total
        );

        if entries.is_empty() {
            return Ok(None);
        }

        self.skip += entries.len() as u64;
        self.done = match total {
            Some(total) => self.skip >= total,
            // 未报告总数时以短页作为结束标志
            None => (entries.len() as u64) < u64::from(self.page_size),
        };

        Ok(Some((entries, self)))
    }
}

impl EntryPaginator {
    pub fn new(
        api: Arc<dyn DeliveryApi>,
        policy: RetryPolicy,
        page_size: u32,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            api,
            policy,
            page_size,
            progress,
        }
    }

    /// 惰性地逐条产出 (内容类型, 语言) 组合下的原始条目
    ///
    /// 页请求在重试预算内重试；预算耗尽时流以 [`PairError`] 结束。
    pub fn paginate_entries(
        &self,
        content_type: &ContentTypeId,
        locale: &Locale,
    ) -> impl Stream<Item = Result<Value, PairError>> + Send + 'static {
        let cursor = PageCursor {
            api: self.api.clone(),
            policy: self.policy.clone(),
            progress: self.progress.clone(),
            path: format!("/v3/content_types/{}/entries", content_type),
            context: format!("{} ({})", content_type, locale),
            locale: locale.to_string(),
            page_size: self.page_size,
            skip: 0,
            done: false,
        };

        stream::try_unfold(cursor, PageCursor::next_page)
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<Value, PairError>)))
            .try_flatten()
    }
}
