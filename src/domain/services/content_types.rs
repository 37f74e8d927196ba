// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::{DeliveryApi, DeliveryError};
use crate::domain::models::entry::ContentTypeId;
use crate::domain::services::progress::ProgressReporter;
use crate::domain::services::request_retry::request_with_retry;
use crate::domain::services::rte_detector::RteDetector;
use crate::utils::retry_policy::RetryPolicy;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 内容类型
#[derive(Debug, Clone)]
pub struct ContentType {
    pub id: ContentTypeId,
    pub title: Option<String>,
    /// 由 schema 推导出的富文本检测器
    pub detector: RteDetector,
}

impl ContentType {
    /// 进度消息中使用的名称，标题与 uid 不同时两者都显示
    pub fn display_name(&self) -> String {
        match self.title.as_deref() {
            Some(title) if title != self.id.as_str() => format!("{} [{}]", title, self.id),
            _ => self.id.to_string(),
        }
    }

    fn from_payload(payload: &Value) -> Option<Self> {
        let uid = payload["uid"].as_str()?;
        let schema = payload["schema"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        Some(Self {
            id: ContentTypeId::new(uid),
            title: payload["title"].as_str().map(str::to_string),
            detector: RteDetector::from_schema(schema),
        })
    }
}

/// 内容类型枚举器
///
/// 分页读取 `/v3/content_types`，直到达到服务端报告的总数或遇到空页。
pub struct ContentTypeEnumerator {
    api: Arc<dyn DeliveryApi>,
    policy: RetryPolicy,
    page_size: u32,
    progress: ProgressReporter,
}

impl ContentTypeEnumerator {
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

    /// 列出stack中的所有内容类型
    ///
    /// 任何一页失败都会使整个枚举失败，缺少内容类型的审计结果没有意义。
    pub async fn list_content_types(&self) -> Result<Vec<ContentType>, DeliveryError> {
        let mut content_types = Vec::new();
        let mut skip: u64 = 0;

        loop {
            let query = [
                ("include_count", "true".to_string()),
                ("skip", skip.to_string()),
                ("limit", self.page_size.to_string()),
            ];
            let body = request_with_retry(
                self.api.as_ref(),
                "/v3/content_types",
                &query,
                &self.policy,
                &self.progress,
                "content types",
            )
            .await?;

            let page = body["content_types"].as_array().ok_or_else(|| {
                DeliveryError::Decode("content_types missing from response".to_string())
            })?;
            let total = body["count"].as_u64();
            debug!(
                "Fetched {} content types at skip {} (total {:?})",
                page.len(),
                skip,
                total
            );

            if page.is_empty() {
                break;
            }

            content_types.extend(page.iter().filter_map(ContentType::from_payload));
            skip += page.len() as u64;

            match total {
                Some(total) if skip >= total => break,
                None if (page.len() as u64) < u64::from(self.page_size) => break,
                _ => {}
            }
        }

        Ok(content_types)
    }
}
