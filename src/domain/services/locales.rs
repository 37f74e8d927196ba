// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::{DeliveryApi, DeliveryError};
use crate::domain::models::entry::Locale;
use crate::domain::services::progress::ProgressReporter;
use crate::domain::services::request_retry::request_with_retry;
use crate::utils::retry_policy::RetryPolicy;
use std::sync::Arc;

/// 语言解析器
pub struct LocaleResolver {
    api: Arc<dyn DeliveryApi>,
    policy: RetryPolicy,
    default_locale: Locale,
    progress: ProgressReporter,
}

impl LocaleResolver {
    pub fn new(
        api: Arc<dyn DeliveryApi>,
        policy: RetryPolicy,
        default_locale: Locale,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            api,
            policy,
            default_locale,
            progress,
        }
    }

    /// 列出stack配置的所有语言
    ///
    /// stack 未报告任何语言时回退到配置的主语言，并通过进度消息告知调用方。
    pub async fn list_locales(&self) -> Result<Vec<Locale>, DeliveryError> {
        let body = request_with_retry(
            self.api.as_ref(),
            "/v3/locales",
            &[("include_count", "true".to_string())],
            &self.policy,
            &self.progress,
            "locales",
        )
        .await?;

        let listed = body["locales"]
            .as_array()
            .ok_or_else(|| DeliveryError::Decode("locales missing from response".to_string()))?;

        let mut locales: Vec<Locale> = Vec::with_capacity(listed.len());
        for code in listed.iter().filter_map(|l| l["code"].as_str()) {
            let locale = Locale::new(code);
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }

        if locales.is_empty() {
            self.progress.report(format!(
                "Stack reported no locales, falling back to master locale '{}'",
                self.default_locale
            ));
            locales.push(self.default_locale.clone());
        }

        Ok(locales)
    }
}
