// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::{DeliveryApi, DeliveryError};
use crate::domain::services::progress::ProgressReporter;
use crate::utils::retry_policy::RetryPolicy;
use metrics::counter;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// 带退避重试的单次交付API请求
///
/// 限流与网络错误按策略重试，重试次数与累计等待时间都有上限；
/// 每次退避都会通过进度报告器通知调用方。耗尽后返回最后一次的错误。
pub async fn request_with_retry(
    api: &dyn DeliveryApi,
    path: &str,
    query: &[(&'static str, String)],
    policy: &RetryPolicy,
    progress: &ProgressReporter,
    context: &str,
) -> Result<Value, DeliveryError> {
    let mut attempt: u32 = 0;
    let mut waited = Duration::ZERO;

    loop {
        let err = match api.request(path, query).await {
            Ok(body) => return Ok(body),
            Err(err) => err,
        };

        let Some(delay) = policy.backoff_for(&err, attempt + 1) else {
            debug!("{}: non-retryable error: {}", context, err);
            return Err(err);
        };

        if !policy.should_retry(attempt) || waited + delay > policy.max_total_wait {
            warn!(
                "{}: giving up after {} retries ({} ms waited): {}",
                context,
                attempt,
                waited.as_millis(),
                err
            );
            return Err(err);
        }

        attempt += 1;
        waited += delay;

        match &err {
            DeliveryError::RateLimited { .. } => {
                counter!("rtescan_rate_limited_total").increment(1);
                progress.report(format!(
                    "{}: rate limited, backing off {} ms (retry {}/{})",
                    context,
                    delay.as_millis(),
                    attempt,
                    policy.max_retries
                ));
            }
            other => {
                progress.report(format!(
                    "{}: {}, backing off {} ms (retry {}/{})",
                    context,
                    other,
                    delay.as_millis(),
                    attempt,
                    policy.max_retries
                ));
            }
        }

        tokio::time::sleep(delay).await;
    }
}
