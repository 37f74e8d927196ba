// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::{DeliveryApi, DeliveryError};
use crate::domain::models::scan::ScanConfig;
use async_trait::async_trait;
use metrics::counter;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// 内容交付API客户端
///
/// 基于reqwest实现，绑定到单个 (区域, stack, 分支, 环境)。
/// 认证头在构造时写入默认请求头，环境作为查询参数附加到每个请求。
pub struct CdaClient {
    http: reqwest::Client,
    base_url: Url,
    environment: String,
}

impl CdaClient {
    /// 按区域主机创建客户端
    pub fn new(config: &ScanConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        Self::with_base_url(config, &config.region.base_url(), timeout)
    }

    /// 使用自定义主机创建客户端（代理或测试服务器）
    pub fn with_base_url(
        config: &ScanConfig,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| DeliveryError::Transport(format!("Invalid base url {}: {}", base_url, e)))?;
        // 请求路径按相对路径拼接，主机地址中的路径前缀需以 `/` 结尾才会保留
        if !base_url.path().ends_with('/') {
            let prefixed = format!("{}/", base_url.path());
            base_url.set_path(&prefixed);
        }

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "api_key", &config.api_key)?;
        insert_header(&mut headers, "access_token", &config.access_token)?;
        if !config.branch_name.trim().is_empty() {
            insert_header(&mut headers, "branch", config.branch_name.trim())?;
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("rtescan/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            environment: config.environment.clone(),
        })
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), DeliveryError> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| DeliveryError::Transport(format!("Invalid characters in {}", name)))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

/// 解析 Retry-After 头（秒数）
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

#[async_trait]
impl DeliveryApi for CdaClient {
    async fn request(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, DeliveryError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| DeliveryError::Transport(format!("Invalid path {}: {}", path, e)))?;

        counter!("rtescan_requests_total").increment(1);
        let start = Instant::now();
        let response = self
            .http
            .get(url)
            .query(&[("environment", self.environment.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        debug!(
            "GET {} -> {} in {} ms",
            path,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        match status {
            s if s.is_success() => response.json::<Value>().await.map_err(DeliveryError::from),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::PRECONDITION_FAILED => {
                Err(DeliveryError::Auth {
                    status: status.as_u16(),
                })
            }
            StatusCode::NOT_FOUND => Err(DeliveryError::NotFound(path.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(DeliveryError::RateLimited {
                retry_after: retry_after(response.headers()),
            }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(DeliveryError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "cda_client_test.rs"]
mod tests;
