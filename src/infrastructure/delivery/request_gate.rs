// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::{DeliveryApi, DeliveryError};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// 请求闸门
///
/// 包装任意交付API实现，用全局信号量限制在途请求数，
/// 并可选地用令牌桶限制每秒请求数。分页与版本复查共享同一个闸门。
pub struct RequestGate {
    inner: Arc<dyn DeliveryApi>,
    permits: Arc<Semaphore>,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl RequestGate {
    /// 创建请求闸门
    ///
    /// # 参数
    ///
    /// * `inner` - 被包装的交付API
    /// * `max_in_flight` - 同时在途的最大请求数
    /// * `requests_per_second` - 每秒请求上限，0 表示不限速
    pub fn new(inner: Arc<dyn DeliveryApi>, max_in_flight: usize, requests_per_second: u32) -> Self {
        let limiter =
            NonZeroU32::new(requests_per_second).map(|rps| RateLimiter::direct(Quota::per_second(rps)));
        Self {
            inner,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            limiter,
        }
    }

    /// 当前可用的许可数
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl DeliveryApi for RequestGate {
    async fn request(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, DeliveryError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| DeliveryError::Transport("request gate closed".to_string()))?;

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        self.inner.request(path, query).await
    }
}
