// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::DeliveryError;
use std::time::Duration;

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次请求）
    pub max_retries: u32,
    /// 限流时的初始退避时间（服务端未给出提示时使用）
    pub rate_limit_backoff: Duration,
    /// 网络故障时的初始退避时间
    pub transport_backoff: Duration,
    /// 单次退避上限
    pub max_backoff: Duration,
    /// 同一请求累计等待上限
    pub max_total_wait: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            rate_limit_backoff: Duration::from_secs(1),
            transport_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(30),
            max_total_wait: Duration::from_secs(120),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            enable_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 创建快速重试策略（更短的退避时间，适合测试与本地代理）
    pub fn fast() -> Self {
        Self {
            max_retries: 3,
            rate_limit_backoff: Duration::from_millis(10),
            transport_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(100),
            max_total_wait: Duration::from_secs(1),
            backoff_multiplier: 1.5,
            jitter_factor: 0.0,
            enable_jitter: false,
        }
    }

    /// 计算指数退避时间
    pub fn calculate_backoff(&self, base: Duration, attempt: u32) -> Duration {
        let backoff_secs =
            base.as_secs_f64() * self.backoff_multiplier.powi(attempt.max(1) as i32 - 1);

        // 限制最大退避时间
        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        let final_backoff = if self.enable_jitter && self.jitter_factor > 0.0 {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..=jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 根据错误类型计算第 `attempt` 次重试前的等待时间
    ///
    /// 不可重试的错误返回 `None`。限流错误优先使用服务端给出的等待时间。
    pub fn backoff_for(&self, error: &DeliveryError, attempt: u32) -> Option<Duration> {
        match error {
            DeliveryError::RateLimited {
                retry_after: Some(hint),
            } => Some((*hint).min(self.max_backoff)),
            DeliveryError::RateLimited { retry_after: None } => {
                Some(self.calculate_backoff(self.rate_limit_backoff, attempt))
            }
            e if e.is_retryable() => Some(self.calculate_backoff(self.transport_backoff, attempt)),
            _ => None,
        }
    }

    /// 是否应该重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}
