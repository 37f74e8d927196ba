// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// 交付API错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// 凭据被拒绝（401/403/412）
    #[error("Authentication rejected with status {status}")]
    Auth { status: u16 },
    /// 资源不存在
    #[error("Not found: {0}")]
    NotFound(String),
    /// 触发限流，可能携带服务端建议的等待时间
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },
    /// 网络故障或超时
    #[error("Transport error: {0}")]
    Transport(String),
    /// 其他非预期状态码
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// 响应体无法解析
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl DeliveryError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::RateLimited { .. } | DeliveryError::Transport(_) => true,
            DeliveryError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, DeliveryError::Auth { .. })
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DeliveryError::Decode(err.to_string())
        } else {
            DeliveryError::Transport(err.to_string())
        }
    }
}

/// 交付API特质
///
/// 绑定到单个 (区域, stack, 分支, 环境) 的只读请求接口。
/// 实现方负责认证与环境作用域，每次调用互不依赖。
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    /// 发起 GET 请求并返回 JSON 响应体
    async fn request(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, DeliveryError>;
}
