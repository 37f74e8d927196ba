// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::delivery::api::DeliveryError;
use thiserror::Error;

/// 扫描致命错误
///
/// 出现时整个扫描中止，不返回任何部分结果。
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("认证失败: {0}")]
    Auth(DeliveryError),

    #[error("无法枚举{what}: {source}")]
    Enumeration {
        what: &'static str,
        #[source]
        source: DeliveryError,
    },

    #[error("无效配置: {0}")]
    InvalidConfig(String),
}

impl ScanError {
    /// 将枚举阶段的请求错误归类为致命错误
    pub fn enumeration(what: &'static str, source: DeliveryError) -> Self {
        if source.is_auth() {
            ScanError::Auth(source)
        } else {
            ScanError::Enumeration { what, source }
        }
    }
}

impl From<validator::ValidationErrors> for ScanError {
    fn from(err: validator::ValidationErrors) -> Self {
        ScanError::InvalidConfig(err.to_string())
    }
}

/// 单个 (内容类型, 语言) 组合的失败
///
/// 认证失败会升级为致命错误，其余失败只记录该组合并继续扫描。
#[derive(Error, Debug, Clone)]
pub enum PairError {
    #[error("认证失败: {0}")]
    Auth(DeliveryError),

    #[error("重试预算耗尽: {0}")]
    Exhausted(DeliveryError),

    #[error("请求被拒绝: {0}")]
    Rejected(DeliveryError),
}

impl From<DeliveryError> for PairError {
    fn from(err: DeliveryError) -> Self {
        if err.is_auth() {
            PairError::Auth(err)
        } else if err.is_retryable() {
            PairError::Exhausted(err)
        } else {
            PairError::Rejected(err)
        }
    }
}
