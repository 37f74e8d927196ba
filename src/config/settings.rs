// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scan::{Region, ScanConfig, ScanTuning, VersionPolicy};
use crate::utils::retry_policy::RetryPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含交付API连接参数与扫描调优参数
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 交付API配置
    pub delivery: DeliverySettings,
    /// 扫描配置
    pub scan: ScanSettings,
}

/// 交付API配置设置
#[derive(Debug, Deserialize)]
pub struct DeliverySettings {
    /// 区域 (na, eu, au, azure-na, azure-eu, gcp-na, gcp-eu)
    pub region: Region,
    /// Stack API Key
    pub api_key: String,
    /// 交付令牌
    pub access_token: String,
    /// 分支名称
    pub branch: String,
    /// 发布环境
    pub environment: String,
    /// 覆盖区域主机 (可选，用于代理或本地模拟服务)
    pub host: Option<String>,
}

/// 扫描配置设置
#[derive(Debug, Deserialize)]
pub struct ScanSettings {
    /// 每页条目数
    pub page_size: u32,
    /// 全局并发上限
    pub concurrency: usize,
    /// 每秒请求数上限，0 表示不限速
    pub requests_per_second: u32,
    /// 请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 每个请求的最大重试次数
    pub max_retries: u32,
    /// 限流初始退避（毫秒）
    pub rate_limit_backoff_ms: u64,
    /// 网络错误初始退避（毫秒）
    pub transport_backoff_ms: u64,
    /// 单次退避上限（秒）
    pub max_backoff_secs: u64,
    /// 单个请求累计等待上限（秒）
    pub max_total_wait_secs: u64,
    /// 版本收录策略 (all, latest)
    pub version_policy: VersionPolicy,
    /// stack 未报告语言时使用的主语言
    pub default_locale: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与
    /// `RTESCAN__` 前缀的环境变量，后者优先。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("RTESCAN").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅包含默认值的配置构建器
    pub fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Default delivery settings
            .set_default("delivery.region", "na")?
            .set_default("delivery.api_key", "")?
            .set_default("delivery.access_token", "")?
            .set_default("delivery.branch", "")?
            .set_default("delivery.environment", "")?
            // Default scan settings
            .set_default("scan.page_size", 100)?
            .set_default("scan.concurrency", 6)?
            .set_default("scan.requests_per_second", 10)?
            .set_default("scan.request_timeout_secs", 30)?
            .set_default("scan.max_retries", 3)?
            .set_default("scan.rate_limit_backoff_ms", 1000)?
            .set_default("scan.transport_backoff_ms", 250)?
            .set_default("scan.max_backoff_secs", 30)?
            .set_default("scan.max_total_wait_secs", 120)?
            .set_default("scan.version_policy", "all")?
            .set_default("scan.default_locale", "en-us")
    }

    /// 扫描连接参数
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            region: self.delivery.region,
            api_key: self.delivery.api_key.clone(),
            access_token: self.delivery.access_token.clone(),
            branch_name: self.delivery.branch.clone(),
            environment: self.delivery.environment.clone(),
        }
    }

    /// 扫描调优参数
    pub fn scan_tuning(&self) -> ScanTuning {
        let scan = &self.scan;
        ScanTuning {
            page_size: scan.page_size,
            concurrency: scan.concurrency,
            requests_per_second: scan.requests_per_second,
            request_timeout: Duration::from_secs(scan.request_timeout_secs),
            retry: RetryPolicy {
                max_retries: scan.max_retries,
                rate_limit_backoff: Duration::from_millis(scan.rate_limit_backoff_ms),
                transport_backoff: Duration::from_millis(scan.transport_backoff_ms),
                max_backoff: Duration::from_secs(scan.max_backoff_secs),
                max_total_wait: Duration::from_secs(scan.max_total_wait_secs),
                ..RetryPolicy::default()
            },
            version_policy: scan.version_policy,
            default_locale: scan.default_locale.clone(),
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
