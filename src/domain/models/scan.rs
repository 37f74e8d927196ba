// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::retry_policy::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// 交付API区域
///
/// 与交付SDK的区域一一对应，每个区域映射到各自的CDN主机。
/// 空字符串与 `na` 等价（SDK的默认区域）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    /// AWS 北美
    #[default]
    #[serde(alias = "")]
    Na,
    /// AWS 欧洲
    Eu,
    /// AWS 澳洲
    Au,
    /// Azure 北美
    AzureNa,
    /// Azure 欧洲
    AzureEu,
    /// GCP 北美
    GcpNa,
    /// GCP 欧洲
    GcpEu,
}

impl Region {
    /// 区域对应的交付API主机名
    pub fn host(&self) -> &'static str {
        match self {
            Region::Na => "cdn.contentstack.io",
            Region::Eu => "eu-cdn.contentstack.com",
            Region::Au => "au-cdn.contentstack.com",
            Region::AzureNa => "azure-na-cdn.contentstack.com",
            Region::AzureEu => "azure-eu-cdn.contentstack.com",
            Region::GcpNa => "gcp-na-cdn.contentstack.com",
            Region::GcpEu => "gcp-eu-cdn.contentstack.com",
        }
    }

    /// 区域对应的交付API基础URL
    pub fn base_url(&self) -> String {
        format!("https://{}", self.host())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Region::Na => "na",
            Region::Eu => "eu",
            Region::Au => "au",
            Region::AzureNa => "azure-na",
            Region::AzureEu => "azure-eu",
            Region::GcpNa => "gcp-na",
            Region::GcpEu => "gcp-eu",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("Unknown region: {0}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "" | "na" | "us" | "aws-na" => Ok(Region::Na),
            "eu" | "aws-eu" => Ok(Region::Eu),
            "au" | "aws-au" => Ok(Region::Au),
            "azure-na" => Ok(Region::AzureNa),
            "azure-eu" => Ok(Region::AzureEu),
            "gcp-na" => Ok(Region::GcpNa),
            "gcp-eu" => Ok(Region::GcpEu),
            _ => Err(UnknownRegion(s.to_string())),
        }
    }
}

/// 扫描连接参数
///
/// 由调用方构造，在一次扫描期间保持不变。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScanConfig {
    /// 交付API区域
    #[serde(default)]
    pub region: Region,
    /// Stack API Key
    #[validate(length(min = 1, message = "api_key must not be empty"))]
    pub api_key: String,
    /// 交付令牌
    #[validate(length(min = 1, message = "access_token must not be empty"))]
    pub access_token: String,
    /// 分支名称，为空时使用stack的默认分支
    #[serde(default)]
    pub branch_name: String,
    /// 发布环境
    #[validate(length(min = 1, message = "environment must not be empty"))]
    pub environment: String,
}

/// 版本收录策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// 逐个检查所有历史版本，只收录富文本字段为null的版本
    #[default]
    All,
    /// 只收录最新版本
    Latest,
}

impl FromStr for VersionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(VersionPolicy::All),
            "latest" => Ok(VersionPolicy::Latest),
            other => Err(format!("Unknown version policy: {}", other)),
        }
    }
}

/// 扫描调优参数
///
/// 分页大小、并发上限、请求速率、超时与重试策略。
#[derive(Debug, Clone, Validate)]
pub struct ScanTuning {
    /// 每页条目数（交付API上限为100）
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    /// 全局并发上限，同时约束并行的 (内容类型, 语言) 组合与在途请求数
    #[validate(range(min = 1, max = 32))]
    pub concurrency: usize,
    /// 每秒请求数上限，0 表示不限速
    pub requests_per_second: u32,
    /// 单次请求超时
    pub request_timeout: Duration,
    /// 重试策略
    pub retry: RetryPolicy,
    /// 版本收录策略
    pub version_policy: VersionPolicy,
    /// stack 未报告任何语言时使用的主语言
    #[validate(length(min = 1))]
    pub default_locale: String,
}

impl Default for ScanTuning {
    fn default() -> Self {
        Self {
            page_size: 100,
            concurrency: 6,
            requests_per_second: 10,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            version_policy: VersionPolicy::All,
            default_locale: "en-us".to_string(),
        }
    }
}
