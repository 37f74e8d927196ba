// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含扫描模型、交付API抽象以及扫描服务
pub mod domain;

/// 基础设施模块
///
/// 提供交付API的HTTP实现与请求闸门
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型、重试策略与遥测初始化
pub mod utils;

pub use domain::models::entry::{AffectedEntry, ContentTypeId, Locale, ResultSet};
pub use domain::models::outcome::{FailedPair, ScanOutcome, ScanStatus};
pub use domain::models::scan::{Region, ScanConfig, ScanTuning, VersionPolicy};
pub use domain::services::scanner::{get_cda_null_entries, Scanner};
pub use utils::errors::ScanError;
