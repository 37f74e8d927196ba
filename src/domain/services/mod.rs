// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含审计扫描的核心业务逻辑：
/// - 内容类型枚举（content_types）与语言解析（locales）：确定扫描范围
/// - 条目分页（entry_paginator）：按页顺序读取每个 (内容类型, 语言) 组合
/// - 富文本检测（rte_detector）：基于 schema 判断富文本字段是否为 null
/// - 版本遍历（version_walker）：逐个复查受影响条目的历史版本
/// - 结果聚合（result_aggregator）：并发去重的受影响条目集合
/// - 进度报告（progress）：向调用方回调状态消息
/// - 扫描器（scanner）：编排以上服务
pub mod content_types;
pub mod entry_paginator;
pub mod locales;
pub mod progress;
pub mod request_retry;
pub mod result_aggregator;
pub mod rte_detector;
pub mod scanner;
pub mod version_walker;
