// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了审计扫描的核心数据结构，包括：
/// - 扫描参数（scan）：连接参数、区域、调优参数
/// - 条目（entry）：内容类型、语言、受影响条目及其集合
/// - 扫描结果（outcome）：最终状态与失败组合
pub mod entry;
pub mod outcome;
pub mod scan;
