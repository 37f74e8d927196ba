// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：扫描参数、条目与扫描结果
/// - 交付API抽象（delivery）：只读请求接口与错误分类
/// - 服务（services）：枚举、分页、检测、版本遍历与扫描编排
///
/// 领域层只依赖 `DeliveryApi` 抽象，具体HTTP实现位于基础设施层。
pub mod delivery;
pub mod models;
pub mod services;
