// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含与外部系统交互的技术实现：
/// - 交付API（delivery）：基于reqwest的内容交付API客户端，以及并发与速率闸门
///
/// 基础设施层依赖于领域层的抽象接口（`DeliveryApi`），
/// 确保扫描逻辑不受具体HTTP实现的影响。
pub mod delivery;
