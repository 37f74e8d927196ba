// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 内容交付API客户端
pub mod cda_client;
/// 并发与速率闸门
pub mod request_gate;
