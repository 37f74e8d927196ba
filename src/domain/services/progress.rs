// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::info;

/// 进度报告器
///
/// 扫描过程中的状态消息经无界通道转发给调用方的回调，
/// 发送端从不等待，回调的耗时不会拖慢扫描。
#[derive(Clone, Debug, Default)]
pub struct ProgressReporter {
    tx: Option<UnboundedSender<String>>,
}

impl ProgressReporter {
    /// 创建报告器并启动转发任务
    ///
    /// 所有报告器副本被丢弃后转发任务结束，等待返回的句柄即可确保消息全部送达。
    pub fn spawn<F>(callback: F) -> (Self, JoinHandle<()>)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                callback(message);
            }
        });
        (Self { tx: Some(tx) }, handle)
    }

    /// 只写日志、不转发的报告器
    pub fn silent() -> Self {
        Self::default()
    }

    /// 发送一条进度消息
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "rtescan::progress", "{}", message);
        if let Some(tx) = &self.tx {
            // 接收端已关闭时丢弃消息
            let _ = tx.send(message);
        }
    }
}
