//! 进度通知
//!
//! toast 消息经无界通道交给后台任务逐条投递到页面。发布方从不等待投递结果，
//! 页面已跳转或没有监听时的错误只记录日志。

pub mod badge;
pub mod models;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::modules::host::TabsHost;
use models::ToastMessage;

pub use badge::BadgeIndicator;

#[derive(Debug)]
struct Envelope {
    tab_id: i64,
    message: ToastMessage,
}

#[derive(Clone)]
pub struct ProgressNotifier {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ProgressNotifier {
    /// 创建通知器并启动投递任务
    ///
    /// 所有 `ProgressNotifier` 副本（包括延迟发布的任务）被丢弃后投递任务结束。
    pub fn spawn(tabs: Arc<dyn TabsHost>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

        let handle = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                if let Err(e) = tabs.send_message(envelope.tab_id, &envelope.message).await {
                    tracing::debug!("toast 消息未送达 (tab {}): {}", envelope.tab_id, e);
                }
            }
        });

        (Self { tx }, handle)
    }

    /// 发布消息，立即返回
    pub fn publish(&self, tab_id: i64, message: ToastMessage) {
        if self.tx.send(Envelope { tab_id, message }).is_err() {
            tracing::debug!("toast 投递任务已退出，丢弃消息");
        }
    }

    /// 延迟一段时间后发布
    pub fn publish_after(&self, tab_id: i64, message: ToastMessage, delay: Duration) {
        let notifier = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.publish(tab_id, message);
        });
    }
}
