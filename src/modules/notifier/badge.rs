use std::sync::Arc;

use tokio::task::JoinHandle;

use super::models::Badge;
use crate::modules::host::BadgeHost;

/// 扩展图标角标，设置后在角标时长结束时自动清除
#[derive(Clone)]
pub struct BadgeIndicator {
    host: Arc<dyn BadgeHost>,
}

impl BadgeIndicator {
    pub fn new(host: Arc<dyn BadgeHost>) -> Self {
        Self { host }
    }

    /// 显示角标，不等待结果；返回的句柄仅供需要等待清除的调用方使用
    pub fn flash(&self, badge: Badge) -> JoinHandle<()> {
        let host = self.host.clone();
        tokio::spawn(async move {
            if let Err(e) = host.set_badge(&badge).await {
                tracing::debug!("无法设置角标: {}", e);
                return;
            }

            tokio::time::sleep(badge.duration).await;

            // 扩展重新加载时清除会失败，忽略
            if let Err(e) = host.clear_badge().await {
                tracing::debug!("无法清除角标: {}", e);
            }
        })
    }
}
