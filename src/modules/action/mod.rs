//! 点击扩展图标后的完整清理流程
//!
//! 读取设置 → 解析范围 → 批量清理 → 进度提示 → 记录结果 → 刷新页面。

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::modules::cleaner::models::RunOutcome;
use crate::modules::cleaner::ClearOrchestrator;
use crate::modules::common::config::{AppConfig, Timings};
use crate::modules::common::error::CleanerError;
use crate::modules::common::utils;
use crate::modules::history::models::ClearRunResult;
use crate::modules::history::ClearHistoryLog;
use crate::modules::host::{Hosts, TabInfo, TabsHost};
use crate::modules::notifier::models::{Badge, ToastMessage};
use crate::modules::notifier::{BadgeIndicator, ProgressNotifier};
use crate::modules::scope::{self, ScopeResolution};
use crate::modules::settings::models::Settings;
use crate::modules::settings::SettingsStore;
use crate::modules::storage::Storage;

const CLEARING_MESSAGE: &str = "Clearing data...";
const CLEARED_MESSAGE: &str = "Data cleared!";
const ERROR_MESSAGE: &str = "Error clearing data";

/// 一次点击的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActivationOutcome {
    Cleared {
        result: ClearRunResult,
        run: RunOutcome,
    },
    /// 当前页面不能按站点清理，没有清理任何数据
    Unsupported,
    Failed {
        error: String,
    },
}

/// 来自弹窗或设置页的运行时消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RuntimeMessage {
    ClearNow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
}

/// 消息处理结果；`activation` 在没有活动标签页时得到 `None`，供需要等待的调用方使用
pub struct Dispatch {
    pub response: MessageResponse,
    pub activation: JoinHandle<Option<ActivationOutcome>>,
}

#[derive(Clone)]
pub struct ClearAction {
    settings: SettingsStore,
    history: ClearHistoryLog,
    orchestrator: ClearOrchestrator,
    tabs: Arc<dyn TabsHost>,
    notifier: ProgressNotifier,
    badge: BadgeIndicator,
    timings: Timings,
}

impl ClearAction {
    /// 创建处理器，同时启动 toast 投递任务
    pub fn new(hosts: Hosts, storage: Storage, config: &AppConfig) -> (Self, JoinHandle<()>) {
        let (notifier, pump) = ProgressNotifier::spawn(hosts.tabs.clone());
        let action = Self {
            settings: SettingsStore::new(storage.sync),
            history: ClearHistoryLog::new(storage.local),
            orchestrator: ClearOrchestrator::from_config(
                hosts.browsing_data.clone(),
                hosts.cookies.clone(),
                config,
            ),
            tabs: hosts.tabs,
            notifier,
            badge: BadgeIndicator::new(hosts.badge),
            timings: config.timings,
        };
        (action, pump)
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn history(&self) -> &ClearHistoryLog {
        &self.history
    }

    /// 处理一次点击
    pub async fn activate(&self, tab: &TabInfo) -> ActivationOutcome {
        let span = tracing::info_span!("activate", run_id = %utils::generate_id(), tab = tab.id);
        self.activate_inner(tab).instrument(span).await
    }

    async fn activate_inner(&self, tab: &TabInfo) -> ActivationOutcome {
        let started = Instant::now();
        tracing::info!("扩展图标被点击: {:?}", tab.url);

        let settings = match self.settings.load().await {
            Ok(settings) => settings,
            Err(e) => return self.fail(tab.id, e),
        };
        tracing::info!(
            "设置读取完成 ({}ms): {:?}",
            started.elapsed().as_millis(),
            settings
        );

        let scope = scope::resolve(tab.url.as_deref(), settings.scope);
        if scope == ScopeResolution::Unsupported {
            tracing::info!("当前页面不支持按站点清理: {:?}", tab.url);
            self.badge.flash(Badge::unsupported());
            return ActivationOutcome::Unsupported;
        }

        if let Err(e) = self.tabs.inject_toast(tab.id).await {
            tracing::debug!("toast 脚本已加载或无法注入: {}", e);
        }
        if !self.timings.toast_ready_delay.is_zero() {
            tokio::time::sleep(self.timings.toast_ready_delay).await;
        }

        self.notifier
            .publish(tab.id, ToastMessage::loading(CLEARING_MESSAGE, 0));
        self.notifier
            .publish(tab.id, ToastMessage::loading(CLEARING_MESSAGE, 30));

        let clear_started = Instant::now();
        let (result, run) = match self.clear_and_record(tab.id, &settings, &scope).await {
            Ok(done) => done,
            Err(e) => return self.fail(tab.id, e),
        };
        tracing::info!(
            "清理完成 (耗时 {}ms，总计 {}ms)",
            clear_started.elapsed().as_millis(),
            started.elapsed().as_millis()
        );

        self.notifier.publish(
            tab.id,
            ToastMessage::success(format!(
                "Cleared {} ({})",
                result.items_text(),
                result.scope.label()
            )),
        );

        if !self.timings.reload_delay.is_zero() {
            tokio::time::sleep(self.timings.reload_delay).await;
        }

        match self.tabs.reload(tab.id).await {
            Ok(()) => tracing::info!("页面已刷新，总耗时 {}ms", started.elapsed().as_millis()),
            Err(e) => tracing::error!("无法刷新页面: {}", e),
        }

        self.badge.flash(Badge::success());

        ActivationOutcome::Cleared { result, run }
    }

    async fn clear_and_record(
        &self,
        tab_id: i64,
        settings: &Settings,
        scope: &ScopeResolution,
    ) -> Result<(ClearRunResult, RunOutcome), CleanerError> {
        let run = self.orchestrator.run(settings, scope).await?;

        self.notifier
            .publish(tab_id, ToastMessage::loading(CLEARED_MESSAGE, 70));

        let result = ClearRunResult::new(Utc::now(), settings.item_labels(), settings.scope);
        self.history.record(&result).await?;

        Ok((result, run))
    }

    fn fail(&self, tab_id: i64, error: CleanerError) -> ActivationOutcome {
        tracing::error!("清理数据出错: {}", error);

        self.notifier.publish(tab_id, ToastMessage::error(ERROR_MESSAGE));
        self.notifier
            .publish_after(tab_id, ToastMessage::HideToast, self.timings.error_hide_delay);
        self.badge.flash(Badge::error());

        ActivationOutcome::Failed {
            error: error.to_string(),
        }
    }

    /// 处理运行时消息；查询活动标签页与清理都在后台进行，消息立即得到应答
    pub fn handle_message(&self, message: &RuntimeMessage) -> Dispatch {
        match message {
            RuntimeMessage::ClearNow => {
                let action = self.clone();
                let activation = tokio::spawn(async move {
                    match action.tabs.query_active().await {
                        Ok(Some(tab)) => Some(action.activate(&tab).await),
                        Ok(None) => {
                            tracing::info!("没有活动标签页，忽略 clearNow");
                            None
                        }
                        Err(e) => {
                            tracing::warn!("查询活动标签页失败: {}", e);
                            None
                        }
                    }
                });

                Dispatch {
                    response: MessageResponse { success: true },
                    activation,
                }
            }
        }
    }
}
