pub mod models;

use serde_json::Map;

use crate::modules::common::error::CleanerError;
use crate::modules::storage::Namespace;
use models::{Settings, SETTINGS_KEYS};

/// 用户设置的读写，保存在 sync 命名空间
#[derive(Clone)]
pub struct SettingsStore {
    namespace: Namespace,
}

impl SettingsStore {
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// 读取设置，缺失的键取默认值
    pub async fn load(&self) -> Result<Settings, CleanerError> {
        let stored = self.namespace.get(SETTINGS_KEYS).await?;
        Ok(Settings::from_map(&stored))
    }

    /// 整体写入设置
    pub async fn save(&self, settings: &Settings) -> Result<(), CleanerError> {
        self.namespace.set(settings.to_map()).await?;
        tracing::info!("设置已保存: scope={}", settings.scope);
        Ok(())
    }

    /// 首次安装时补齐缺失的键，已存在的值保持不变
    ///
    /// 返回实际写入的键。
    pub async fn install_defaults(&self) -> Result<Vec<String>, CleanerError> {
        let existing = self.namespace.get(SETTINGS_KEYS).await?;
        let defaults = Settings::default().to_map();

        let missing: Map<_, _> = defaults
            .into_iter()
            .filter(|(key, _)| !existing.contains_key(key))
            .collect();

        let written: Vec<String> = missing.keys().cloned().collect();
        if !missing.is_empty() {
            self.namespace.set(missing).await?;
            tracing::info!("已写入默认设置: {:?}", written);
        }

        Ok(written)
    }
}
