use serde::{Deserialize, Serialize};

use crate::modules::scope::ScopeResolution;
use crate::modules::settings::models::Settings;

fn is_false(value: &bool) -> bool {
    !*value
}

/// 要清理的数据类别，字段名与浏览器接口一致，只序列化启用的类别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeSet {
    #[serde(default, skip_serializing_if = "is_false")]
    pub cookies: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cache: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cache_storage: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub file_systems: bool,
    #[serde(default, rename = "webSQL", skip_serializing_if = "is_false")]
    pub web_sql: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub local_storage: bool,
    #[serde(default, rename = "indexedDB", skip_serializing_if = "is_false")]
    pub indexed_db: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub service_workers: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub history: bool,
}

impl DataTypeSet {
    /// 由设置构建类别映射
    ///
    /// 缓存会连带清理 cacheStorage、fileSystems 与 webSQL；浏览器接口不区分
    /// localStorage 与 sessionStorage，两者任一开启都会清理合并后的存储类别。
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            cookies: settings.clear_cookies,
            cache: settings.clear_cache,
            cache_storage: settings.clear_cache,
            file_systems: settings.clear_cache,
            web_sql: settings.clear_cache,
            local_storage: settings.clear_local_storage || settings.clear_session_storage,
            indexed_db: settings.clear_indexed_db,
            service_workers: settings.clear_service_workers,
            history: settings.clear_history,
        }
    }

    /// 已启用类别的接口名称
    pub fn categories(&self) -> Vec<&'static str> {
        [
            (self.cookies, "cookies"),
            (self.cache, "cache"),
            (self.cache_storage, "cacheStorage"),
            (self.file_systems, "fileSystems"),
            (self.web_sql, "webSQL"),
            (self.local_storage, "localStorage"),
            (self.indexed_db, "indexedDB"),
            (self.service_workers, "serviceWorkers"),
            (self.history, "history"),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, name)| name)
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.categories().is_empty()
    }
}

/// 批量清理的时间与来源范围
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalOptions {
    /// 起始时间（Unix 毫秒），始终为 0，即全部历史
    pub since: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origins: Option<Vec<String>>,
}

impl RemovalOptions {
    pub fn for_scope(scope: &ScopeResolution) -> Self {
        let origins = match scope {
            ScopeResolution::SingleOrigin(origin) => Some(vec![origin.clone()]),
            ScopeResolution::AllSites | ScopeResolution::Unsupported => None,
        };
        Self { since: 0, origins }
    }

    pub fn is_restricted(&self) -> bool {
        self.origins.as_ref().map(|o| !o.is_empty()).unwrap_or(false)
    }
}

/// 一次清理的完整请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearRequest {
    pub options: RemovalOptions,
    pub data: DataTypeSet,
}

/// 批量清理的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkClear {
    Completed,
    /// 超时后按完成处理，浏览器可能仍在后台继续清理
    TimedOut,
}

/// Cookie 快速清理统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub found: usize,
    pub removed: usize,
    pub failed: usize,
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub request: ClearRequest,
    pub bulk: BulkClear,
    pub cookie_sweep: Option<SweepReport>,
}
