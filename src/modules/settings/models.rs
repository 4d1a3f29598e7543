use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 清理范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// 仅当前站点
    #[default]
    Current,
    /// 所有站点
    All,
}

impl Scope {
    /// 存储中除 "current" 以外的任何字符串都视为所有站点
    pub fn from_stored(value: &str) -> Self {
        if value == "current" {
            Scope::Current
        } else {
            Scope::All
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Current => "current",
            Scope::All => "all",
        }
    }

    /// 用于提示文案
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Current => "current site",
            Scope::All => "all sites",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Scope::Current),
            "all" => Ok(Scope::All),
            other => Err(format!("未知范围: {} (可选 current|all)", other)),
        }
    }
}

pub const KEY_SCOPE: &str = "scope";
pub const KEY_CLEAR_COOKIES: &str = "clearCookies";
pub const KEY_CLEAR_CACHE: &str = "clearCache";
pub const KEY_CLEAR_LOCAL_STORAGE: &str = "clearLocalStorage";
pub const KEY_CLEAR_SESSION_STORAGE: &str = "clearSessionStorage";
pub const KEY_CLEAR_INDEXED_DB: &str = "clearIndexedDB";
pub const KEY_CLEAR_SERVICE_WORKERS: &str = "clearServiceWorkers";
pub const KEY_CLEAR_HISTORY: &str = "clearHistory";

/// 设置记录的全部键
pub const SETTINGS_KEYS: &[&str] = &[
    KEY_SCOPE,
    KEY_CLEAR_COOKIES,
    KEY_CLEAR_CACHE,
    KEY_CLEAR_LOCAL_STORAGE,
    KEY_CLEAR_SESSION_STORAGE,
    KEY_CLEAR_INDEXED_DB,
    KEY_CLEAR_SERVICE_WORKERS,
    KEY_CLEAR_HISTORY,
];

/// 用户设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub scope: Scope,
    pub clear_cookies: bool,
    pub clear_cache: bool,
    pub clear_local_storage: bool,
    pub clear_session_storage: bool,
    #[serde(rename = "clearIndexedDB")]
    pub clear_indexed_db: bool,
    pub clear_service_workers: bool,
    pub clear_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scope: Scope::Current,
            clear_cookies: true,
            clear_cache: true,
            clear_local_storage: true,
            clear_session_storage: true,
            clear_indexed_db: false,
            clear_service_workers: false,
            clear_history: false,
        }
    }
}

impl Settings {
    /// 从存储读取的键值构建设置，缺失的键取默认值
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Settings::default();

        let scope = match map.get(KEY_SCOPE) {
            None | Some(Value::Null) => defaults.scope,
            Some(Value::String(s)) => Scope::from_stored(s),
            Some(other) => {
                tracing::warn!("设置项 {} 类型无效: {}，使用默认值", KEY_SCOPE, other);
                defaults.scope
            }
        };

        Self {
            scope,
            clear_cookies: read_flag(map, KEY_CLEAR_COOKIES, defaults.clear_cookies),
            clear_cache: read_flag(map, KEY_CLEAR_CACHE, defaults.clear_cache),
            clear_local_storage: read_flag(map, KEY_CLEAR_LOCAL_STORAGE, defaults.clear_local_storage),
            clear_session_storage: read_flag(
                map,
                KEY_CLEAR_SESSION_STORAGE,
                defaults.clear_session_storage,
            ),
            clear_indexed_db: read_flag(map, KEY_CLEAR_INDEXED_DB, defaults.clear_indexed_db),
            clear_service_workers: read_flag(
                map,
                KEY_CLEAR_SERVICE_WORKERS,
                defaults.clear_service_workers,
            ),
            clear_history: read_flag(map, KEY_CLEAR_HISTORY, defaults.clear_history),
        }
    }

    /// 完整的存储键值
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(KEY_SCOPE.to_string(), Value::from(self.scope.as_str()));
        for (key, value) in self.flags() {
            map.insert(key.to_string(), Value::Bool(value));
        }
        map
    }

    fn flags(&self) -> [(&'static str, bool); 7] {
        [
            (KEY_CLEAR_COOKIES, self.clear_cookies),
            (KEY_CLEAR_CACHE, self.clear_cache),
            (KEY_CLEAR_LOCAL_STORAGE, self.clear_local_storage),
            (KEY_CLEAR_SESSION_STORAGE, self.clear_session_storage),
            (KEY_CLEAR_INDEXED_DB, self.clear_indexed_db),
            (KEY_CLEAR_SERVICE_WORKERS, self.clear_service_workers),
            (KEY_CLEAR_HISTORY, self.clear_history),
        ]
    }

    /// 已启用项目的显示名称，顺序固定
    pub fn item_labels(&self) -> Vec<String> {
        self.flags()
            .into_iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(key, _)| item_label(key).to_string())
            .collect()
    }
}

/// 设置键对应的显示名称
pub fn item_label(key: &str) -> &'static str {
    match key {
        KEY_CLEAR_COOKIES => "Cookies",
        KEY_CLEAR_CACHE => "Cache",
        KEY_CLEAR_LOCAL_STORAGE => "Local Storage",
        KEY_CLEAR_SESSION_STORAGE => "Session Storage",
        KEY_CLEAR_INDEXED_DB => "IndexedDB",
        KEY_CLEAR_SERVICE_WORKERS => "Service Workers",
        KEY_CLEAR_HISTORY => "History",
        _ => "Unknown",
    }
}

fn read_flag(map: &Map<String, Value>, key: &str, default: bool) -> bool {
    match map.get(key) {
        None | Some(Value::Null) => default,
        Some(Value::Bool(value)) => *value,
        Some(other) => {
            tracing::warn!("设置项 {} 类型无效: {}，使用默认值", key, other);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn empty_map_yields_defaults() {
        assert_eq!(Settings::from_map(&Map::new()), Settings::default());
    }

    #[test]
    fn each_absent_key_falls_back_to_its_own_default() {
        for key in SETTINGS_KEYS {
            let mut map = Settings::default().to_map();
            map.remove(*key);
            assert_eq!(Settings::from_map(&map), Settings::default(), "key {}", key);
        }
    }

    #[test]
    fn present_values_win_over_defaults() {
        let settings = Settings::from_map(&as_map(json!({
            "scope": "all",
            "clearCookies": false,
            "clearHistory": true
        })));
        assert_eq!(settings.scope, Scope::All);
        assert!(!settings.clear_cookies);
        assert!(settings.clear_history);
        assert!(settings.clear_cache);
    }

    #[test]
    fn unknown_scope_string_means_all_sites() {
        let settings = Settings::from_map(&as_map(json!({ "scope": "everything" })));
        assert_eq!(settings.scope, Scope::All);
    }

    #[test]
    fn non_boolean_flag_reads_as_default() {
        let settings = Settings::from_map(&as_map(json!({ "clearCache": "yes" })));
        assert!(settings.clear_cache);
        let settings = Settings::from_map(&as_map(json!({ "clearHistory": 1 })));
        assert!(!settings.clear_history);
    }

    #[test]
    fn to_map_uses_extension_keys() {
        let map = Settings::default().to_map();
        assert_eq!(map.len(), SETTINGS_KEYS.len());
        assert_eq!(map["scope"], "current");
        assert_eq!(map["clearIndexedDB"], false);
        assert_eq!(serde_json::to_value(Settings::default()).unwrap(), Value::Object(map));
    }

    #[test]
    fn default_item_labels_in_fixed_order() {
        assert_eq!(
            Settings::default().item_labels(),
            vec!["Cookies", "Cache", "Local Storage", "Session Storage"]
        );
    }
}
