use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::modules::common::utils;
use crate::modules::settings::models::Scope;

pub const KEY_LAST_CLEARED: &str = "lastCleared";
pub const KEY_LAST_CLEARED_ITEMS: &str = "lastClearedItems";
pub const KEY_LAST_CLEARED_SCOPE: &str = "lastClearedScope";

pub const HISTORY_KEYS: &[&str] = &[KEY_LAST_CLEARED, KEY_LAST_CLEARED_ITEMS, KEY_LAST_CLEARED_SCOPE];

/// 最近一次清理的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearRunResult {
    pub cleared_at: DateTime<Utc>,
    pub items: Vec<String>,
    pub scope: Scope,
}

impl ClearRunResult {
    pub fn new(cleared_at: DateTime<Utc>, items: Vec<String>, scope: Scope) -> Self {
        Self {
            cleared_at,
            items,
            scope,
        }
    }

    /// 写入 local 命名空间的键值，时间为 Unix 毫秒
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            KEY_LAST_CLEARED.to_string(),
            Value::from(self.cleared_at.timestamp_millis()),
        );
        map.insert(
            KEY_LAST_CLEARED_ITEMS.to_string(),
            Value::from(self.items.clone()),
        );
        map.insert(
            KEY_LAST_CLEARED_SCOPE.to_string(),
            Value::from(self.scope.as_str()),
        );
        map
    }

    /// 没有有效的 `lastCleared` 时间戳时视为从未清理
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let millis = map.get(KEY_LAST_CLEARED)?.as_i64()?;
        let cleared_at = utils::millis_to_datetime(millis)?;

        let items = map
            .get(KEY_LAST_CLEARED_ITEMS)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let scope = map
            .get(KEY_LAST_CLEARED_SCOPE)
            .and_then(Value::as_str)
            .map(Scope::from_stored)
            .unwrap_or(Scope::All);

        Some(Self {
            cleared_at,
            items,
            scope,
        })
    }

    /// 成功提示中的条目文本
    pub fn items_text(&self) -> String {
        if self.items.is_empty() {
            "No items".to_string()
        } else {
            self.items.join(", ")
        }
    }
}

/// 弹出窗口中“上次清理”一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastClearedText {
    pub message: String,
    /// 十秒内的清理，弹窗会额外显示成功状态
    pub recent: bool,
}

/// 相对时间描述
pub fn relative_time(cleared_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(cleared_at);
    let minutes = diff.num_minutes();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} ago", utils::plural(minutes, "minute"))
    } else if minutes < 1440 {
        format!("{} ago", utils::plural(minutes / 60, "hour"))
    } else {
        cleared_at.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

pub fn describe_last_cleared(last: Option<&ClearRunResult>, now: DateTime<Utc>) -> LastClearedText {
    let Some(last) = last else {
        return LastClearedText {
            message: "No data cleared yet".to_string(),
            recent: false,
        };
    };

    let mut message = format!("Last cleared: {}", relative_time(last.cleared_at, now));
    if !last.items.is_empty() {
        message.push_str(&format!(" - {} ({})", last.items.join(", "), last.scope.label()));
    }

    let age = now.signed_duration_since(last.cleared_at);
    LastClearedText {
        message,
        recent: age.num_milliseconds() < 10_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample(at: DateTime<Utc>) -> ClearRunResult {
        ClearRunResult::new(
            at,
            vec!["Cookies".to_string(), "Cache".to_string()],
            Scope::Current,
        )
    }

    #[test]
    fn storage_keys_match_extension_layout() {
        let at = utils::millis_to_datetime(1_700_000_000_000).unwrap();
        let map = sample(at).to_map();
        assert_eq!(
            Value::Object(map),
            json!({
                "lastCleared": 1_700_000_000_000i64,
                "lastClearedItems": ["Cookies", "Cache"],
                "lastClearedScope": "current"
            })
        );
    }

    #[test]
    fn from_map_requires_a_timestamp() {
        let map = json!({ "lastClearedItems": ["Cookies"] });
        assert_eq!(ClearRunResult::from_map(map.as_object().unwrap()), None);

        let map = json!({ "lastCleared": 1_700_000_000_000i64 });
        let result = ClearRunResult::from_map(map.as_object().unwrap()).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.scope, Scope::All);
    }

    #[test]
    fn only_current_scope_reads_as_current_site() {
        let now = Utc::now();
        let millis = now.timestamp_millis();

        let missing = json!({ "lastCleared": millis, "lastClearedItems": ["Cache"] });
        let last = ClearRunResult::from_map(missing.as_object().unwrap()).unwrap();
        assert_eq!(
            describe_last_cleared(Some(&last), now).message,
            "Last cleared: Just now - Cache (all sites)"
        );

        let other = json!({ "lastCleared": millis, "lastClearedScope": 7 });
        let last = ClearRunResult::from_map(other.as_object().unwrap()).unwrap();
        assert_eq!(last.scope, Scope::All);

        let current = json!({ "lastCleared": millis, "lastClearedScope": "current" });
        let last = ClearRunResult::from_map(current.as_object().unwrap()).unwrap();
        assert_eq!(last.scope, Scope::Current);
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::seconds(30), now), "Just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::minutes(45), now), "45 minutes ago");
        assert_eq!(relative_time(now - Duration::minutes(60), now), "1 hour ago");
        assert_eq!(relative_time(now - Duration::hours(5), now), "5 hours ago");

        let old = now - Duration::days(3);
        assert_eq!(
            relative_time(old, now),
            old.with_timezone(&Local).format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn describe_includes_items_and_scope() {
        let now = Utc::now();
        let text = describe_last_cleared(Some(&sample(now - Duration::minutes(2))), now);
        assert_eq!(
            text.message,
            "Last cleared: 2 minutes ago - Cookies, Cache (current site)"
        );
        assert!(!text.recent);
    }

    #[test]
    fn describe_flags_very_recent_runs() {
        let now = Utc::now();
        let mut last = sample(now - Duration::seconds(3));
        last.items.clear();
        let text = describe_last_cleared(Some(&last), now);
        assert_eq!(text.message, "Last cleared: Just now");
        assert!(text.recent);
    }

    #[test]
    fn describe_without_history() {
        let text = describe_last_cleared(None, Utc::now());
        assert_eq!(text.message, "No data cleared yet");
        assert!(!text.recent);
    }

    #[test]
    fn items_text_for_empty_selection() {
        let mut result = sample(Utc::now());
        assert_eq!(result.items_text(), "Cookies, Cache");
        result.items.clear();
        assert_eq!(result.items_text(), "No items");
    }
}
