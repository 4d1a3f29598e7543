//! 弹出窗口展示的数据：当前模式、启用的清理项目与上次清理时间

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::history::models::{describe_last_cleared, ClearRunResult, LastClearedText};
use crate::modules::settings::models::{Scope, Settings};

pub const NO_ITEMS_TEXT: &str = "No items selected";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeIndicator {
    pub scope: Scope,
    pub title: String,
    pub description: String,
}

impl ModeIndicator {
    pub fn for_scope(scope: Scope) -> Self {
        let (title, description) = match scope {
            Scope::Current => ("Current Site Only", "Clearing data for this site only"),
            Scope::All => ("All Sites", "Clearing data for all websites"),
        };
        Self {
            scope,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub mode: ModeIndicator,
    pub active_items: Vec<String>,
    pub last_cleared: LastClearedText,
}

impl StatusSummary {
    pub fn build(settings: &Settings, last: Option<&ClearRunResult>, now: DateTime<Utc>) -> Self {
        Self {
            mode: ModeIndicator::for_scope(settings.scope),
            active_items: settings.item_labels(),
            last_cleared: describe_last_cleared(last, now),
        }
    }

    /// 启用项目的一行文本
    pub fn items_line(&self) -> String {
        if self.active_items.is_empty() {
            NO_ITEMS_TEXT.to_string()
        } else {
            self.active_items.join(" · ")
        }
    }
}
