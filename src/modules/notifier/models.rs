use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 提示类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastType {
    Loading,
    Success,
    Error,
}

/// 发送给页面 toast 脚本的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ToastMessage {
    ShowToast {
        message: String,
        #[serde(rename = "type")]
        kind: ToastType,
        /// 0-100
        progress: u8,
    },
    HideToast,
}

impl ToastMessage {
    pub fn show(message: impl Into<String>, kind: ToastType, progress: u8) -> Self {
        ToastMessage::ShowToast {
            message: message.into(),
            kind,
            progress: progress.min(100),
        }
    }

    pub fn loading(message: impl Into<String>, progress: u8) -> Self {
        Self::show(message, ToastType::Loading, progress)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::show(message, ToastType::Success, 100)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::show(message, ToastType::Error, 0)
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            ToastMessage::ShowToast { progress, .. } => Some(*progress),
            ToastMessage::HideToast => None,
        }
    }
}

pub const BADGE_SUCCESS_COLOR: &str = "#28a745";
pub const BADGE_ERROR_COLOR: &str = "#dc3545";

/// 扩展图标上的角标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    pub color: String,
    /// 展示多久后清除
    #[serde(skip)]
    pub duration: Duration,
}

impl Badge {
    pub fn success() -> Self {
        Self {
            text: "✓".to_string(),
            color: BADGE_SUCCESS_COLOR.to_string(),
            duration: Duration::from_secs(5),
        }
    }

    pub fn error() -> Self {
        Self {
            text: "!".to_string(),
            color: BADGE_ERROR_COLOR.to_string(),
            duration: Duration::from_secs(5),
        }
    }

    /// 当前页面不支持按站点清理
    pub fn unsupported() -> Self {
        Self {
            text: "✗".to_string(),
            color: BADGE_ERROR_COLOR.to_string(),
            duration: Duration::from_secs(2),
        }
    }
}
