//! 浏览器宿主接口
//!
//! 清理流程只通过这里的 trait 访问浏览器：批量清理、Cookie、标签页消息与
//! 扩展图标角标。`memory` 提供一个内存实现，供命令行预演与测试使用。

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modules::cleaner::models::{DataTypeSet, RemovalOptions};
use crate::modules::notifier::models::{Badge, ToastMessage};

pub use memory::MemoryHost;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("标签页不存在: {0}")]
    NoSuchTab(i64),

    #[error("接口不可用: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// 浏览器中的一个 Cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub store_id: String,
}

impl Cookie {
    /// 默认 Cookie 仓库 ("0") 中的 Cookie
    pub fn new(name: &str, domain: &str, path: &str, secure: bool) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            domain: domain.to_string(),
            path: path.to_string(),
            secure,
            store_id: "0".to_string(),
        }
    }
}

/// 按精确匹配删除 Cookie 的参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieDetails {
    pub url: String,
    pub name: String,
    pub store_id: String,
}

/// 用户点击时的活动标签页
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: i64,
    #[serde(default)]
    pub url: Option<String>,
}

#[async_trait]
pub trait BrowsingDataHost: Send + Sync {
    /// 批量清理，无延迟上限
    async fn remove(&self, options: &RemovalOptions, data: &DataTypeSet) -> Result<(), HostError>;
}

#[async_trait]
pub trait CookieHost: Send + Sync {
    async fn get_all(&self, domain: &str) -> Result<Vec<Cookie>, HostError>;

    async fn remove(&self, details: &CookieDetails) -> Result<(), HostError>;
}

#[async_trait]
pub trait TabsHost: Send + Sync {
    async fn send_message(&self, tab_id: i64, message: &ToastMessage) -> Result<(), HostError>;

    async fn reload(&self, tab_id: i64) -> Result<(), HostError>;

    /// 向页面注入 toast 脚本；已注入或页面不允许注入时返回错误
    async fn inject_toast(&self, tab_id: i64) -> Result<(), HostError>;

    async fn query_active(&self) -> Result<Option<TabInfo>, HostError>;
}

#[async_trait]
pub trait BadgeHost: Send + Sync {
    async fn set_badge(&self, badge: &Badge) -> Result<(), HostError>;

    async fn clear_badge(&self) -> Result<(), HostError>;
}

/// 清理流程用到的全部宿主接口
#[derive(Clone)]
pub struct Hosts {
    pub browsing_data: Arc<dyn BrowsingDataHost>,
    pub cookies: Arc<dyn CookieHost>,
    pub tabs: Arc<dyn TabsHost>,
    pub badge: Arc<dyn BadgeHost>,
}

impl Hosts {
    /// 同一个对象实现全部接口时使用
    pub fn from_shared<H>(host: Arc<H>) -> Self
    where
        H: BrowsingDataHost + CookieHost + TabsHost + BadgeHost + 'static,
    {
        Self {
            browsing_data: host.clone(),
            cookies: host.clone(),
            tabs: host.clone(),
            badge: host,
        }
    }
}
