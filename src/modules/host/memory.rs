//! 内存中的浏览器宿主
//!
//! 保存一个 Cookie 罐、记录每一次宿主调用，并可以注入延迟与失败。
//! 命令行预演与测试都使用它。

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use super::{BadgeHost, BrowsingDataHost, Cookie, CookieDetails, CookieHost, HostError, TabInfo, TabsHost};
use crate::modules::cleaner::models::{DataTypeSet, RemovalOptions};
use crate::modules::notifier::models::{Badge, ToastMessage};

/// 一次宿主调用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    RemoveBrowsingData {
        options: RemovalOptions,
        data: DataTypeSet,
    },
    GetCookies {
        domain: String,
    },
    RemoveCookie {
        details: CookieDetails,
    },
    SendMessage {
        tab_id: i64,
        message: ToastMessage,
    },
    InjectToast {
        tab_id: i64,
    },
    Reload {
        tab_id: i64,
    },
    QueryActive,
    SetBadge {
        text: String,
        color: String,
    },
    ClearBadge,
}

#[derive(Default)]
struct State {
    calls: Vec<HostCall>,
    cookies: Vec<Cookie>,
    active_tab: Option<TabInfo>,
    current_badge: Option<Badge>,
    badge_history: Vec<String>,
    completed_removals: usize,
    failed_messages: usize,
    removal_latency: Duration,
    removal_error: Option<HostError>,
    cookie_latency: Duration,
    failing_cookies: HashSet<String>,
    fail_messages: bool,
    fail_reload: bool,
}

#[derive(Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    fn record(&self, call: HostCall) {
        self.with_state(|s| s.calls.push(call));
    }

    // ---- 配置 ----

    pub fn add_cookie(&self, cookie: Cookie) {
        self.with_state(|s| s.cookies.push(cookie));
    }

    pub fn set_active_tab(&self, tab: Option<TabInfo>) {
        self.with_state(|s| s.active_tab = tab);
    }

    /// 批量清理在返回前等待的时间
    pub fn set_removal_latency(&self, latency: Duration) {
        self.with_state(|s| s.removal_latency = latency);
    }

    pub fn fail_removal(&self, error: HostError) {
        self.with_state(|s| s.removal_error = Some(error));
    }

    /// 每次 Cookie 查询与删除的延迟
    pub fn set_cookie_latency(&self, latency: Duration) {
        self.with_state(|s| s.cookie_latency = latency);
    }

    /// 删除该名称的 Cookie 时返回错误
    pub fn fail_cookie(&self, name: &str) {
        self.with_state(|s| {
            s.failing_cookies.insert(name.to_string());
        });
    }

    pub fn fail_messages(&self, fail: bool) {
        self.with_state(|s| s.fail_messages = fail);
    }

    pub fn fail_reload(&self, fail: bool) {
        self.with_state(|s| s.fail_reload = fail);
    }

    // ---- 观察 ----

    pub fn calls(&self) -> Vec<HostCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// 已成功送达的 toast 消息
    pub fn toasts(&self) -> Vec<(i64, ToastMessage)> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|call| match call {
                    HostCall::SendMessage { tab_id, message } => Some((*tab_id, message.clone())),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn removals(&self) -> Vec<(RemovalOptions, DataTypeSet)> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|call| match call {
                    HostCall::RemoveBrowsingData { options, data } => Some((options.clone(), *data)),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn reloads(&self) -> Vec<i64> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|call| match call {
                    HostCall::Reload { tab_id } => Some(*tab_id),
                    _ => None,
                })
                .collect()
        })
    }

    /// 已执行完毕（未被延迟或失败打断）的批量清理次数
    pub fn completed_removals(&self) -> usize {
        self.with_state(|s| s.completed_removals)
    }

    pub fn cookies(&self) -> Vec<Cookie> {
        self.with_state(|s| s.cookies.clone())
    }

    pub fn failed_message_count(&self) -> usize {
        self.with_state(|s| s.failed_messages)
    }

    pub fn badge_history(&self) -> Vec<String> {
        self.with_state(|s| s.badge_history.clone())
    }

    pub fn current_badge(&self) -> Option<Badge> {
        self.with_state(|s| s.current_badge.clone())
    }
}

/// Cookie 域名是否属于给定域名（含子域）
fn domain_matches(cookie_domain: &str, domain: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    cookie_domain == domain || cookie_domain.ends_with(&format!(".{}", domain))
}

#[async_trait]
impl BrowsingDataHost for MemoryHost {
    async fn remove(&self, options: &RemovalOptions, data: &DataTypeSet) -> Result<(), HostError> {
        let (latency, error) = self.with_state(|s| {
            s.calls.push(HostCall::RemoveBrowsingData {
                options: options.clone(),
                data: *data,
            });
            (s.removal_latency, s.removal_error.clone())
        });

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = error {
            return Err(error);
        }

        self.with_state(|s| {
            if data.cookies {
                match &options.origins {
                    Some(origins) => {
                        let hosts: Vec<String> = origins
                            .iter()
                            .filter_map(|o| Url::parse(o).ok())
                            .filter_map(|u| u.host_str().map(str::to_string))
                            .collect();
                        s.cookies
                            .retain(|c| !hosts.iter().any(|h| domain_matches(&c.domain, h)));
                    }
                    None => s.cookies.clear(),
                }
            }
            s.completed_removals += 1;
        });

        Ok(())
    }
}

#[async_trait]
impl CookieHost for MemoryHost {
    async fn get_all(&self, domain: &str) -> Result<Vec<Cookie>, HostError> {
        let latency = self.with_state(|s| {
            s.calls.push(HostCall::GetCookies {
                domain: domain.to_string(),
            });
            s.cookie_latency
        });

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        Ok(self.with_state(|s| {
            s.cookies
                .iter()
                .filter(|c| domain_matches(&c.domain, domain))
                .cloned()
                .collect()
        }))
    }

    async fn remove(&self, details: &CookieDetails) -> Result<(), HostError> {
        let (latency, fails) = self.with_state(|s| {
            s.calls.push(HostCall::RemoveCookie {
                details: details.clone(),
            });
            (s.cookie_latency, s.failing_cookies.contains(&details.name))
        });

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if fails {
            return Err(HostError::Other(format!("无法删除 Cookie: {}", details.name)));
        }

        let url = Url::parse(&details.url)
            .map_err(|e| HostError::Other(format!("无效的 Cookie 地址 {}: {}", details.url, e)))?;
        let host = url.host_str().unwrap_or_default().to_string();

        self.with_state(|s| {
            s.cookies.retain(|c| {
                !(c.name == details.name
                    && c.store_id == details.store_id
                    && c.domain.trim_start_matches('.').eq_ignore_ascii_case(&host)
                    && c.path == url.path())
            });
        });

        Ok(())
    }
}

#[async_trait]
impl TabsHost for MemoryHost {
    async fn send_message(&self, tab_id: i64, message: &ToastMessage) -> Result<(), HostError> {
        self.with_state(|s| {
            if s.fail_messages {
                s.failed_messages += 1;
                return Err(HostError::Other(
                    "Could not establish connection. Receiving end does not exist.".to_string(),
                ));
            }
            s.calls.push(HostCall::SendMessage {
                tab_id,
                message: message.clone(),
            });
            Ok(())
        })
    }

    async fn reload(&self, tab_id: i64) -> Result<(), HostError> {
        self.with_state(|s| {
            if s.fail_reload {
                return Err(HostError::NoSuchTab(tab_id));
            }
            s.calls.push(HostCall::Reload { tab_id });
            Ok(())
        })
    }

    async fn inject_toast(&self, tab_id: i64) -> Result<(), HostError> {
        self.record(HostCall::InjectToast { tab_id });
        Ok(())
    }

    async fn query_active(&self) -> Result<Option<TabInfo>, HostError> {
        self.record(HostCall::QueryActive);
        Ok(self.with_state(|s| s.active_tab.clone()))
    }
}

#[async_trait]
impl BadgeHost for MemoryHost {
    async fn set_badge(&self, badge: &Badge) -> Result<(), HostError> {
        self.with_state(|s| {
            s.calls.push(HostCall::SetBadge {
                text: badge.text.clone(),
                color: badge.color.clone(),
            });
            s.badge_history.push(badge.text.clone());
            s.current_badge = Some(badge.clone());
        });
        Ok(())
    }

    async fn clear_badge(&self) -> Result<(), HostError> {
        self.with_state(|s| {
            s.calls.push(HostCall::ClearBadge);
            s.badge_history.push(String::new());
            s.current_badge = None;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, domain: &str, secure: bool) -> Cookie {
        Cookie::new(name, domain, "/", secure)
    }

    #[test]
    fn domain_matching_includes_subdomains_only() {
        assert!(domain_matches(".example.com", "example.com"));
        assert!(domain_matches("shop.example.com", "example.com"));
        assert!(!domain_matches("badexample.com", "example.com"));
        assert!(!domain_matches("example.org", "example.com"));
    }

    #[tokio::test]
    async fn get_all_filters_by_domain() {
        let host = MemoryHost::new();
        host.add_cookie(cookie("a", ".example.com", true));
        host.add_cookie(cookie("b", "other.org", false));

        let found = host.get_all("example.com").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "a");
    }

    #[tokio::test]
    async fn remove_cookie_by_exact_match() {
        let host = MemoryHost::new();
        host.add_cookie(cookie("a", ".example.com", true));
        host.add_cookie(cookie("b", "example.com", false));

        CookieHost::remove(
            &host,
            &CookieDetails {
                url: "https://example.com/".to_string(),
                name: "a".to_string(),
                store_id: "0".to_string(),
            },
        )
        .await
        .unwrap();

        let left: Vec<_> = host.cookies().into_iter().map(|c| c.name).collect();
        assert_eq!(left, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn restricted_bulk_clear_drops_only_that_sites_cookies() {
        let host = MemoryHost::new();
        host.add_cookie(cookie("a", ".example.com", true));
        host.add_cookie(cookie("b", "other.org", false));

        let options = RemovalOptions {
            since: 0,
            origins: Some(vec!["https://example.com".to_string()]),
        };
        let data = DataTypeSet {
            cookies: true,
            ..DataTypeSet::default()
        };
        BrowsingDataHost::remove(&host, &options, &data).await.unwrap();

        assert_eq!(host.cookies().len(), 1);
        assert_eq!(host.completed_removals(), 1);
        assert_eq!(host.removals().len(), 1);
    }

    #[tokio::test]
    async fn failing_removal_is_recorded_but_not_completed() {
        let host = MemoryHost::new();
        host.fail_removal(HostError::PermissionDenied("browsingData".to_string()));

        let options = RemovalOptions { since: 0, origins: None };
        let result = BrowsingDataHost::remove(&host, &options, &DataTypeSet::default()).await;

        assert!(matches!(result, Err(HostError::PermissionDenied(_))));
        assert_eq!(host.removals().len(), 1);
        assert_eq!(host.completed_removals(), 0);
    }
}
