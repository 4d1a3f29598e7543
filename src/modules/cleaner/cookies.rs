//! 按来源快速清理 Cookie
//!
//! 批量清理本身已经覆盖 Cookie，这里只是叠加的加速手段：并行查询、并行删除，
//! 单个失败与整体超时都不影响清理结果。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use url::Url;

use super::models::SweepReport;
use crate::modules::host::{Cookie, CookieDetails, CookieHost};

#[derive(Default)]
struct Counters {
    found: AtomicUsize,
    removed: AtomicUsize,
    failed: AtomicUsize,
}

/// 删除 Cookie 时使用的地址：按 secure 选择协议，域名去掉前导点
pub fn cookie_url(cookie: &Cookie) -> String {
    let scheme = if cookie.secure { "https" } else { "http" };
    let domain = cookie.domain.trim_start_matches('.');
    format!("{}://{}{}", scheme, domain, cookie.path)
}

pub fn removal_details(cookie: &Cookie) -> CookieDetails {
    CookieDetails {
        url: cookie_url(cookie),
        name: cookie.name.clone(),
        store_id: cookie.store_id.clone(),
    }
}

/// 来源对应的主机名
fn origin_host(origin: &str) -> Option<String> {
    Url::parse(origin)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}

/// 清理这些来源下的所有 Cookie，最多等待 `timeout`
///
/// 超时后清理任务继续在后台运行，返回截至超时的统计。
pub async fn sweep_origins(
    host: Arc<dyn CookieHost>,
    origins: &[String],
    timeout: Duration,
    concurrency: usize,
) -> SweepReport {
    let domains: Vec<String> = origins
        .iter()
        .filter_map(|origin| {
            let host = origin_host(origin);
            if host.is_none() {
                tracing::debug!("无法解析来源 {}，跳过 Cookie 清理", origin);
            }
            host
        })
        .collect();

    let counters = Arc::new(Counters::default());
    let task = tokio::spawn(sweep_domains(
        host,
        domains,
        concurrency.max(1),
        counters.clone(),
    ));

    let timed_out = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(())) => false,
        Ok(Err(e)) => {
            tracing::debug!("Cookie 清理任务异常: {}", e);
            false
        }
        Err(_) => {
            tracing::info!("Cookie 清理超时，继续执行");
            true
        }
    };

    SweepReport {
        found: counters.found.load(Ordering::SeqCst),
        removed: counters.removed.load(Ordering::SeqCst),
        failed: counters.failed.load(Ordering::SeqCst),
        timed_out,
    }
}

async fn sweep_domains(
    host: Arc<dyn CookieHost>,
    domains: Vec<String>,
    concurrency: usize,
    counters: Arc<Counters>,
) {
    let lookups = domains.into_iter().map(|domain| {
        let host = host.clone();
        async move {
            match host.get_all(&domain).await {
                Ok(cookies) => cookies,
                Err(e) => {
                    tracing::debug!("查询 {} 的 Cookie 失败: {}", domain, e);
                    Vec::new()
                }
            }
        }
    });

    let cookies: Vec<Cookie> = futures::future::join_all(lookups)
        .await
        .into_iter()
        .flatten()
        .collect();
    counters.found.fetch_add(cookies.len(), Ordering::SeqCst);

    stream::iter(cookies)
        .map(|cookie| {
            let host = host.clone();
            async move {
                let details = removal_details(&cookie);
                let result = host.remove(&details).await;
                result.map_err(|e| (details, e))
            }
        })
        .buffer_unordered(concurrency)
        .for_each(|result| {
            match result {
                Ok(()) => {
                    counters.removed.fetch_add(1, Ordering::SeqCst);
                }
                Err((details, e)) => {
                    tracing::debug!("删除 Cookie {} ({}) 失败: {}", details.name, details.url, e);
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                }
            }
            futures::future::ready(())
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::host::MemoryHost;

    fn origins() -> Vec<String> {
        vec!["https://example.com".to_string()]
    }

    #[test]
    fn cookie_url_follows_secure_flag_and_strips_leading_dot() {
        assert_eq!(
            cookie_url(&Cookie::new("sid", ".example.com", "/", true)),
            "https://example.com/"
        );
        assert_eq!(
            cookie_url(&Cookie::new("pref", "example.com", "/app", false)),
            "http://example.com/app"
        );
    }

    #[tokio::test]
    async fn removes_every_cookie_of_the_origin() {
        let host = Arc::new(MemoryHost::new());
        host.add_cookie(Cookie::new("a", ".example.com", "/", true));
        host.add_cookie(Cookie::new("b", "www.example.com", "/", false));
        host.add_cookie(Cookie::new("c", "other.org", "/", false));

        let report = sweep_origins(host.clone(), &origins(), Duration::from_secs(1), 4).await;

        assert_eq!(
            report,
            SweepReport {
                found: 2,
                removed: 2,
                failed: 0,
                timed_out: false
            }
        );
        let left: Vec<_> = host.cookies().into_iter().map(|c| c.name).collect();
        assert_eq!(left, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn individual_failures_do_not_abort_the_sweep() {
        let host = Arc::new(MemoryHost::new());
        host.add_cookie(Cookie::new("a", "example.com", "/", true));
        host.add_cookie(Cookie::new("stuck", "example.com", "/", true));
        host.add_cookie(Cookie::new("b", "example.com", "/", true));
        host.fail_cookie("stuck");

        let report = sweep_origins(host.clone(), &origins(), Duration::from_secs(1), 1).await;

        assert_eq!(report.found, 3);
        assert_eq!(report.removed, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.timed_out);
    }

    #[tokio::test]
    async fn slow_sweep_is_abandoned_at_the_deadline() {
        let host = Arc::new(MemoryHost::new());
        host.add_cookie(Cookie::new("a", "example.com", "/", true));
        host.set_cookie_latency(Duration::from_millis(500));

        let started = std::time::Instant::now();
        let report = sweep_origins(host, &origins(), Duration::from_millis(30), 4).await;

        assert!(report.timed_out);
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn unparseable_origins_are_skipped() {
        let host = Arc::new(MemoryHost::new());
        let report = sweep_origins(
            host.clone(),
            &["not an origin".to_string()],
            Duration::from_secs(1),
            4,
        )
        .await;

        assert_eq!(report, SweepReport::default());
        assert!(host.calls().is_empty());
    }
}
