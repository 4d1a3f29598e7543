pub mod cookies;
pub mod models;

use std::sync::Arc;
use std::time::Duration;

use crate::modules::common::config::{AppConfig, Timings};
use crate::modules::common::error::CleanerError;
use crate::modules::host::{BrowsingDataHost, CookieHost};
use crate::modules::scope::ScopeResolution;
use crate::modules::settings::models::Settings;
use models::{BulkClear, ClearRequest, DataTypeSet, RemovalOptions, RunOutcome};

/// 构建一次清理请求
pub fn build_request(settings: &Settings, scope: &ScopeResolution) -> ClearRequest {
    ClearRequest {
        options: RemovalOptions::for_scope(scope),
        data: DataTypeSet::from_settings(settings),
    }
}

/// 清理编排：一次有超时上限的批量清理，加上按来源的 Cookie 快速清理
#[derive(Clone)]
pub struct ClearOrchestrator {
    browsing_data: Arc<dyn BrowsingDataHost>,
    cookies: Arc<dyn CookieHost>,
    bulk_clear_timeout: Duration,
    cookie_sweep_timeout: Duration,
    sweep_concurrency: usize,
}

impl ClearOrchestrator {
    pub fn new(
        browsing_data: Arc<dyn BrowsingDataHost>,
        cookies: Arc<dyn CookieHost>,
        timings: &Timings,
        sweep_concurrency: usize,
    ) -> Self {
        Self {
            browsing_data,
            cookies,
            bulk_clear_timeout: timings.bulk_clear_timeout,
            cookie_sweep_timeout: timings.cookie_sweep_timeout,
            sweep_concurrency,
        }
    }

    pub fn from_config(
        browsing_data: Arc<dyn BrowsingDataHost>,
        cookies: Arc<dyn CookieHost>,
        config: &AppConfig,
    ) -> Self {
        Self::new(browsing_data, cookies, &config.timings, config.sweep_concurrency)
    }

    /// 执行清理
    ///
    /// 批量清理超时视为完成；除超时外的宿主错误直接返回。Cookie 快速清理只在
    /// 限定来源且需要清理 Cookie 时执行，其结果不影响返回值。
    pub async fn run(
        &self,
        settings: &Settings,
        scope: &ScopeResolution,
    ) -> Result<RunOutcome, CleanerError> {
        if *scope == ScopeResolution::Unsupported {
            return Err(CleanerError::UnsupportedPage(
                "非 http/https 页面不能按站点清理".to_string(),
            ));
        }

        let request = build_request(settings, scope);
        match &request.options.origins {
            Some(origins) => tracing::info!("按来源清理: {:?}", origins),
            None => tracing::info!("清理所有站点"),
        }
        tracing::debug!("清理类别: {:?}", request.data.categories());

        let started = std::time::Instant::now();
        let bulk = self.bulk_clear(&request).await?;
        tracing::info!(
            "批量清理结束: {:?} (耗时 {}ms)",
            bulk,
            started.elapsed().as_millis()
        );

        let cookie_sweep = match &request.options.origins {
            Some(origins) if !origins.is_empty() && request.data.cookies => {
                let report = cookies::sweep_origins(
                    self.cookies.clone(),
                    origins,
                    self.cookie_sweep_timeout,
                    self.sweep_concurrency,
                )
                .await;
                tracing::debug!("Cookie 快速清理: {:?}", report);
                Some(report)
            }
            _ => None,
        };

        Ok(RunOutcome {
            request,
            bulk,
            cookie_sweep,
        })
    }

    /// 批量清理与计时器赛跑，超时不取消浏览器端的清理
    async fn bulk_clear(&self, request: &ClearRequest) -> Result<BulkClear, CleanerError> {
        let host = self.browsing_data.clone();
        let options = request.options.clone();
        let data = request.data;
        let task = tokio::spawn(async move { host.remove(&options, &data).await });

        match tokio::time::timeout(self.bulk_clear_timeout, task).await {
            Ok(Ok(Ok(()))) => Ok(BulkClear::Completed),
            Ok(Ok(Err(e))) => {
                tracing::error!("批量清理失败: {} (请求: {:?})", e, request);
                Err(CleanerError::Host(e))
            }
            Ok(Err(e)) => Err(CleanerError::Other(format!("批量清理任务异常: {}", e))),
            Err(_) => {
                tracing::warn!(
                    "批量清理超过 {}ms，按完成处理",
                    self.bulk_clear_timeout.as_millis()
                );
                Ok(BulkClear::TimedOut)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::host::{Cookie, HostError, MemoryHost};
    use crate::modules::host::memory::HostCall;
    use crate::modules::settings::models::Scope;

    fn orchestrator(host: &Arc<MemoryHost>) -> ClearOrchestrator {
        ClearOrchestrator::new(host.clone(), host.clone(), &Timings::immediate(), 4)
    }

    fn example_origin() -> ScopeResolution {
        ScopeResolution::SingleOrigin("https://example.com".to_string())
    }

    #[tokio::test]
    async fn restricted_run_with_cookies_sweeps_after_the_bulk_clear() {
        let host = Arc::new(MemoryHost::new());
        host.add_cookie(Cookie::new("sid", ".example.com", "/", true));

        let outcome = orchestrator(&host)
            .run(&Settings::default(), &example_origin())
            .await
            .unwrap();

        assert_eq!(outcome.bulk, BulkClear::Completed);
        assert!(outcome.cookie_sweep.is_some());

        let calls = host.calls();
        assert!(matches!(calls[0], HostCall::RemoveBrowsingData { .. }));
        assert!(matches!(calls[1], HostCall::GetCookies { ref domain } if domain == "example.com"));

        let (options, data) = &host.removals()[0];
        assert_eq!(options.since, 0);
        assert_eq!(options.origins, Some(vec!["https://example.com".to_string()]));
        assert_eq!(*data, DataTypeSet::from_settings(&Settings::default()));
    }

    #[tokio::test]
    async fn all_sites_run_skips_the_cookie_sweep() {
        let host = Arc::new(MemoryHost::new());
        let settings = Settings {
            scope: Scope::All,
            ..Settings::default()
        };

        let outcome = orchestrator(&host)
            .run(&settings, &ScopeResolution::AllSites)
            .await
            .unwrap();

        assert!(outcome.cookie_sweep.is_none());
        assert_eq!(outcome.request.options.origins, None);
        assert_eq!(host.calls().len(), 1);
    }

    #[tokio::test]
    async fn no_sweep_when_cookies_are_not_requested() {
        let host = Arc::new(MemoryHost::new());
        let settings = Settings {
            clear_cookies: false,
            ..Settings::default()
        };

        let outcome = orchestrator(&host).run(&settings, &example_origin()).await.unwrap();
        assert!(outcome.cookie_sweep.is_none());
        assert!(!outcome.request.data.cookies);
    }

    #[tokio::test]
    async fn bulk_timeout_is_a_soft_completion() {
        let host = Arc::new(MemoryHost::new());
        host.set_removal_latency(Duration::from_millis(600));

        let outcome = orchestrator(&host)
            .run(&Settings::default(), &example_origin())
            .await
            .unwrap();

        assert_eq!(outcome.bulk, BulkClear::TimedOut);
        assert_eq!(host.completed_removals(), 0);

        // 超时后浏览器端的清理仍在继续
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(host.completed_removals(), 1);
    }

    #[tokio::test]
    async fn host_error_is_a_hard_failure() {
        let host = Arc::new(MemoryHost::new());
        host.fail_removal(HostError::PermissionDenied("browsingData".to_string()));

        let result = orchestrator(&host)
            .run(&Settings::default(), &example_origin())
            .await;

        assert!(matches!(result, Err(CleanerError::Host(HostError::PermissionDenied(_)))));
        // 批量清理失败后不再执行 Cookie 快速清理
        assert_eq!(host.calls().len(), 1);
    }

    #[tokio::test]
    async fn unsupported_scope_is_refused_without_host_calls() {
        let host = Arc::new(MemoryHost::new());

        let result = orchestrator(&host)
            .run(&Settings::default(), &ScopeResolution::Unsupported)
            .await;

        assert!(matches!(result, Err(CleanerError::UnsupportedPage(_))));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn build_request_for_example_scenario() {
        let request = build_request(&Settings::default(), &example_origin());
        assert_eq!(
            request.data.categories(),
            vec!["cookies", "cache", "cacheStorage", "fileSystems", "webSQL", "localStorage"]
        );
        assert!(request.options.is_restricted());
    }
}
