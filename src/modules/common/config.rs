//! 运行配置
//!
//! 存储目录、各阶段的超时/延迟以及开发 API 端口。命令行参数与环境变量
//! 在 `main` 中解析后汇总到 [`AppConfig`]。

use std::path::PathBuf;
use std::time::Duration;

use super::error::CleanerError;

pub const STORAGE_DIR_ENV: &str = "CACHE_CLEANER_STORAGE_DIR";
pub const API_PORT_ENV: &str = "CACHE_CLEANER_API_PORT";
pub const DEFAULT_API_PORT: u16 = 8080;
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 16;

/// 清理流程中所有固定的等待与超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// 批量清理的超时，超时视为完成
    pub bulk_clear_timeout: Duration,
    /// Cookie 快速清理的超时，超时直接忽略
    pub cookie_sweep_timeout: Duration,
    /// 注入 toast 脚本后等待其就绪
    pub toast_ready_delay: Duration,
    /// 成功提示展示多久后刷新页面
    pub reload_delay: Duration,
    /// 错误提示自动隐藏的延迟
    pub error_hide_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            bulk_clear_timeout: Duration::from_secs(5),
            cookie_sweep_timeout: Duration::from_secs(2),
            toast_ready_delay: Duration::from_millis(50),
            reload_delay: Duration::from_millis(400),
            error_hide_delay: Duration::from_secs(3),
        }
    }
}

impl Timings {
    /// 所有等待都很短的配置，测试中使用
    pub fn immediate() -> Self {
        Self {
            bulk_clear_timeout: Duration::from_millis(200),
            cookie_sweep_timeout: Duration::from_millis(100),
            toast_ready_delay: Duration::ZERO,
            reload_delay: Duration::ZERO,
            error_hide_delay: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_dir: PathBuf,
    pub timings: Timings,
    pub sweep_concurrency: usize,
    pub api_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_data_dir(),
            timings: Timings::default(),
            sweep_concurrency: DEFAULT_SWEEP_CONCURRENCY,
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl AppConfig {
    /// 只读取环境变量，其余取默认值
    pub fn from_env() -> Result<Self, CleanerError> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var(STORAGE_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.storage_dir = PathBuf::from(dir);
            }
        }

        if let Ok(port) = std::env::var(API_PORT_ENV) {
            config.api_port = port
                .trim()
                .parse()
                .map_err(|_| CleanerError::Config(format!("{} 不是有效端口: {}", API_PORT_ENV, port)))?;
        }

        Ok(config)
    }

    pub fn with_storage_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.storage_dir = dir;
        }
        self
    }

    pub fn validate(&self) -> Result<(), CleanerError> {
        if self.sweep_concurrency == 0 {
            return Err(CleanerError::Config("Cookie 并发数必须大于 0".to_string()));
        }
        if self.timings.bulk_clear_timeout.is_zero() {
            return Err(CleanerError::Config("批量清理超时必须大于 0".to_string()));
        }
        Ok(())
    }
}

/// 默认数据目录
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cache-cleaner")
}
