//! 日志：终端输出，加上数据目录下按天滚动的日志文件

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{Builder, RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::AppConfig;
use super::error::CleanerError;

const LOG_FILE_PREFIX: &str = "cache-cleaner.log";

/// 日志目录跟随存储目录
pub fn log_dir(config: &AppConfig) -> PathBuf {
    config.storage_dir.join("logs")
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender, CleanerError> {
    std::fs::create_dir_all(dir)?;
    Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .map_err(|e| CleanerError::Config(format!("无法创建日志文件: {}", e)))
}

/// 安装全局日志；日志目录不可写时只输出到终端
pub fn init_logging(verbose: bool, dir: &Path) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::new(format!(
        "cache_cleaner={},cache_cleaner_lib={},info",
        level, level
    ));

    let (file_layer, file_error) = match file_appender(dir) {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            // 进程结束前一直写入
            std::mem::forget(guard);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok();

    if let (true, Some(e)) = (installed, file_error) {
        tracing::warn!("日志目录不可用 ({})，仅输出到终端: {}", dir.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cache-cleaner-logging-test-{}-{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    #[test]
    fn log_dir_follows_storage_dir() {
        let config = AppConfig::default().with_storage_dir(Some(PathBuf::from("/tmp/store")));
        assert_eq!(log_dir(&config), PathBuf::from("/tmp/store/logs"));
    }

    #[test]
    fn appender_creates_missing_directory() {
        let root = temp_root("create");
        let dir = root.join("logs");
        assert!(file_appender(&dir).is_ok());
        assert!(dir.is_dir());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn unwritable_directory_is_an_error_not_a_panic() {
        let root = temp_root("blocked");
        std::fs::create_dir_all(&root).unwrap();
        // 普通文件下无法创建目录
        let blocker = root.join("file");
        std::fs::write(&blocker, "x").unwrap();

        let dir = blocker.join("logs");
        assert!(file_appender(&dir).is_err());
        init_logging(false, &dir);

        let _ = std::fs::remove_dir_all(&root);
    }
}
