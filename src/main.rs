use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use cache_cleaner_lib::commands;
use cache_cleaner_lib::modules::common::config::{AppConfig, STORAGE_DIR_ENV};
use cache_cleaner_lib::modules::common::logging;

#[derive(Parser, Debug)]
#[command(name = "cache-cleaner")]
#[command(about = "浏览器缓存一键清理工具", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// 详细输出模式
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 设置与清理记录的存储目录
    #[arg(long, global = true, env = STORAGE_DIR_ENV)]
    storage_dir: Option<PathBuf>,

    /// 批量清理超时 (毫秒)
    #[arg(long, global = true, env = "CACHE_CLEANER_BULK_TIMEOUT_MS")]
    bulk_timeout_ms: Option<u64>,

    /// Cookie 快速清理超时 (毫秒)
    #[arg(long, global = true, env = "CACHE_CLEANER_SWEEP_TIMEOUT_MS")]
    sweep_timeout_ms: Option<u64>,

    /// Cookie 删除并发数
    #[arg(long, global = true)]
    sweep_concurrency: Option<usize>,
}

impl Cli {
    fn config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::from_env()?.with_storage_dir(self.storage_dir.clone());
        if let Some(ms) = self.bulk_timeout_ms {
            config.timings.bulk_clear_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.sweep_timeout_ms {
            config.timings.cookie_sweep_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = self.sweep_concurrency {
            config.sweep_concurrency = n;
        }
        config.validate()?;
        Ok(config)
    }
}

async fn run(command: commands::Command, config: &AppConfig) -> Result<()> {
    tracing::debug!("配置: {:?}", config);

    match command {
        commands::Command::Init(cmd) => commands::init::execute(cmd, config).await,
        commands::Command::Settings(cmd) => commands::settings::execute(cmd, config).await,
        commands::Command::Clear(cmd) => commands::clear::execute(cmd, config).await,
        commands::Command::History(cmd) => commands::history::execute(cmd, config).await,
        commands::Command::Status(cmd) => commands::status::execute(cmd, config).await,
        commands::Command::Serve(cmd) => commands::serve::execute(cmd, config).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 日志目录取决于配置，配置错误只能直接输出
    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("错误: {}", e);
            process::exit(1);
        }
    };
    logging::init_logging(cli.verbose, &logging::log_dir(&config));

    if let Err(e) = run(cli.command, &config).await {
        if cli.verbose {
            tracing::error!("错误: {:#}", e);
        } else {
            eprintln!("错误: {}", e);
        }
        process::exit(1);
    }
}
