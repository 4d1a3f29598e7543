use anyhow::Result;
use chrono::Utc;
use clap::Parser;

use crate::modules::common::config::AppConfig;
use crate::modules::common::error::CleanerError;
use crate::modules::common::utils;
use crate::modules::history::ClearHistoryLog;
use crate::modules::settings::SettingsStore;
use crate::modules::status::StatusSummary;
use crate::modules::storage::Storage;

const ITEMS_WIDTH: usize = 72;

#[derive(Parser, Debug)]
pub struct StatusCommand {
    /// 输出格式 (table/json)
    #[arg(long, default_value = "table")]
    pub format: String,
}

/// 读取设置与上次清理记录，组装弹窗摘要
pub async fn load_summary(
    settings: &SettingsStore,
    history: &ClearHistoryLog,
) -> Result<StatusSummary, CleanerError> {
    let current = settings.load().await?;
    let last = history.last().await?;
    Ok(StatusSummary::build(&current, last.as_ref(), Utc::now()))
}

pub async fn execute(cmd: StatusCommand, config: &AppConfig) -> Result<()> {
    let storage = Storage::open(&config.storage_dir);
    let settings = SettingsStore::new(storage.sync);
    let history = ClearHistoryLog::new(storage.local);
    let summary = load_summary(&settings, &history).await?;

    if cmd.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", summary.mode.title);
    println!("  {}", summary.mode.description);
    println!();
    println!("{}", utils::truncate_string(&summary.items_line(), ITEMS_WIDTH));
    println!();
    println!(
        "{}{}",
        summary.last_cleared.message,
        if summary.last_cleared.recent { " ●" } else { "" }
    );
    Ok(())
}
