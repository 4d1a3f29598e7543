use anyhow::Result;
use chrono::{Local, Utc};
use clap::Parser;

use crate::modules::common::config::AppConfig;
use crate::modules::history::models::describe_last_cleared;
use crate::modules::history::ClearHistoryLog;
use crate::modules::storage::Storage;

#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// 输出格式 (table/json)
    #[arg(long, default_value = "table")]
    pub format: String,
}

pub async fn execute(cmd: HistoryCommand, config: &AppConfig) -> Result<()> {
    let storage = Storage::open(&config.storage_dir);
    let log = ClearHistoryLog::new(storage.local);
    let last = log.last().await?;

    if cmd.format == "json" {
        println!("{}", serde_json::to_string_pretty(&last)?);
        return Ok(());
    }

    let text = describe_last_cleared(last.as_ref(), Utc::now());
    println!("{}", text.message);
    if let Some(last) = last {
        println!(
            "  {}",
            last.cleared_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
