use anyhow::Result;
use clap::Parser;

use crate::modules::common::config::AppConfig;
use crate::modules::settings::SettingsStore;
use crate::modules::storage::Storage;

#[derive(Parser, Debug)]
pub struct InitCommand {}

pub async fn execute(_cmd: InitCommand, config: &AppConfig) -> Result<()> {
    let storage = Storage::open(&config.storage_dir);
    let store = SettingsStore::new(storage.sync);

    let written = store.install_defaults().await?;
    if written.is_empty() {
        println!("设置已完整，无需写入默认值");
    } else {
        println!("已写入默认设置:");
        for key in &written {
            println!("  {}", key);
        }
    }

    println!("\n存储目录: {}", config.storage_dir.display());
    Ok(())
}
