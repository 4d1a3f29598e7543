use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::modules::common::config::AppConfig;
use crate::modules::settings::models::{item_label, Scope, Settings, SETTINGS_KEYS};
use crate::modules::settings::SettingsStore;
use crate::modules::storage::Storage;

#[derive(Parser, Debug)]
pub struct SettingsCommand {
    #[command(subcommand)]
    pub action: SettingsAction,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// 显示当前设置
    Show {
        /// 输出格式 (table/json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// 修改设置，未指定的项目保持不变
    Set(SetArgs),
}

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    /// 清理范围 (current|all)
    #[arg(long)]
    pub scope: Option<Scope>,

    #[arg(long)]
    pub cookies: Option<bool>,

    #[arg(long)]
    pub cache: Option<bool>,

    #[arg(long)]
    pub local_storage: Option<bool>,

    #[arg(long)]
    pub session_storage: Option<bool>,

    #[arg(long)]
    pub indexed_db: Option<bool>,

    #[arg(long)]
    pub service_workers: Option<bool>,

    #[arg(long)]
    pub history: Option<bool>,
}

impl SetArgs {
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(scope) = self.scope {
            settings.scope = scope;
        }
        let flags = [
            (self.cookies, &mut settings.clear_cookies),
            (self.cache, &mut settings.clear_cache),
            (self.local_storage, &mut settings.clear_local_storage),
            (self.session_storage, &mut settings.clear_session_storage),
            (self.indexed_db, &mut settings.clear_indexed_db),
            (self.service_workers, &mut settings.clear_service_workers),
            (self.history, &mut settings.clear_history),
        ];
        for (value, field) in flags {
            if let Some(value) = value {
                *field = value;
            }
        }
        settings
    }

    fn is_empty(&self) -> bool {
        self.scope.is_none()
            && self.cookies.is_none()
            && self.cache.is_none()
            && self.local_storage.is_none()
            && self.session_storage.is_none()
            && self.indexed_db.is_none()
            && self.service_workers.is_none()
            && self.history.is_none()
    }
}

pub async fn execute(cmd: SettingsCommand, config: &AppConfig) -> Result<()> {
    let storage = Storage::open(&config.storage_dir);
    let store = SettingsStore::new(storage.sync);

    match cmd.action {
        SettingsAction::Show { format } => {
            let settings = store.load().await?;
            print_settings(&settings, &format)?;
        }
        SettingsAction::Set(args) => {
            if args.is_empty() {
                anyhow::bail!("没有指定要修改的设置项");
            }

            let settings = args.apply(store.load().await?);
            store.save(&settings).await?;
            println!("设置已保存\n");
            print_settings(&settings, "table")?;
        }
    }

    Ok(())
}

fn print_settings(settings: &Settings, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    let map = settings.to_map();
    println!("{:<22} {}", "范围", settings.scope.label());
    for key in SETTINGS_KEYS.iter().skip(1) {
        let enabled = map.get(*key).and_then(|v| v.as_bool()).unwrap_or(false);
        println!(
            "{:<22} {}",
            item_label(key),
            if enabled { "✓" } else { "-" }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_changes_only_given_fields() {
        let args = SetArgs {
            scope: Some(Scope::All),
            history: Some(true),
            cache: Some(false),
            ..SetArgs::default()
        };
        let settings = args.apply(Settings::default());

        assert_eq!(settings.scope, Scope::All);
        assert!(settings.clear_history);
        assert!(!settings.clear_cache);
        assert!(settings.clear_cookies);
        assert!(!args.is_empty());
        assert!(SetArgs::default().is_empty());
    }
}
