use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::modules::action::{ActivationOutcome, ClearAction};
use crate::modules::common::config::AppConfig;
use crate::modules::host::memory::HostCall;
use crate::modules::host::{Cookie, Hosts, MemoryHost, TabInfo};
use crate::modules::storage::Storage;

#[derive(Parser, Debug)]
pub struct ClearCommand {
    /// 活动页面地址，未提供时视为不支持的页面
    #[arg(long)]
    pub url: Option<String>,

    /// 活动标签页 ID
    #[arg(long, default_value_t = 1)]
    pub tab_id: i64,

    /// 预置 Cookie，格式 name@domain，域名前加 ! 表示 secure
    #[arg(long = "cookie")]
    pub cookies: Vec<String>,

    /// 输出格式 (table/json)
    #[arg(long, default_value = "table")]
    pub format: String,
}

pub async fn execute(cmd: ClearCommand, config: &AppConfig) -> Result<()> {
    let host = Arc::new(MemoryHost::new());
    for entry in &cmd.cookies {
        host.add_cookie(parse_cookie(entry)?);
    }

    let storage = Storage::open(&config.storage_dir);
    let (action, pump) = ClearAction::new(Hosts::from_shared(host.clone()), storage, config);

    let tab = TabInfo {
        id: cmd.tab_id,
        url: cmd.url.clone(),
    };
    tracing::info!("开始清理标签页 {} ({:?})", tab.id, tab.url);
    let outcome = action.activate(&tab).await;

    // 关闭发送端后等待剩余 toast 投递完成
    drop(action);
    let _ = pump.await;

    let calls = host.calls();
    if cmd.format == "json" {
        let output = serde_json::json!({
            "outcome": outcome,
            "hostCalls": calls,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_outcome(&outcome);
        print_calls(&calls)?;
    }

    if let ActivationOutcome::Failed { error } = outcome {
        anyhow::bail!("清理失败: {}", error);
    }
    Ok(())
}

fn parse_cookie(entry: &str) -> Result<Cookie> {
    let (name, domain) = entry
        .split_once('@')
        .with_context(|| format!("无效的 Cookie 格式: {} (应为 name@domain)", entry))?;
    if name.is_empty() || domain.is_empty() {
        anyhow::bail!("无效的 Cookie 格式: {}", entry);
    }

    let (domain, secure) = match domain.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (domain, false),
    };
    Ok(Cookie::new(name, domain, "/", secure))
}

fn print_outcome(outcome: &ActivationOutcome) {
    match outcome {
        ActivationOutcome::Cleared { result, run } => {
            println!("✓ {}", result.items_text());
            println!("  范围: {}", result.scope.label());
            println!("  时间: {}", result.cleared_at.to_rfc3339());
            match &run.request.options.origins {
                Some(origins) => println!("  来源: {}", origins.join(", ")),
                None => println!("  来源: (全部)"),
            }
            println!("  类别: {}", run.request.data.categories().join(", "));
            println!("  批量清理: {:?}", run.bulk);
            if let Some(sweep) = &run.cookie_sweep {
                println!(
                    "  Cookie 清扫: 找到 {} 个，删除 {} 个，失败 {} 个{}",
                    sweep.found,
                    sweep.removed,
                    sweep.failed,
                    if sweep.timed_out { " (超时)" } else { "" }
                );
            }
        }
        ActivationOutcome::Unsupported => {
            println!("✗ 当前页面不支持按站点清理，未清理任何数据");
        }
        ActivationOutcome::Failed { error } => {
            println!("! 清理出错: {}", error);
        }
    }
}

fn print_calls(calls: &[HostCall]) -> Result<()> {
    println!("\n宿主调用 ({}):", calls.len());
    for (i, call) in calls.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, serde_json::to_string(call)?);
    }
    Ok(())
}
