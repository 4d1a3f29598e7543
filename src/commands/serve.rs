use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast::{self, error::RecvError};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::commands::status::load_summary;
use crate::modules::action::{ClearAction, RuntimeMessage};
use crate::modules::common::config::AppConfig;
use crate::modules::common::error::CleanerError;
use crate::modules::host::{Hosts, MemoryHost, TabInfo};
use crate::modules::settings::models::Settings;
use crate::modules::storage::{Storage, StorageChange};

#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// 监听端口，默认取配置
    #[arg(long)]
    pub port: Option<u16>,

    /// 内存浏览器中活动标签页的地址，供 clearNow 使用
    #[arg(long)]
    pub active_url: Option<String>,
}

struct ApiState {
    action: ClearAction,
    host: Arc<MemoryHost>,
}

pub async fn execute(cmd: ServeCommand, config: &AppConfig) -> Result<()> {
    let port = cmd.port.unwrap_or(config.api_port);

    let host = Arc::new(MemoryHost::new());
    if let Some(url) = cmd.active_url {
        host.set_active_tab(Some(TabInfo { id: 1, url: Some(url) }));
    }

    let storage = Storage::open(&config.storage_dir);
    spawn_change_listener(storage.sync.subscribe(), storage.local.subscribe());

    let (action, _pump) = ClearAction::new(Hosts::from_shared(host.clone()), storage, config);
    let state = Arc::new(ApiState { action, host });

    let routes = api_routes(state);

    tracing::info!("HTTP API 服务器已启动: http://localhost:{}", port);
    warp::serve(routes).run(([127, 0, 0, 1], port)).await;
    Ok(())
}

fn api_routes(
    state: Arc<ApiState>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let settings_get = warp::path!("api" / "settings")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(get_settings);

    let settings_put = warp::path!("api" / "settings")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(put_settings);

    let status_route = warp::path!("api" / "status")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(get_status);

    let history_route = warp::path!("api" / "history")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(get_history);

    let activate_route = warp::path!("api" / "activate")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(post_activate);

    let message_route = warp::path!("api" / "message")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(post_message);

    let calls_route = warp::path!("api" / "calls")
        .and(warp::get())
        .and(with_state)
        .map(|state: Arc<ApiState>| warp::reply::json(&state.host.calls()));

    // 仅本地调试使用
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "PUT", "POST"])
        .allow_headers(vec!["content-type"]);

    settings_get
        .or(settings_put)
        .or(status_route)
        .or(history_route)
        .or(activate_route)
        .or(message_route)
        .or(calls_route)
        .with(cors)
}

fn json_response<T: Serialize>(result: Result<T, CleanerError>) -> Response {
    match result {
        Ok(value) => warp::reply::json(&value).into_response(),
        Err(e) => {
            tracing::error!("API 请求失败: {}", e);
            warp::reply::with_status(
                warp::reply::json(&serde_json::json!({ "error": e })),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response()
        }
    }
}

async fn get_settings(state: Arc<ApiState>) -> Result<Response, Infallible> {
    Ok(json_response(state.action.settings().load().await))
}

/// 缺失的字段按默认值补齐后整体写入
async fn put_settings(
    body: Map<String, Value>,
    state: Arc<ApiState>,
) -> Result<Response, Infallible> {
    let settings = Settings::from_map(&body);
    let result = state.action.settings().save(&settings).await.map(|_| settings);
    Ok(json_response(result))
}

async fn get_status(state: Arc<ApiState>) -> Result<Response, Infallible> {
    let result = load_summary(state.action.settings(), state.action.history()).await;
    Ok(json_response(result))
}

async fn get_history(state: Arc<ApiState>) -> Result<Response, Infallible> {
    Ok(json_response(state.action.history().last().await))
}

async fn post_activate(tab: TabInfo, state: Arc<ApiState>) -> Result<Response, Infallible> {
    let outcome = state.action.activate(&tab).await;
    Ok(warp::reply::json(&outcome).into_response())
}

async fn post_message(
    message: RuntimeMessage,
    state: Arc<ApiState>,
) -> Result<Response, Infallible> {
    let dispatch = state.action.handle_message(&message);
    Ok(warp::reply::json(&dispatch.response).into_response())
}

/// 记录存储变更，对应弹窗收到变更后刷新
fn spawn_change_listener(
    mut sync: broadcast::Receiver<StorageChange>,
    mut local: broadcast::Receiver<StorageChange>,
) {
    tokio::spawn(async move {
        loop {
            let change = tokio::select! {
                change = sync.recv() => change,
                change = local.recv() => change,
            };
            match change {
                Ok(change) => {
                    tracing::info!("存储已变更 [{}]: {}", change.namespace, change.keys.join(", "));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("存储变更通知积压，跳过 {} 条", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
