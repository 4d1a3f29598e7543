pub mod clear;
pub mod history;
pub mod init;
pub mod serve;
pub mod settings;
pub mod status;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 首次安装：补齐缺失的默认设置
    Init(init::InitCommand),

    /// 查看或修改清理设置
    Settings(settings::SettingsCommand),

    /// 对指定页面执行一次清理 (在内存浏览器中预演)
    Clear(clear::ClearCommand),

    /// 查看最近一次清理
    History(history::HistoryCommand),

    /// 弹出窗口摘要：模式、清理项目、上次清理
    Status(status::StatusCommand),

    /// 启动开发用 HTTP API
    Serve(serve::ServeCommand),
}
