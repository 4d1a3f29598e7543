pub mod action;
pub mod cleaner;
pub mod common;
pub mod history;
pub mod host;
pub mod notifier;
pub mod scope;
pub mod settings;
pub mod status;
pub mod storage;
