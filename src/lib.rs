pub mod commands;
pub mod modules;

pub use modules::common::error::CleanerError;
pub use modules::common::config;
pub use modules::action;
pub use modules::cleaner;
pub use modules::history;
pub use modules::host;
pub use modules::notifier;
pub use modules::scope;
pub use modules::settings;
pub use modules::status;
pub use modules::storage;
