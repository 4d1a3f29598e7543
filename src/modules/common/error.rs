use thiserror::Error;

use crate::modules::host::HostError;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("浏览器接口错误: {0}")]
    Host(#[from] HostError),

    #[error("当前页面不支持按站点清理: {0}")]
    UnsupportedPage(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("文件系统错误: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serde(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("超时: {0}")]
    Timeout(String),

    #[error("其他错误: {0}")]
    Other(String),
}

impl From<serde_json::Error> for CleanerError {
    fn from(error: serde_json::Error) -> Self {
        CleanerError::Serde(error.to_string())
    }
}

impl serde::Serialize for CleanerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_errors_convert_and_keep_message() {
        let error: CleanerError = HostError::PermissionDenied("browsingData".to_string()).into();
        assert!(matches!(error, CleanerError::Host(_)));
        assert!(error.to_string().contains("browsingData"));
    }

    #[test]
    fn serializes_as_display_string() {
        let error = CleanerError::Storage("sync 命名空间不可用".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, format!("\"{}\"", error));
    }
}
