pub mod models;

use crate::modules::common::error::CleanerError;
use crate::modules::storage::Namespace;
use models::{ClearRunResult, HISTORY_KEYS};

/// 最近一次清理记录，保存在 local 命名空间，每次覆盖
#[derive(Clone)]
pub struct ClearHistoryLog {
    namespace: Namespace,
}

impl ClearHistoryLog {
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub async fn record(&self, result: &ClearRunResult) -> Result<(), CleanerError> {
        self.namespace.set(result.to_map()).await?;
        tracing::debug!("已记录清理结果: {:?}", result);
        Ok(())
    }

    pub async fn last(&self) -> Result<Option<ClearRunResult>, CleanerError> {
        let stored = self.namespace.get(HISTORY_KEYS).await?;
        Ok(ClearRunResult::from_map(&stored))
    }
}
