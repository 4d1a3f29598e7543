//! 键值持久化存储
//!
//! 两个互相独立的命名空间：`sync` 保存用户设置，`local` 保存最近一次清理
//! 记录。每个命名空间支持按键读取、部分写入，并在写入成功后广播变更。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, Mutex};

use crate::modules::common::error::CleanerError;

pub const SYNC_NAMESPACE: &str = "sync";
pub const LOCAL_NAMESPACE: &str = "local";

const CHANGE_CHANNEL_CAPACITY: usize = 32;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取指定的键，不存在的键不出现在结果中
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, CleanerError>;

    /// 写入给定的键，其余键保持不变
    async fn set(&self, values: Map<String, Value>) -> Result<(), CleanerError>;
}

/// 单个 JSON 文件作为一个命名空间，每次写入整份文件
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取整份文件；内容损坏时移到一旁并按空命名空间处理，读取方回落到默认值
    async fn read_all(&self) -> Result<Map<String, Value>, CleanerError> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Map::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => {
                self.quarantine("内容不是 JSON 对象").await;
                Ok(Map::new())
            }
            Err(e) => {
                self.quarantine(&e.to_string()).await;
                Ok(Map::new())
            }
        }
    }

    /// 把损坏的文件改名为 `<name>.corrupt`，保留现场
    async fn quarantine(&self, reason: &str) {
        let aside = self.sibling("corrupt");
        tracing::warn!(
            "存储文件已损坏 ({}): {}，移至 {}",
            reason,
            self.path.display(),
            aside.display()
        );
        if let Err(e) = tokio::fs::rename(&self.path, &aside).await {
            tracing::warn!("无法移走损坏的存储文件: {}", e);
        }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}", suffix));
        self.path.with_file_name(name)
    }

    /// 先写同目录下的临时文件再改名覆盖，中途失败不会留下半份文件
    async fn write_all(&self, all: Map<String, Value>) -> Result<(), CleanerError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&Value::Object(all))?;
        let temp = self.sibling(&format!("{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&temp, content).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, CleanerError> {
        let _guard = self.lock.lock().await;
        let all = self.read_all().await?;

        Ok(keys
            .iter()
            .filter_map(|key| all.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, values: Map<String, Value>) -> Result<(), CleanerError> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        all.extend(values);
        self.write_all(all).await
    }
}

/// 内存存储，可模拟写入失败
#[derive(Default)]
pub struct MemoryStore {
    data: std::sync::Mutex<Map<String, Value>>,
    fail_writes: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            data: std::sync::Mutex::new(values),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.data
            .lock()
            .map(|data| data.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, CleanerError> {
        let data = self
            .data
            .lock()
            .map_err(|_| CleanerError::Storage("内存存储锁已损坏".to_string()))?;

        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, values: Map<String, Value>) -> Result<(), CleanerError> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(CleanerError::Storage("写入被拒绝".to_string()));
        }

        let mut data = self
            .data
            .lock()
            .map_err(|_| CleanerError::Storage("内存存储锁已损坏".to_string()))?;
        data.extend(values);
        Ok(())
    }
}

/// 存储变更通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub namespace: &'static str,
    pub keys: Vec<String>,
}

/// 带变更通知的命名空间
#[derive(Clone)]
pub struct Namespace {
    name: &'static str,
    backend: Arc<dyn KeyValueStore>,
    changes: broadcast::Sender<StorageChange>,
}

impl Namespace {
    pub fn new(name: &'static str, backend: Arc<dyn KeyValueStore>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            name,
            backend,
            changes,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, CleanerError> {
        self.backend.get(keys).await
    }

    pub async fn set(&self, values: Map<String, Value>) -> Result<(), CleanerError> {
        if values.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = values.keys().cloned().collect();
        self.backend.set(values).await?;

        // 没有订阅者时发送失败，忽略
        let _ = self.changes.send(StorageChange {
            namespace: self.name,
            keys,
        });
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// 扩展使用的两个命名空间
#[derive(Clone)]
pub struct Storage {
    pub sync: Namespace,
    pub local: Namespace,
}

impl Storage {
    /// 在目录下以 sync.json / local.json 持久化
    pub fn open(dir: &Path) -> Self {
        tracing::debug!("打开存储目录: {}", dir.display());
        Self {
            sync: Namespace::new(
                SYNC_NAMESPACE,
                Arc::new(JsonFileStore::new(dir.join("sync.json"))),
            ),
            local: Namespace::new(
                LOCAL_NAMESPACE,
                Arc::new(JsonFileStore::new(dir.join("local.json"))),
            ),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backends(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn from_backends(sync: Arc<dyn KeyValueStore>, local: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sync: Namespace::new(SYNC_NAMESPACE, sync),
            local: Namespace::new(LOCAL_NAMESPACE, local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_root(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cache-cleaner-storage-test-{}-{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn file_store_reads_nothing_before_first_write() {
        let root = temp_root("empty");
        let store = JsonFileStore::new(root.join("sync.json"));

        let values = store.get(&["scope"]).await.unwrap();
        assert!(values.is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn file_store_partial_set_keeps_other_keys() {
        let root = temp_root("partial");
        let store = JsonFileStore::new(root.join("sync.json"));

        store.set(map(json!({ "scope": "all", "clearCache": false }))).await.unwrap();
        store.set(map(json!({ "clearCache": true }))).await.unwrap();

        let values = store.get(&["scope", "clearCache", "missing"]).await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["scope"], "all");
        assert_eq!(values["clearCache"], true);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn file_store_sets_aside_non_object_content() {
        let root = temp_root("not-object");
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("local.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.get(&["lastCleared"]).await.unwrap().is_empty());
        assert!(!path.exists());
        assert_eq!(
            std::fs::read_to_string(root.join("local.json.corrupt")).unwrap(),
            "[1, 2, 3]"
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn file_store_recovers_from_truncated_file() {
        let root = temp_root("truncated");
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("sync.json");
        std::fs::write(&path, "{\n  \"scope\": \"all\",\n  \"clearCa").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.get(&["scope"]).await.unwrap().is_empty());

        store.set(map(json!({ "scope": "current" }))).await.unwrap();
        let values = store.get(&["scope"]).await.unwrap();
        assert_eq!(values["scope"], "current");
        assert!(root.join("sync.json.corrupt").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn file_store_leaves_no_temp_files() {
        let root = temp_root("atomic");
        let store = JsonFileStore::new(root.join("sync.json"));
        store.set(map(json!({ "scope": "all" }))).await.unwrap();
        store.set(map(json!({ "clearHistory": true }))).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(&root)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sync.json".to_string()]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn memory_store_can_refuse_writes() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.set(map(json!({ "a": 1 }))).await.is_err());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn namespace_broadcasts_changed_keys() {
        let storage = Storage::in_memory();
        let mut changes = storage.local.subscribe();

        storage
            .local
            .set(map(json!({ "lastCleared": 1, "lastClearedScope": "all" })))
            .await
            .unwrap();

        let change = changes.recv().await.unwrap();
        assert_eq!(change.namespace, LOCAL_NAMESPACE);
        assert_eq!(change.keys.len(), 2);
        assert!(change.keys.contains(&"lastCleared".to_string()));
    }

    #[tokio::test]
    async fn namespaces_are_independent() {
        let storage = Storage::in_memory();
        storage.sync.set(map(json!({ "scope": "all" }))).await.unwrap();

        assert!(storage.local.get(&["scope"]).await.unwrap().is_empty());
        assert_eq!(storage.sync.get(&["scope"]).await.unwrap()["scope"], "all");
    }
}
