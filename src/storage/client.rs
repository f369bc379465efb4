//! 带重试的远程客户端

use super::{DirEntry, ServerEndpoint, Storage, WebDavStorage};
use crate::error::SyncError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// 默认最大尝试次数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 重试策略
///
/// 所有错误一律重试，不区分临时错误和永久错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（含第一次），0 视为 1
    pub max_attempts: u32,
    /// 两次尝试之间的固定间隔（毫秒），默认不等待
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: 0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// 执行操作，成功立即返回；全部失败时返回最后一次的错误
    async fn run<T, F, Fut>(&self, op: &str, path: &str, mut f: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let attempts = self.attempts();
        let mut attempt = 1;

        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!("{} 失败 ({}/{}): {} - {}", op, attempt, attempts, path, e);
                    if self.delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    error!("{} 最终失败 (已尝试{}次): {} - {}", op, attempts, path, e);
                    return Err(e);
                }
            }
        }
    }
}

/// 远程客户端，绑定一个服务器端点
pub struct RemoteClient {
    endpoint: ServerEndpoint,
    retry: RetryPolicy,
    storage: Option<Arc<dyn Storage>>,
}

impl RemoteClient {
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self {
            endpoint,
            retry: RetryPolicy::default(),
            storage: None,
        }
    }

    pub fn with_retry(endpoint: ServerEndpoint, retry: RetryPolicy) -> Self {
        Self {
            endpoint,
            retry,
            storage: None,
        }
    }

    /// 使用已有的存储实现（已连接状态）
    pub fn with_storage(
        endpoint: ServerEndpoint,
        retry: RetryPolicy,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            endpoint,
            retry,
            storage: Some(storage),
        }
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn is_connected(&self) -> bool {
        self.storage.is_some()
    }

    /// 建立连接句柄，重复调用不会重新创建
    pub fn connect(&mut self) -> Result<(), SyncError> {
        if self.storage.is_some() {
            return Ok(());
        }

        let storage = WebDavStorage::new(&self.endpoint).map_err(|e| SyncError::Transport {
            endpoint: self.endpoint.url.clone(),
            source: e,
        })?;
        debug!("已创建 WebDAV 连接: {}", storage.name());
        self.storage = Some(Arc::new(storage));

        Ok(())
    }

    fn storage(&self) -> Result<&dyn Storage, SyncError> {
        self.storage
            .as_deref()
            .ok_or_else(|| SyncError::NotConnected {
                endpoint: self.endpoint.url.clone(),
            })
    }

    /// 列出目录的直接子项
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, SyncError> {
        let storage = self.storage()?;
        self.retry
            .run("列目录", path, || storage.list_dir(path))
            .await
            .map_err(|e| SyncError::Unreachable {
                path: path.to_string(),
                source: e,
            })
    }

    /// 读取文件内容
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, SyncError> {
        let storage = self.storage()?;
        self.retry
            .run("读取", path, || storage.read(path))
            .await
            .map_err(|e| SyncError::ReadFailed {
                path: path.to_string(),
                source: e,
            })
    }

    /// 写入文件内容，已存在时覆盖
    pub async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), SyncError> {
        let storage = self.storage()?;
        self.retry
            .run("写入", path, || storage.write(path, data.to_vec()))
            .await
            .map_err(|e| SyncError::WriteFailed {
                path: path.to_string(),
                source: e,
            })
    }

    /// 删除文件或目录
    pub async fn remove_file(&self, path: &str) -> Result<(), SyncError> {
        let storage = self.storage()?;
        self.retry
            .run("删除", path, || storage.delete(path))
            .await
            .map_err(|e| SyncError::RemoveFailed {
                path: path.to_string(),
                source: e,
            })
    }
}
