//! 应用配置模块

use crate::core::SyncConfig;
use crate::error::ConfigError;
use crate::logging::LogConfig;
use crate::storage::{RetryPolicy, ServerEndpoint, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// 同步参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// 同步的根目录
    #[serde(default = "default_root")]
    pub root: String,
    /// 每个远程操作的最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 重试间隔（毫秒）
    #[serde(default)]
    pub retry_delay_ms: u64,
    /// 最大并发传输数
    #[serde(default = "default_max_concurrent_transfers")]
    pub max_concurrent_transfers: usize,
}

fn default_root() -> String {
    "/".to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_max_concurrent_transfers() -> usize {
    1
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: 0,
            max_concurrent_transfers: default_max_concurrent_transfers(),
        }
    }
}

impl SyncSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay_ms)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            root: self.root.clone(),
            max_concurrent_transfers: self.max_concurrent_transfers,
            dry_run: false,
        }
    }
}

/// 配置文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub origin: ServerEndpoint,
    pub target: ServerEndpoint,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 从配置文件加载
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: AppConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [("origin", &self.origin), ("target", &self.target)] {
            if endpoint.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{}.server 不能为空", name)));
            }
        }
        if self.sync.max_attempts == 0 {
            return Err(ConfigError::Invalid("sync.maxAttempts 必须大于 0".to_string()));
        }
        if self.sync.max_concurrent_transfers == 0 {
            return Err(ConfigError::Invalid(
                "sync.maxConcurrentTransfers 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}
