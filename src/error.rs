//! 错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 同步过程中的错误
///
/// 列目录失败属于结构性错误，会中止整次同步；
/// 读、写、删除失败只影响单个路径。
#[derive(Debug, Error)]
pub enum SyncError {
    /// 重试耗尽后仍无法列出目录
    #[error("无法列出目录 {path}: {source}")]
    Unreachable {
        path: String,
        source: anyhow::Error,
    },

    /// 重试耗尽后仍无法读取源文件
    #[error("读取文件失败 {path}: {source}")]
    ReadFailed {
        path: String,
        source: anyhow::Error,
    },

    /// 重试耗尽后仍无法写入目标文件
    #[error("写入文件失败 {path}: {source}")]
    WriteFailed {
        path: String,
        source: anyhow::Error,
    },

    /// 重试耗尽后仍无法删除目标文件
    #[error("删除文件失败 {path}: {source}")]
    RemoveFailed {
        path: String,
        source: anyhow::Error,
    },

    /// 客户端尚未调用 connect
    #[error("尚未连接到 {endpoint}")]
    NotConnected { endpoint: String },

    /// 创建存储连接失败
    #[error("创建存储连接失败 {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: anyhow::Error,
    },
}

impl SyncError {
    /// 出错的远程路径（如果有）
    pub fn path(&self) -> Option<&str> {
        match self {
            SyncError::Unreachable { path, .. }
            | SyncError::ReadFailed { path, .. }
            | SyncError::WriteFailed { path, .. }
            | SyncError::RemoveFailed { path, .. } => Some(path),
            SyncError::NotConnected { .. } | SyncError::Transport { .. } => None,
        }
    }

    /// 是否会中止整次同步
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SyncError::ReadFailed { .. }
                | SyncError::WriteFailed { .. }
                | SyncError::RemoveFailed { .. }
        )
    }
}

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法读取配置文件 {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("配置文件格式错误 {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("配置无效: {0}")]
    Invalid(String),
}
