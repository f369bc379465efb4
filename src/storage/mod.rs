pub mod client;
pub mod webdav;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use client::{RemoteClient, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use webdav::WebDavStorage;

/// 服务器连接信息
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerEndpoint {
    #[serde(rename = "server")]
    pub url: String,
    pub username: String,
    pub password: String,
}

impl ServerEndpoint {
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

// 日志中不能出现密码
impl fmt::Debug for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerEndpoint")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 目录中的一个直接子项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// 子项名称，不含路径分隔符
    pub name: String,
    pub size: u64,
    /// Unix 时间戳（秒），服务器未返回时为 0
    pub modified_time: i64,
    pub is_dir: bool,
}

/// 远程存储抽象接口
///
/// 每个方法只做一次尝试，重试由 [`RemoteClient`] 负责。
#[async_trait]
pub trait Storage: Send + Sync {
    /// 列出目录的直接子项（不递归，不包含目录自身）
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// 读取整个文件
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// 写入整个文件，覆盖已有内容
    async fn write(&self, path: &str, data: Vec<u8>) -> Result<()>;

    /// 删除文件或目录，路径不存在时返回错误
    async fn delete(&self, path: &str) -> Result<()>;

    /// 获取存储名称（用于日志）
    fn name(&self) -> &str;
}
