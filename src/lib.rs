//! WebDAV 到 WebDAV 的单向目录同步
//!
//! 流程：分别递归扫描源和目标 → 比较生成新增/更新/删除计划 → 在目标上执行。

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod storage;

pub use config::AppConfig;
pub use crate::core::{FileComparator, FileScanner, SyncConfig, SyncEngine, SyncPlan, SyncReport};
pub use error::{ConfigError, SyncError};
pub use storage::{RemoteClient, RetryPolicy, ServerEndpoint};
