use crate::error::SyncError;
use crate::storage::RemoteClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// 文件信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// 从根目录开始的完整路径，目录以 "/" 结尾
    pub path: String,
    pub size: u64,
    /// Unix 时间戳（秒）
    pub modified_time: i64,
    pub is_dir: bool,
}

/// 扁平化的文件树：路径 -> 文件信息
pub type FileTree = HashMap<String, FileInfo>;

/// 拼接目录与子项名称
///
/// 结果总是以 "/" 开头，目录以 "/" 结尾，不会出现重复的分隔符。
pub fn join_path(dir: &str, name: &str, is_dir: bool) -> String {
    let dir = dir.trim_matches('/');
    let name = name.trim_matches('/');

    let mut path = String::with_capacity(dir.len() + name.len() + 3);
    path.push('/');
    if !dir.is_empty() {
        path.push_str(dir);
        path.push('/');
    }
    path.push_str(name);
    if is_dir && !name.is_empty() {
        path.push('/');
    }
    path
}

/// 规范化目录路径："" / "/" -> "/"，"a" -> "/a/"
pub fn normalize_dir(path: &str) -> String {
    join_path(path, "", true)
}

/// 文件树扫描器
#[derive(Debug, Default)]
pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    /// 递归扫描远程目录，返回扁平化的文件树
    ///
    /// 任何一级目录列出失败都会使整个扫描失败，不保留部分结果。
    pub async fn scan_tree(&self, client: &RemoteClient, root: &str) -> Result<FileTree, SyncError> {
        let root = normalize_dir(root);
        info!("开始扫描: {}{}", client.endpoint().url.trim_end_matches('/'), root);

        let mut tree = FileTree::new();
        let mut pending = vec![root];
        let mut dir_count = 0;

        while let Some(dir) = pending.pop() {
            let children = client.list_directory(&dir).await?;
            debug!("{}: {} 个子项", dir, children.len());

            for child in children {
                let path = join_path(&dir, &child.name, child.is_dir);
                if child.is_dir {
                    dir_count += 1;
                    pending.push(path.clone());
                }

                tree.insert(
                    path.clone(),
                    FileInfo {
                        path,
                        size: child.size,
                        modified_time: child.modified_time,
                        is_dir: child.is_dir,
                    },
                );
            }
        }

        info!(
            "扫描完成: {} 个文件, {} 个目录",
            tree.len() - dir_count,
            dir_count
        );

        Ok(tree)
    }
}
