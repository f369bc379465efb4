use super::scanner::{FileInfo, FileTree};
use serde::Serialize;
use std::fmt;

/// 同步动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    /// 目标中不存在，需要新增
    Add,
    /// 两边都有但源文件更大或更新
    Update,
    /// 源中已不存在，需要从目标删除
    Remove,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Add => write!(f, "add"),
            SyncAction::Update => write!(f, "update"),
            SyncAction::Remove => write!(f, "remove"),
        }
    }
}

/// 同步计划
///
/// 三个列表互不相交且按路径排序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub to_add: Vec<String>,
    pub to_update: Vec<String>,
    pub to_remove: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_update.len() + self.to_remove.len()
    }

    /// 某个路径在计划中的动作
    pub fn action_for(&self, path: &str) -> Option<SyncAction> {
        let contains = |list: &[String]| list.binary_search_by(|p| p.as_str().cmp(path)).is_ok();
        if contains(&self.to_add) {
            Some(SyncAction::Add)
        } else if contains(&self.to_update) {
            Some(SyncAction::Update)
        } else if contains(&self.to_remove) {
            Some(SyncAction::Remove)
        } else {
            None
        }
    }

    /// 统计计划，传输字节数取自源文件树
    pub fn summary(&self, source: &FileTree) -> ActionSummary {
        let bytes = |list: &[String]| -> u64 {
            list.iter()
                .filter_map(|p| source.get(p))
                .filter(|f| !f.is_dir)
                .map(|f| f.size)
                .sum()
        };

        ActionSummary {
            add_count: self.to_add.len(),
            add_bytes: bytes(&self.to_add),
            update_count: self.to_update.len(),
            update_bytes: bytes(&self.to_update),
            remove_count: self.to_remove.len(),
        }
    }
}

/// 动作统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSummary {
    pub add_count: usize,
    pub add_bytes: u64,
    pub update_count: usize,
    pub update_bytes: u64,
    pub remove_count: usize,
}

impl ActionSummary {
    pub fn total_files(&self) -> usize {
        self.add_count + self.update_count + self.remove_count
    }

    pub fn total_transfer_bytes(&self) -> u64 {
        self.add_bytes + self.update_bytes
    }
}

/// 文件比较器
#[derive(Debug, Default)]
pub struct FileComparator;

impl FileComparator {
    pub fn new() -> Self {
        Self
    }

    /// 判断目标文件是否需要用源文件覆盖
    ///
    /// 大小不同，或源文件修改时间严格晚于目标时才更新。
    pub fn needs_update(&self, source: &FileInfo, dest: &FileInfo) -> bool {
        if source.size != dest.size {
            tracing::debug!(
                "文件大小不同: {} (src={}, dst={})",
                source.path,
                source.size,
                dest.size
            );
            return true;
        }

        if source.modified_time > dest.modified_time {
            tracing::debug!(
                "源文件更新: {} (src_time={}, dst_time={})",
                source.path,
                source.modified_time,
                dest.modified_time
            );
            return true;
        }

        false
    }

    /// 比较两个文件树，生成同步计划
    pub fn compare_trees(&self, source: &FileTree, dest: &FileTree) -> SyncPlan {
        let mut plan = SyncPlan::default();

        for (path, src) in source {
            match dest.get(path) {
                None => plan.to_add.push(path.clone()),
                Some(dst) => {
                    if self.needs_update(src, dst) {
                        plan.to_update.push(path.clone());
                    }
                }
            }
        }

        plan.to_remove = dest
            .keys()
            .filter(|path| !source.contains_key(*path))
            .cloned()
            .collect();

        // 排序，确保输出稳定
        plan.to_add.sort();
        plan.to_update.sort();
        plan.to_remove.sort();

        plan
    }
}
