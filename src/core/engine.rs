use crate::core::comparator::{FileComparator, SyncAction, SyncPlan};
use crate::core::scanner::FileScanner;
use crate::error::SyncError;
use crate::storage::RemoteClient;
use futures::{stream, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// 同步配置
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 两边同步的根目录
    pub root: String,
    /// 最大并发传输数，1 表示顺序执行
    pub max_concurrent_transfers: usize,
    /// 只生成计划，不执行
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: "/".to_string(),
            max_concurrent_transfers: 1,
            dry_run: false,
        }
    }
}

/// 单个路径的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeStatus {
    Done { bytes: u64 },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: String,
    pub action: SyncAction,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl FileOutcome {
    fn done(path: &str, action: SyncAction, bytes: u64) -> Self {
        Self {
            path: path.to_string(),
            action,
            status: OutcomeStatus::Done { bytes },
        }
    }

    fn skipped(path: &str, action: SyncAction, reason: &str) -> Self {
        Self {
            path: path.to_string(),
            action,
            status: OutcomeStatus::Skipped {
                reason: reason.to_string(),
            },
        }
    }

    fn failed(path: &str, action: SyncAction, err: &SyncError) -> Self {
        Self {
            path: path.to_string(),
            action,
            status: OutcomeStatus::Failed {
                error: err.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }
}

/// 同步状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// 所有路径处理成功
    Completed,
    /// 部分路径处理失败
    Failed,
    /// 仅生成了计划
    Planned,
}

/// 同步报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub start_time: i64,
    pub end_time: i64,
    pub status: SyncStatus,
    pub files_scanned: u32,
    pub files_added: u32,
    pub files_updated: u32,
    pub files_removed: u32,
    pub files_skipped: u32,
    pub files_failed: u32,
    pub bytes_transferred: u64,
    pub duration: u64,
    pub errors: Vec<String>,
    pub plan: SyncPlan,
    pub outcomes: Vec<FileOutcome>,
}

impl SyncReport {
    fn new(
        start_time: i64,
        files_scanned: u32,
        plan: SyncPlan,
        outcomes: Vec<FileOutcome>,
        dry_run: bool,
    ) -> Self {
        let end_time = chrono::Utc::now().timestamp();
        let mut report = Self {
            start_time,
            end_time,
            status: SyncStatus::Completed,
            files_scanned,
            files_added: 0,
            files_updated: 0,
            files_removed: 0,
            files_skipped: 0,
            files_failed: 0,
            bytes_transferred: 0,
            duration: (end_time - start_time).max(0) as u64,
            errors: Vec::new(),
            plan,
            outcomes: Vec::new(),
        };

        for outcome in &outcomes {
            match &outcome.status {
                OutcomeStatus::Done { bytes } => {
                    report.bytes_transferred += bytes;
                    match outcome.action {
                        SyncAction::Add => report.files_added += 1,
                        SyncAction::Update => report.files_updated += 1,
                        SyncAction::Remove => report.files_removed += 1,
                    }
                }
                OutcomeStatus::Skipped { .. } => report.files_skipped += 1,
                OutcomeStatus::Failed { error } => {
                    report.files_failed += 1;
                    report.errors.push(error.clone());
                }
            }
        }
        report.outcomes = outcomes;

        report.status = if dry_run {
            SyncStatus::Planned
        } else if report.files_failed > 0 {
            SyncStatus::Failed
        } else {
            SyncStatus::Completed
        };

        report
    }
}

fn is_dir_path(path: &str) -> bool {
    path.ends_with('/')
}

fn depth(path: &str) -> usize {
    path.trim_matches('/').split('/').count()
}

/// 同步引擎
pub struct SyncEngine {
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self {
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// 运行一次完整同步：连接、扫描、比较、执行
    ///
    /// 任一边扫描失败都会直接返回错误，此时不会传输任何文件。
    pub async fn run_sync(
        &self,
        source: &mut RemoteClient,
        dest: &mut RemoteClient,
    ) -> Result<SyncReport, SyncError> {
        let start_time = chrono::Utc::now().timestamp();

        source.connect()?;
        dest.connect()?;

        let scanner = FileScanner::new();

        info!("正在扫描源服务器...");
        let source_tree = scanner.scan_tree(source, &self.config.root).await?;

        info!("正在扫描目标服务器...");
        let dest_tree = scanner.scan_tree(dest, &self.config.root).await?;

        let files_scanned = (source_tree.len() + dest_tree.len()) as u32;

        let plan = FileComparator::new().compare_trees(&source_tree, &dest_tree);
        let summary = plan.summary(&source_tree);
        info!(
            "比较完成: {} 个新增, {} 个更新, {} 个删除, 共需传输 {} 字节",
            summary.add_count,
            summary.update_count,
            summary.remove_count,
            summary.total_transfer_bytes()
        );

        if self.config.dry_run {
            for (action, list) in [
                (SyncAction::Add, &plan.to_add),
                (SyncAction::Update, &plan.to_update),
                (SyncAction::Remove, &plan.to_remove),
            ] {
                for path in list {
                    info!("[dry-run] {}: {}", action, path);
                }
            }
            return Ok(SyncReport::new(start_time, files_scanned, plan, Vec::new(), true));
        }

        let outcomes = self.apply(&plan, source, dest).await;
        let report = SyncReport::new(start_time, files_scanned, plan, outcomes, false);

        info!(
            "同步完成: 新增 {}, 更新 {}, 删除 {}, 跳过 {}, 失败 {}",
            report.files_added,
            report.files_updated,
            report.files_removed,
            report.files_skipped,
            report.files_failed
        );

        Ok(report)
    }

    /// 执行同步计划
    ///
    /// 先处理新增和更新，再删除。每个路径独立处理，单个失败不会中止其他路径。
    pub async fn apply(
        &self,
        plan: &SyncPlan,
        source: &RemoteClient,
        dest: &RemoteClient,
    ) -> Vec<FileOutcome> {
        let concurrency = self.config.max_concurrent_transfers.max(1);
        let mut outcomes = Vec::with_capacity(plan.len());

        let transfers = plan
            .to_add
            .iter()
            .map(|p| (SyncAction::Add, p))
            .chain(plan.to_update.iter().map(|p| (SyncAction::Update, p)));

        let copied: Vec<FileOutcome> = stream::iter(transfers)
            .map(|(action, path)| Self::copy_file(action, path, source, dest))
            .buffered(concurrency)
            .collect()
            .await;
        outcomes.extend(copied);

        // 先删文件，再从最深的目录开始删
        let (mut dirs, files): (Vec<&String>, Vec<&String>) =
            plan.to_remove.iter().partition(|p| is_dir_path(p));
        dirs.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));

        let removed: Vec<FileOutcome> = stream::iter(files)
            .map(|path| Self::remove_path(path, dest))
            .buffered(concurrency)
            .collect()
            .await;
        outcomes.extend(removed);

        for dir in dirs {
            outcomes.push(Self::remove_path(dir, dest).await);
        }

        outcomes
    }

    /// 从源读取并写入目标
    async fn copy_file(
        action: SyncAction,
        path: &str,
        source: &RemoteClient,
        dest: &RemoteClient,
    ) -> FileOutcome {
        info!("{}: {}", action, path);

        // 目录在写入其中的文件时自动创建
        if is_dir_path(path) {
            debug!("跳过目录: {}", path);
            return FileOutcome::skipped(path, action, "directory");
        }

        let data = match source.read_file(path).await {
            Ok(data) => data,
            Err(e) => {
                error!("读取文件失败 {}: {}", path, e);
                return FileOutcome::failed(path, action, &e);
            }
        };

        let bytes = data.len() as u64;
        match dest.write_file(path, &data).await {
            Ok(()) => {
                info!("文件 {} 写入成功 ({} 字节)", path, bytes);
                FileOutcome::done(path, action, bytes)
            }
            Err(e) => {
                error!("写入文件失败 {}: {}", path, e);
                FileOutcome::failed(path, action, &e)
            }
        }
    }

    async fn remove_path(path: &str, dest: &RemoteClient) -> FileOutcome {
        info!("{}: {}", SyncAction::Remove, path);

        match dest.remove_file(path).await {
            Ok(()) => {
                info!("文件 {} 删除成功", path);
                FileOutcome::done(path, SyncAction::Remove, 0)
            }
            Err(e) => {
                warn!("删除文件失败 {}: {}", path, e);
                FileOutcome::failed(path, SyncAction::Remove, &e)
            }
        }
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::client::testing::{client, FakeStorage};
    use std::sync::Arc;

    fn plan(add: &[&str], update: &[&str], remove: &[&str]) -> SyncPlan {
        let owned = |l: &[&str]| l.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        SyncPlan {
            to_add: owned(add),
            to_update: owned(update),
            to_remove: owned(remove),
        }
    }

    #[tokio::test]
    async fn test_apply_add_update_remove() {
        let src = Arc::new(FakeStorage::new());
        src.add_file("/a.txt", b"new", 2);
        src.add_file("/b.txt", b"changed", 2);
        let dst = Arc::new(FakeStorage::new());
        dst.add_file("/b.txt", b"old", 1);
        dst.add_file("/c.txt", b"stale", 1);

        let outcomes = SyncEngine::new()
            .apply(
                &plan(&["/a.txt"], &["/b.txt"], &["/c.txt"]),
                &client(src),
                &client(dst.clone()),
            )
            .await;

        assert_eq!(
            outcomes,
            vec![
                FileOutcome::done("/a.txt", SyncAction::Add, 3),
                FileOutcome::done("/b.txt", SyncAction::Update, 7),
                FileOutcome::done("/c.txt", SyncAction::Remove, 0),
            ]
        );
        assert_eq!(dst.file("/a.txt").unwrap(), b"new");
        assert_eq!(dst.file("/b.txt").unwrap(), b"changed");
        assert!(dst.file("/c.txt").is_none());
    }

    #[tokio::test]
    async fn test_read_failure_skips_write_and_continues() {
        let src = Arc::new(FakeStorage::new());
        src.add_file("/bad.txt", b"x", 1);
        src.add_file("/good.txt", b"y", 1);
        src.fail("read:/bad.txt", 3);
        let dst = Arc::new(FakeStorage::new());

        let outcomes = SyncEngine::new()
            .apply(
                &plan(&["/bad.txt", "/good.txt"], &[], &[]),
                &client(src),
                &client(dst.clone()),
            )
            .await;

        assert!(outcomes[0].is_failed());
        assert_eq!(outcomes[1], FileOutcome::done("/good.txt", SyncAction::Add, 1));
        assert_eq!(dst.calls("write:/bad.txt"), 0);
        assert!(dst.file("/good.txt").is_some());
    }

    #[tokio::test]
    async fn test_write_and_remove_failures_are_per_path() {
        let src = Arc::new(FakeStorage::new());
        src.add_file("/a.txt", b"a", 1);
        let dst = Arc::new(FakeStorage::new());
        dst.fail("write:/a.txt", 3);

        let outcomes = SyncEngine::new()
            .apply(
                &plan(&["/a.txt"], &[], &["/missing.txt"]),
                &client(src),
                &client(dst.clone()),
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.is_failed()));
        assert_eq!(dst.calls("write:/a.txt"), 3);
        assert_eq!(dst.calls("delete:/missing.txt"), 3);
    }

    #[tokio::test]
    async fn test_directories_are_not_transferred() {
        let src = Arc::new(FakeStorage::new());
        src.add_file("/d/a.txt", b"a", 1);
        let dst = Arc::new(FakeStorage::new());

        let outcomes = SyncEngine::new()
            .apply(&plan(&["/d/", "/d/a.txt"], &[], &[]), &client(src.clone()), &client(dst.clone()))
            .await;

        assert_eq!(outcomes[0], FileOutcome::skipped("/d/", SyncAction::Add, "directory"));
        assert_eq!(src.calls("read:/d/"), 0);
        assert!(dst.file("/d/a.txt").is_some());
        assert!(dst.has_dir("/d/"));
    }

    #[tokio::test]
    async fn test_remove_files_before_deepest_directories() {
        let dst = Arc::new(FakeStorage::new());
        dst.add_file("/old/sub/x.txt", b"x", 1);
        dst.add_file("/old/y.txt", b"y", 1);

        let outcomes = SyncEngine::new()
            .apply(
                &plan(&[], &[], &["/old/", "/old/sub/", "/old/sub/x.txt", "/old/y.txt"]),
                &client(Arc::new(FakeStorage::new())),
                &client(dst.clone()),
            )
            .await;

        let order: Vec<_> = outcomes.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(order, vec!["/old/sub/x.txt", "/old/y.txt", "/old/sub/", "/old/"]);
        assert!(outcomes.iter().all(|o| !o.is_failed()));
        assert!(!dst.has_dir("/old/"));
    }

    #[tokio::test]
    async fn test_parallel_apply_handles_each_path_once() {
        let src = Arc::new(FakeStorage::new());
        let dst = Arc::new(FakeStorage::new());
        let mut paths = Vec::new();
        for i in 0..20 {
            let path = format!("/f{:02}.txt", i);
            src.add_file(&path, format!("data{}", i).as_bytes(), 1);
            paths.push(path);
        }
        let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();

        let engine = SyncEngine::with_config(SyncConfig {
            max_concurrent_transfers: 4,
            ..Default::default()
        });
        let outcomes = engine
            .apply(&plan(&refs, &[], &[]), &client(src.clone()), &client(dst.clone()))
            .await;

        assert_eq!(outcomes.len(), 20);
        for path in &paths {
            assert_eq!(src.calls(&format!("read:{}", path)), 1);
            assert_eq!(dst.calls(&format!("write:{}", path)), 1);
        }
    }

    #[tokio::test]
    async fn test_run_sync_end_to_end() {
        let src = Arc::new(FakeStorage::new());
        src.add_file("/a/b.txt", b"bbbb", 10);
        src.add_file("/same.txt", b"s", 5);
        let dst = Arc::new(FakeStorage::new());
        dst.add_file("/same.txt", b"s", 5);
        dst.add_file("/gone.txt", b"g", 5);

        let mut source = client(src);
        let mut dest = client(dst.clone());
        let report = SyncEngine::new().run_sync(&mut source, &mut dest).await.unwrap();

        assert_eq!(report.plan.to_add, vec!["/a/", "/a/b.txt"]);
        assert!(report.plan.to_update.is_empty());
        assert_eq!(report.plan.to_remove, vec!["/gone.txt"]);
        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(report.files_added, 1);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.files_removed, 1);
        assert_eq!(report.bytes_transferred, 4);
        assert_eq!(dst.file("/a/b.txt").unwrap(), b"bbbb");
    }

    #[tokio::test]
    async fn test_run_sync_aborts_on_listing_failure() {
        let src = Arc::new(FakeStorage::new());
        src.add_file("/a.txt", b"a", 1);
        let dst = Arc::new(FakeStorage::new());
        dst.fail("list:/", 3);

        let mut source = client(src.clone());
        let mut dest = client(dst.clone());
        let err = SyncEngine::new().run_sync(&mut source, &mut dest).await.unwrap_err();

        assert!(matches!(err, SyncError::Unreachable { .. }));
        assert_eq!(src.calls("read:/a.txt"), 0);
        assert!(dst.file("/a.txt").is_none());
    }

    #[tokio::test]
    async fn test_dry_run_does_not_touch_target() {
        let src = Arc::new(FakeStorage::new());
        src.add_file("/a.txt", b"a", 1);
        let dst = Arc::new(FakeStorage::new());

        let engine = SyncEngine::with_config(SyncConfig {
            dry_run: true,
            ..Default::default()
        });
        let mut source = client(src);
        let mut dest = client(dst.clone());
        let report = engine.run_sync(&mut source, &mut dest).await.unwrap();

        assert_eq!(report.status, SyncStatus::Planned);
        assert_eq!(report.plan.to_add, vec!["/a.txt"]);
        assert!(report.outcomes.is_empty());
        assert_eq!(dst.calls("write:/a.txt"), 0);
    }
}
