pub mod comparator;
pub mod engine;
pub mod scanner;

pub use comparator::{ActionSummary, FileComparator, SyncAction, SyncPlan};
pub use engine::{FileOutcome, OutcomeStatus, SyncConfig, SyncEngine, SyncReport, SyncStatus};
pub use scanner::{join_path, FileInfo, FileScanner, FileTree};
