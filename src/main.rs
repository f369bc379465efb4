use clap::Parser;
use davsync::config::{AppConfig, DEFAULT_CONFIG_FILE};
use davsync::core::{SyncEngine, SyncStatus};
use davsync::error::SyncError;
use davsync::logging::init_logging;
use davsync::storage::RemoteClient;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// 将源 WebDAV 服务器上的目录树单向同步到目标服务器
#[derive(Debug, Parser)]
#[command(name = "davsync", version, about)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// 覆盖配置中的同步根目录
    #[arg(long)]
    root: Option<String>,

    /// 只打印同步计划，不修改目标
    #[arg(long)]
    dry_run: bool,

    /// 覆盖配置中的日志级别
    #[arg(long)]
    log_level: Option<String>,
}

const EXIT_CONFIG: u8 = 1;
const EXIT_LISTING: u8 = 2;
const EXIT_PARTIAL: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    let _guard = init_logging(&config.log);

    let mut sync_config = config.sync.sync_config();
    if let Some(root) = cli.root {
        sync_config.root = root;
    }
    sync_config.dry_run = cli.dry_run;

    let retry = config.sync.retry_policy();
    let mut source = RemoteClient::with_retry(config.origin, retry);
    let mut dest = RemoteClient::with_retry(config.target, retry);

    let engine = SyncEngine::with_config(sync_config);
    let report = match engine.run_sync(&mut source, &mut dest).await {
        Ok(r) => r,
        Err(e @ SyncError::Unreachable { .. }) => {
            error!("同步中止: {}", e);
            return ExitCode::from(EXIT_LISTING);
        }
        Err(e) => {
            error!("无法连接服务器: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    info!("耗时 {} 秒, 传输 {} 字节", report.duration, report.bytes_transferred);

    match report.status {
        SyncStatus::Failed => {
            for err in &report.errors {
                error!("{}", err);
            }
            ExitCode::from(EXIT_PARTIAL)
        }
        SyncStatus::Completed | SyncStatus::Planned => ExitCode::SUCCESS,
    }
}
