//! # CARLA Rig CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 内置 rig 或 rig 文件的加载与校验
//! - spawn 与 teardown（任何退出路径都会 teardown）
//! - Ctrl+C / SIGTERM 关闭处理
//!
//! stdout 只输出 `Created ...` / `Destroyed actors`，日志写到 stderr。

mod cli;
mod commands;
mod error;
mod rig;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands, RunArgs};
use commands::{run_info, run_provisioner, run_validate};

// 所有模拟器调用都在这一个线程上顺序执行
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 加载 .env 文件（如果存在）
    dotenvy::dotenv().ok();

    let mut cli = Cli::parse();
    let command = match cli.command.take() {
        Some(command) => command,
        None => Commands::Run(RunArgs::from_env().unwrap_or_else(|e| e.exit())),
    };

    init_logging(&cli, &command)?;

    info!(version = env!("CARGO_PKG_VERSION"), "CARLA Rig starting");

    let result = match &command {
        Commands::Run(args) => run_provisioner(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// 根据 CLI 参数初始化日志（`run` 时还有 metrics exporter）
fn init_logging(cli: &Cli, command: &Commands) -> Result<()> {
    let (default_log_level, force_level) = if cli.quiet {
        ("error", true)
    } else {
        match cli.verbose {
            0 => ("info", false),
            1 => ("debug", true),
            _ => ("trace", true),
        }
    };

    let metrics_port = match command {
        Commands::Run(args) if args.metrics_port != 0 => Some(args.metrics_port),
        _ => None,
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: default_log_level.to_string(),
        force_level,
    })
}
