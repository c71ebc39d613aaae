//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CARLA Rig - spawn a vehicle with a fixed sensor rig and hold it until interrupted
#[derive(Parser, Debug)]
#[command(
    name = "carla-rig",
    author,
    version,
    about = "Spawn a sensor-equipped vehicle in CARLA and hold it until interrupted",
    long_about = "Connects to a running CARLA server, spawns one vehicle with a lidar, \n\
                  five cameras and a GNSS receiver attached, then waits for Ctrl+C. \n\
                  Every spawned actor is destroyed on exit, including after a failed spawn.\n\n\
                  Without a subcommand `run` is executed with the built-in rig."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logs except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "CARLA_RIG_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the rig and hold it until interrupted (default)
    Run(RunArgs),

    /// Validate a rig file without connecting
    Validate(ValidateArgs),

    /// Display the effective rig
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Rig file (TOML or JSON). Defaults to the built-in rig.
    #[arg(short, long, env = "CARLA_RIG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override CARLA server host
    #[arg(long, env = "CARLA_HOST")]
    pub host: Option<String>,

    /// Override CARLA server port
    #[arg(long, env = "CARLA_PORT")]
    pub port: Option<u16>,

    /// Override client timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Validate the rig and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CARLA_RIG_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    /// `run` without flags, still honoring the env fallbacks
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::try_parse_from(["run"])
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Rig file to validate. Defaults to the built-in rig.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Rig file. Defaults to the built-in rig.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_runs_builtin_rig() {
        let cli = Cli::try_parse_from(["carla-rig"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "carla-rig", "run", "--host", "10.0.0.5", "--port", "2010", "--timeout", "5",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(args.port, Some(2010));
        assert_eq!(args.timeout, Some(5.0));
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_bare_run_reads_env() {
        std::env::set_var("CARLA_HOST", "10.1.2.3");
        let args = RunArgs::from_env();
        std::env::remove_var("CARLA_HOST");

        let args = args.unwrap();
        assert_eq!(args.host.as_deref(), Some("10.1.2.3"));
        assert!(!args.dry_run);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["carla-rig", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
