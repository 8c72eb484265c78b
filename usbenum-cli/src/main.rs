//! usbenum CLI - Command-line tool for listing attached USB serial devices.
//!
//! ## Features
//!
//! - List attached USB serial devices (plain, detailed or JSON output)
//! - Bounded registry queries with a configurable timeout
//! - Configuration files and environment variable support
//! - Shell completion generation
//!
//! ## Exit codes
//!
//! - `0`: success, including "no devices attached"
//! - `1`: unexpected error
//! - `2`: usage error
//! - `4`: device registry unavailable
//! - `5`: device registry timed out

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use console::style;
use env_logger::Env;
use log::debug;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use usbenum::ErrorKind;

mod commands;
mod config;

use commands::list::ListOptions;
use config::Config;

/// usbenum - List attached USB serial devices.
///
/// Environment variables:
///   USBENUM_TIMEOUT_MS   - Registry query timeout in ms (0 disables, default: 1000)
///   USBENUM_ALL_PORTS    - Also list non-USB serial ports
///   USBENUM_CONFIG       - Path to a configuration file
#[derive(Parser)]
#[command(name = "usbenum")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output level (-v, -vv, -vvv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a configuration file.
    #[arg(long = "config", global = true, value_name = "PATH", env = "USBENUM_CONFIG")]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// List attached USB serial devices.
    List {
        /// Output the device list as JSON to stdout.
        #[arg(long)]
        json: bool,

        /// Show USB metadata (bridge kind, VID:PID, product).
        #[arg(short, long)]
        long: bool,

        /// Also list serial ports that are not behind USB.
        #[arg(long, env = "USBENUM_ALL_PORTS")]
        all_ports: bool,

        /// Registry query timeout in milliseconds (0 disables the bound).
        #[arg(long, value_name = "MS", env = "USBENUM_TIMEOUT_MS")]
        timeout_ms: Option<u64>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type for completions.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Map an error to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err
        .downcast_ref::<usbenum::Error>()
        .map(usbenum::Error::kind)
    {
        Some(ErrorKind::PlatformUnavailable) => 4,
        Some(ErrorKind::Timeout) => 5,
        None => 1,
    }
}

/// Print an error to stderr, as JSON when the command asked for JSON.
fn report_error(err: &anyhow::Error, json: bool) {
    if let Some(enum_err) = err.downcast_ref::<usbenum::Error>() {
        if json {
            eprintln!("{}", commands::list::error_json(enum_err));
        } else {
            eprintln!(
                "{} [{}] {}",
                style("Error:").red().bold(),
                enum_err.code(),
                enum_err.message()
            );
        }
        return;
    }

    eprintln!("{} {err:#}", style("Error:").red().bold());
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if env::var("NO_COLOR").is_ok() || !console::Term::stderr().is_term() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    init_logging(&cli);

    debug!(
        "usbenum v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    let config = if let Some(ref path) = cli.config_path {
        Config::load_from_path(path)
    } else {
        Config::load()
    };

    let (result, json) = match &cli.command {
        Commands::List {
            json,
            long,
            all_ports,
            timeout_ms,
        } => {
            let options = ListOptions::resolve(*json, *long, *all_ports, *timeout_ms, &config);
            (commands::list::cmd_list(&options), options.json)
        },
        Commands::Completions { shell } => {
            commands::completions::cmd_completions(*shell);
            (Ok(()), false)
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, json);
            ExitCode::from(exit_code(&err))
        },
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::CommandFactory;
    use std::time::Duration;

    // ---- clap validation ----

    #[test]
    fn test_cli_command_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_list_defaults() {
        let cli = Cli::try_parse_from(["usbenum", "list"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::List {
                json: false,
                long: false,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_list_all_options() {
        let cli = Cli::try_parse_from([
            "usbenum",
            "-vv",
            "list",
            "--json",
            "--long",
            "--all-ports",
            "--timeout-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        if let Commands::List {
            json,
            long,
            all_ports,
            timeout_ms,
        } = cli.command
        {
            assert!(json);
            assert!(long);
            assert!(all_ports);
            assert_eq!(timeout_ms, Some(250));
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn test_cli_parse_invalid_timeout() {
        assert!(Cli::try_parse_from(["usbenum", "list", "--timeout-ms", "soon"]).is_err());
    }

    #[test]
    fn test_cli_parse_completions() {
        let cli = Cli::try_parse_from(["usbenum", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn test_cli_missing_subcommand() {
        assert!(Cli::try_parse_from(["usbenum"]).is_err());
    }

    #[test]
    fn test_cli_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["usbenum", "list", "--config", "custom.toml"]).unwrap();
        assert_eq!(cli.config_path, Some(PathBuf::from("custom.toml")));
    }

    // ---- exit codes ----

    #[test]
    fn test_exit_code_platform_unavailable() {
        let err = anyhow::Error::from(usbenum::Error::platform_unavailable("permission denied"));
        assert_eq!(exit_code(&err), 4);
    }

    #[test]
    fn test_exit_code_timeout() {
        let err = anyhow::Error::from(usbenum::Error::Timeout(Duration::from_secs(1)));
        assert_eq!(exit_code(&err), 5);
    }

    #[test]
    fn test_exit_code_generic() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
