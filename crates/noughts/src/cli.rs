//! Command-line interface for `noughts-server`.
//!
//! Every setting can also come from a `NOUGHTS_*` environment variable.
//! A flag on the command line wins over the variable.

use std::time::Duration;

use clap::builder::{BoolishValueParser, NonEmptyStringValueParser};
use clap::{ArgAction, Parser};

use crate::config::{
    DEFAULT_BIND, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS,
    DEFAULT_LEADERBOARD_LIMIT, DEFAULT_PAGE_SIZE, ServerConfig,
};

/// Real-time noughts and crosses match server
#[derive(Parser, Debug)]
#[command(name = "noughts-server", version, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(
        long,
        env = "NOUGHTS_BIND",
        default_value = DEFAULT_BIND,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub bind: String,

    /// Seconds a new connection has to send its handshake
    #[arg(
        long,
        env = "NOUGHTS_HANDSHAKE_TIMEOUT_SECS",
        default_value_t = DEFAULT_HANDSHAKE_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub handshake_timeout_secs: u64,

    /// Seconds without an inbound frame before a connection is dropped
    #[arg(
        long,
        env = "NOUGHTS_IDLE_TIMEOUT_SECS",
        default_value_t = DEFAULT_IDLE_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub idle_timeout_secs: u64,

    /// Default and maximum number of leaderboard entries
    #[arg(
        long,
        env = "NOUGHTS_LEADERBOARD_LIMIT",
        default_value_t = DEFAULT_LEADERBOARD_LIMIT,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub leaderboard_limit: u64,

    /// Games per page when a request names no page size
    #[arg(
        long,
        env = "NOUGHTS_PAGE_SIZE",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub page_size: u64,

    /// Delete unfinished games left over from a previous run
    #[arg(
        long,
        env = "NOUGHTS_PURGE_ON_START",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub purge_on_start: bool,

    /// Log filter, e.g. "debug" or "noughts_session=debug" (overrides RUST_LOG)
    #[arg(long)]
    pub log: Option<String>,
}

impl From<&Cli> for ServerConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            bind_addr: cli.bind.trim().to_string(),
            handshake_timeout: Duration::from_secs(cli.handshake_timeout_secs),
            idle_timeout: Duration::from_secs(cli.idle_timeout_secs),
            leaderboard_limit: usize::try_from(cli.leaderboard_limit).unwrap_or(usize::MAX),
            page_size: cli.page_size,
            purge_on_start: cli.purge_on_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("noughts-server").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_flags_gives_default_config() {
        let cli = parse(&[]).unwrap();
        assert_eq!(ServerConfig::from(&cli), ServerConfig::default());
        assert!(cli.log.is_none());
    }

    #[test]
    fn test_flags_override_every_field() {
        let cli = parse(&[
            "--bind",
            "0.0.0.0:9000",
            "--handshake-timeout-secs",
            "2",
            "--idle-timeout-secs",
            "60",
            "--leaderboard-limit",
            "25",
            "--page-size",
            "50",
            "--purge-on-start",
            "no",
            "--log",
            "debug",
        ])
        .unwrap();

        let config = ServerConfig::from(&cli);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.handshake_timeout, Duration::from_secs(2));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.leaderboard_limit, 25);
        assert_eq!(config.page_size, 50);
        assert!(!config.purge_on_start);
        assert_eq!(cli.log.as_deref(), Some("debug"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = parse(&["--idle-timeout-secs", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_garbage_number_rejected() {
        let err = parse(&["--page-size", "ten"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_bad_flag_value_rejected() {
        let err = parse(&["--purge-on-start", "maybe"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_empty_bind_rejected() {
        assert!(parse(&["--bind", ""]).is_err());
    }

    #[test]
    fn test_settings_read_from_environment() {
        let cmd = Cli::command();
        let env_of = |id: &str| {
            cmd.get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .and_then(|name| name.to_str())
                .map(str::to_owned)
        };
        assert_eq!(env_of("bind").as_deref(), Some("NOUGHTS_BIND"));
        assert_eq!(
            env_of("idle_timeout_secs").as_deref(),
            Some("NOUGHTS_IDLE_TIMEOUT_SECS")
        );
        assert_eq!(
            env_of("purge_on_start").as_deref(),
            Some("NOUGHTS_PURGE_ON_START")
        );
        assert_eq!(env_of("log"), None);
    }
}
