//! # Collector Configuration
//!
//! Command-line flags with environment fallbacks, parsed once in `main` into
//! an immutable [`CollectorConfig`]. Nothing reads the environment after
//! startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use mx_01_entity_store::StoreConfig;
use mx_02_layer_sync::{Backoff, SyncConfig};
use mx_03_search::SearchConfig;
use shared_types::{Classify, ErrorClass, LayerNumber};
use thiserror::Error;

/// Address prefix on mainnet.
pub const MAINNET_HRP: &str = "sm";
/// Address prefix on testnet.
pub const TESTNET_HRP: &str = "stest";

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Host and port do not form a socket address
    #[error("invalid {name} address {value}: {reason}")]
    InvalidAddress {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A tuning value that must be positive is zero
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// Empty node endpoint or database name
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl Classify for ConfigError {
    fn class(&self) -> ErrorClass {
        ErrorClass::Fatal
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "explorer-collector")]
#[command(about = "Indexes a mesh node's ledger into a queryable store")]
#[command(version)]
pub struct Args {
    /// Node public API endpoint (layers, network info)
    #[arg(long, env = "SPACEMESH_NODE_PUBLIC", default_value = "localhost:9092")]
    pub node_public: String,

    /// Node private API endpoint (sync status)
    #[arg(long, env = "SPACEMESH_NODE_PRIVATE", default_value = "localhost:9093")]
    pub node_private: String,

    /// Directory holding the store databases
    #[arg(long, env = "MX_STORE_PATH", default_value = "./data")]
    pub store_path: PathBuf,

    /// Database name under the store path
    #[arg(long, env = "MX_STORE_DB", default_value = "explorer")]
    pub db: String,

    /// Expect testnet addresses
    #[arg(long, env = "SPACEMESH_TESTNET")]
    pub testnet: bool,

    /// Start live sync from this layer
    #[arg(long, env = "SPACEMESH_SYNC_FROM_LAYER")]
    pub sync_from_layer: Option<LayerNumber>,

    /// Scan for and backfill missing layers
    #[arg(long, env = "SPACEMESH_SYNC_MISSING_LAYERS", default_value_t = true, action = ArgAction::Set)]
    pub sync_missing_layers: bool,

    /// Ingest activations and smeshers
    #[arg(long, env = "SPACEMESH_ATX_SYNC", default_value_t = true, action = ArgAction::Set)]
    pub atx_sync: bool,

    /// Recalculate every epoch's statistics before live sync starts
    #[arg(long, env = "SPACEMESH_RECALCULATE_EPOCH_STATS")]
    pub recalculate_epoch_stats: bool,

    #[arg(long, env = "SPACEMESH_API_HOST", default_value = "127.0.0.1")]
    pub api_host: String,

    #[arg(long, env = "SPACEMESH_API_PORT", default_value_t = 8080)]
    pub api_port: u16,

    #[arg(long, env = "SPACEMESH_METRICS_HOST", default_value = "0.0.0.0")]
    pub metrics_host: String,

    #[arg(long, env = "SPACEMESH_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    /// File present while the collector runs
    #[arg(long, env = "MX_MARKER_FILE", default_value = "/var/run/explorer-collector")]
    pub marker_file: PathBuf,

    /// Concurrent backfill ranges
    #[arg(long, default_value_t = 4)]
    pub backfill_workers: usize,

    #[arg(long, default_value_t = 300)]
    pub gap_scan_interval_secs: u64,

    /// Delay before restarting a failed live sync loop
    #[arg(long, default_value_t = 5)]
    pub sync_backoff_secs: u64,

    /// Sleep between polls once caught up with the node
    #[arg(long, default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Timeout for each node and store call
    #[arg(long, default_value_t = 5)]
    pub call_timeout_secs: u64,

    #[arg(long, default_value_t = 100)]
    pub max_layers_per_advance: u32,
}

/// Everything the collector needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub node_public: String,
    pub node_private: String,
    pub store_path: PathBuf,
    pub db: String,
    /// Address prefix the node's payloads must carry.
    pub hrp: String,
    pub node_timeout: Duration,
    pub api_addr: SocketAddr,
    pub metrics_addr: SocketAddr,
    pub marker_file: PathBuf,
    pub store: StoreConfig,
    pub sync: SyncConfig,
    pub search: SearchConfig,
}

impl TryFrom<Args> for CollectorConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.node_public.is_empty() {
            return Err(ConfigError::Empty("node-public"));
        }
        if args.node_private.is_empty() {
            return Err(ConfigError::Empty("node-private"));
        }
        if args.db.is_empty() {
            return Err(ConfigError::Empty("db"));
        }
        for (name, value) in [
            ("backfill-workers", args.backfill_workers as u64),
            ("gap-scan-interval-secs", args.gap_scan_interval_secs),
            ("poll-interval-secs", args.poll_interval_secs),
            ("call-timeout-secs", args.call_timeout_secs),
            ("max-layers-per-advance", u64::from(args.max_layers_per_advance)),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }

        let call_timeout = Duration::from_secs(args.call_timeout_secs);
        let hrp = if args.testnet { TESTNET_HRP } else { MAINNET_HRP };

        let sync = SyncConfig {
            start_layer: args.sync_from_layer,
            sync_missing_layers: args.sync_missing_layers,
            atx_sync: args.atx_sync,
            recalculate_epoch_stats: args.recalculate_epoch_stats,
            max_layers_per_advance: args.max_layers_per_advance,
            poll_interval: Duration::from_secs(args.poll_interval_secs),
            restart_backoff: Backoff::Fixed(Duration::from_secs(args.sync_backoff_secs)),
            backfill_workers: args.backfill_workers,
            gap_scan_interval: Duration::from_secs(args.gap_scan_interval_secs),
            ..SyncConfig::default()
        };

        Ok(Self {
            api_addr: socket_addr("api", &args.api_host, args.api_port)?,
            metrics_addr: socket_addr("metrics", &args.metrics_host, args.metrics_port)?,
            node_public: args.node_public,
            node_private: args.node_private,
            store_path: args.store_path,
            db: args.db,
            hrp: hrp.to_string(),
            node_timeout: call_timeout,
            marker_file: args.marker_file,
            store: StoreConfig { call_timeout },
            sync,
            search: SearchConfig::default(),
        })
    }
}

fn socket_addr(name: &'static str, host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let value = format!("{host}:{port}");
    value.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddress {
        name,
        value: value.clone(),
        reason: e.to_string(),
    })
}

impl CollectorConfig {
    /// Parse flags and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::try_from(Args::parse())
    }

    /// Local configuration for tests: ephemeral ports, fast loops.
    pub fn for_testing(store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();
        Self {
            node_public: "localhost:9092".to_string(),
            node_private: "localhost:9093".to_string(),
            marker_file: store_path.join("collector.marker"),
            store_path,
            db: "explorer".to_string(),
            hrp: MAINNET_HRP.to_string(),
            node_timeout: Duration::from_secs(1),
            api_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            metrics_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            store: StoreConfig::for_testing(),
            sync: SyncConfig::for_testing(),
            search: SearchConfig::for_testing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(flags: &[&str]) -> Args {
        let argv = std::iter::once("explorer-collector").chain(flags.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::try_from(parse(&[])).unwrap();

        assert_eq!(config.hrp, "sm");
        assert_eq!(config.api_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.metrics_addr, "0.0.0.0:9090".parse().unwrap());
        assert!(config.sync.sync_missing_layers);
        assert!(config.sync.atx_sync);
        assert!(!config.sync.recalculate_epoch_stats);
        assert_eq!(config.sync.start_layer, None);
        assert_eq!(config.sync.backfill_workers, 4);
        assert_eq!(config.sync.gap_scan_interval, Duration::from_secs(300));
        assert_eq!(config.store.call_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = CollectorConfig::try_from(parse(&[
            "--testnet",
            "--sync-from-layer",
            "1200",
            "--sync-missing-layers",
            "false",
            "--atx-sync",
            "false",
            "--api-port",
            "9000",
            "--call-timeout-secs",
            "2",
        ]))
        .unwrap();

        assert_eq!(config.hrp, "stest");
        assert_eq!(config.sync.start_layer, Some(1200));
        assert!(!config.sync.sync_missing_layers);
        assert!(!config.sync.atx_sync);
        assert_eq!(config.api_addr.port(), 9000);
        assert_eq!(config.node_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let err = CollectorConfig::try_from(parse(&["--api-host", "not a host"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { name: "api", .. }));
    }

    #[test]
    fn test_zero_tuning_rejected() {
        let err = CollectorConfig::try_from(parse(&["--backfill-workers", "0"])).unwrap_err();
        assert_eq!(err, ConfigError::Zero("backfill-workers"));
    }
}
