use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use humantime_serde::re::humantime::parse_duration;
use tsgen::config::{default_profile, Config, Format, Protocol};
use tsgen::orchestrator::Orchestrator;
use tsgen::profile::{build_generators, parse_profile};
use tsgen::publisher::PublisherFactory;

#[derive(Parser)]
#[command(name = "tsgen")]
#[command(about = "Synthetic time-series traffic generator", long_about = None)]
struct Cli {
    /// Default log directive when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate metrics and publish them until interrupted
    Run(RunArgs),

    /// Print what every generator of a profile produces
    Describe {
        /// Generator profile
        #[arg(short, long, default_value_t = default_profile())]
        profile: String,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// TOML configuration file; explicit flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint to publish metrics to
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Publish format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Publish protocol
    #[arg(long, value_enum)]
    protocol: Option<Protocol>,

    /// Generator profile, eg: "counterInt={name: hits, value: 1},latency={name: rtt}"
    #[arg(long)]
    profile: Option<String>,

    /// Generate and encode without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Print payloads to stdout instead of sending them
    #[arg(long, alias = "log")]
    print: bool,

    /// Worker tick interval, eg: 1s, 250ms
    #[arg(short, long, value_parser = parse_duration)]
    interval: Option<Duration>,

    /// Node name substituted for NODENAME
    #[arg(long)]
    node_name: Option<String>,

    /// Metric name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Metric name suffix
    #[arg(long)]
    suffix: Option<String>,

    /// Comma-delimited key=value tags
    #[arg(short, long)]
    tags: Option<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Wait time between two worker starts, 0s starts them all at once
    #[arg(long, value_parser = parse_duration)]
    workers_interval: Option<Duration>,

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl RunArgs {
    /// File or default configuration with explicit flags applied on top
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?,
            None => Config::default(),
        };

        if self.endpoint.is_some() {
            config.endpoint = self.endpoint;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        config.dry_run |= self.dry_run;
        config.print |= self.print;
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(node_name) = self.node_name {
            config.node_name = node_name;
        }
        if let Some(prefix) = self.prefix {
            config.prefix = prefix;
        }
        if let Some(suffix) = self.suffix {
            config.suffix = suffix;
        }
        if let Some(tags) = self.tags {
            config.tags = tags;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(workers_interval) = self.workers_interval {
            config.workers_interval = workers_interval;
        }

        config.validate()?;
        Ok(config)
    }
}

async fn run(args: RunArgs) -> Result<()> {
    if let Some(port) = args.metrics_port {
        tsgen::metrics::init_metrics(port)?;
    }

    let config = Arc::new(args.into_config()?);
    info!("Starting tsgen with configuration:");
    info!("  endpoint: {}", config.endpoint());
    info!("  format: {}", config.format);
    info!("  protocol: {}", config.protocol);
    info!("  profile: {}", config.profile);
    info!("  interval: {:?}", config.interval);
    info!("  workers: {} (one every {:?})", config.workers, config.workers_interval);
    info!("  node name: {}", config.node_name);
    info!("  prefix: {}, suffix: {}", config.prefix, config.suffix);
    info!("  tags: {}", config.tags);

    let factory = PublisherFactory::connect(&config).await?;
    let orchestrator = Orchestrator::new(config, factory)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
        info!("Shutting down");
        on_signal.cancel();
    });

    orchestrator.run(cancel).await?;
    Ok(())
}

fn describe(profile: &str) -> Result<()> {
    let specs = parse_profile(profile)?;
    for generator in build_generators(&specs, &Bytes::new()) {
        println!("{}", generator.describe());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&cli.log_level))
                .context("Invalid log level")?,
        )
        .init();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Describe { profile } => describe(&profile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "tsgen",
            "run",
            "--format",
            "influxdb",
            "--interval",
            "250ms",
            "--workers",
            "3",
            "--dry-run",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };

        let config = args.into_config().unwrap();
        assert_eq!(config.format, Format::Influxdb);
        assert_eq!(config.interval, Duration::from_millis(250));
        assert_eq!(config.workers, 3);
        assert!(config.dry_run);
        assert_eq!(config.prefix, "tsgen.");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let args = RunArgs {
            interval: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_describe_subcommand_defaults() {
        let cli = Cli::parse_from(["tsgen", "--log-level", "debug", "describe"]);
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Describe { ref profile } if *profile == default_profile()));
    }
}
