use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Wire format of the target backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Atlas,
    Carbon,
    Influxdb,
    M3db,
    Timescale,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Atlas => "atlas",
            Format::Carbon => "carbon",
            Format::Influxdb => "influxdb",
            Format::M3db => "m3db",
            Format::Timescale => "timescale",
        }
    }

    /// Endpoint used when none is configured
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Format::Atlas => "http://127.0.0.1:7101/api/v1/publish",
            Format::Carbon => "127.0.0.1:2003",
            Format::Influxdb => "http://127.0.0.1:8086/write?db=mydb",
            Format::M3db => "http://localhost:9003/writetagged",
            Format::Timescale => "postgres://postgres@127.0.0.1:5432/postgres",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested transport; `Auto` picks the natural one for the format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Auto,
    Http,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Auto => f.write_str("auto"),
            Protocol::Http => f.write_str("HTTP"),
            Protocol::Tcp => f.write_str("TCP"),
        }
    }
}

/// Publisher kind resolved from format, protocol and run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Tcp,
    Timescale,
    Log,
    Null,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Http => f.write_str("http"),
            Transport::Tcp => f.write_str("tcp"),
            Transport::Timescale => f.write_str("timescale"),
            Transport::Log => f.write_str("log"),
            Transport::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint to publish metrics to (format default when unset)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Publish format
    #[serde(default = "default_format")]
    pub format: Format,

    /// Publish protocol
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,

    /// Generator profile, eg: `counterInt={name: a, value: 1},latency={name: b}`
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Generate and encode but don't send anything
    #[serde(default)]
    pub dry_run: bool,

    /// Print payloads to stdout instead of sending them
    #[serde(default)]
    pub print: bool,

    /// Tick interval of every worker
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Node name substituted for NODENAME
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Metric namespace prefix (NODENAME, WORKERNUM, WORKERFULLNAME)
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Metric namespace suffix (NODENAME, WORKERNUM, WORKERFULLNAME)
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Comma-delimited key=value tags (NODENAME, PID, WORKERNUM, WORKERFULLNAME, METRICNAME)
    #[serde(default)]
    pub tags: String,

    /// Number of parallel workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Wait time between starting two workers
    #[serde(default = "default_workers_interval", with = "humantime_serde")]
    pub workers_interval: Duration,

    /// How often a worker pushes its counters to the aggregator
    #[serde(default = "default_stats_push_interval", with = "humantime_serde")]
    pub stats_push_interval: Duration,

    /// How often the aggregator prints a summary
    #[serde(default = "default_stats_print_interval", with = "humantime_serde")]
    pub stats_print_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            format: default_format(),
            protocol: default_protocol(),
            profile: default_profile(),
            dry_run: false,
            print: false,
            interval: default_interval(),
            node_name: default_node_name(),
            prefix: default_prefix(),
            suffix: default_suffix(),
            tags: String::new(),
            workers: default_workers(),
            workers_interval: default_workers_interval(),
            stats_push_interval: default_stats_push_interval(),
            stats_print_interval: default_stats_print_interval(),
        }
    }
}

fn default_format() -> Format {
    Format::Carbon
}

fn default_protocol() -> Protocol {
    Protocol::Auto
}

pub fn default_profile() -> String {
    "counterInt={name: fixedValue, value: 10, increment: 0},randomInt={name: jiggle, min: 50, max: 75}"
        .to_string()
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

/// Lowercased host name, or "local" when it can't be found
pub fn default_node_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

fn default_prefix() -> String {
    "tsgen.".to_string()
}

fn default_suffix() -> String {
    "-WORKERNUM".to_string()
}

fn default_workers() -> usize {
    10
}

fn default_workers_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_stats_push_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_stats_print_interval() -> Duration {
    Duration::from_secs(30)
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "interval",
                "must be a duration greater than 0".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(ConfigError::Invalid(
                "workers",
                "must be greater than 0".to_string(),
            ));
        }

        if self.stats_push_interval.is_zero() || self.stats_print_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "stats intervals",
                "must be durations greater than 0".to_string(),
            ));
        }

        self.transport().map(|_| ())
    }

    /// Resolve which publisher the workers will use
    pub fn transport(&self) -> Result<Transport, ConfigError> {
        let resolved = match (self.format, self.protocol) {
            (Format::Timescale, _) => Transport::Timescale,
            (Format::Carbon, Protocol::Auto | Protocol::Tcp) => Transport::Tcp,
            (Format::Atlas | Format::Influxdb | Format::M3db, Protocol::Auto | Protocol::Http) => {
                Transport::Http
            }
            (format, protocol) => {
                return Err(ConfigError::UnsupportedProtocol { format, protocol })
            }
        };

        if self.dry_run {
            Ok(Transport::Null)
        } else if self.print {
            Ok(Transport::Log)
        } else {
            Ok(resolved)
        }
    }

    /// Configured endpoint or the format default
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| self.format.default_endpoint())
    }

    /// Number of stats pushes per print window, per worker
    pub fn stats_print_to_push_ratio(&self) -> usize {
        let ratio = self.stats_print_interval.as_secs_f64() / self.stats_push_interval.as_secs_f64();
        (ratio.round() as usize).max(1)
    }
}
