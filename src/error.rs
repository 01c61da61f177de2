use std::time::Duration;
use thiserror::Error;

use crate::config::{Format, Protocol};

/// Errors raised while turning configuration into generators, templates and publishers
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error parsing {generator} {key} '{value}'")]
    InvalidArgument {
        generator: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("Maximum '{max}' cannot be inferior to minimum '{min}'")]
    InvalidRange { min: String, max: String },

    #[error("Initial value '{value}' is outside of [{min}, {max}]")]
    ValueOutOfRange {
        value: String,
        min: String,
        max: String,
    },

    #[error("{0} must be a positive number")]
    NonPositive(&'static str),

    #[error("Invalid profile string '{0}', expected generatorName={{key: value, ...}},...")]
    Profile(String),

    #[error("Unknown generator '{0}' in profile")]
    UnknownGenerator(String),

    #[error("Invalid tags string '{0}', expected comma-delimited key=value pairs of word characters (eg: tag1=value1,tag2=WORKERNUM)")]
    Tags(String),

    #[error("The {protocol} protocol isn't supported with the {format} format")]
    UnsupportedProtocol { format: Format, protocol: Protocol },

    #[error("Invalid {0}: {1}")]
    Invalid(&'static str, String),
}

/// Errors returned by a single publish attempt
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Unsupported(&'static str),
}
