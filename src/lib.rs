//! Synthetic time-series traffic generator.
//!
//! Workers tick at a fixed interval, draw one sample from every generator in
//! the profile, encode the batch for the target backend and publish it. A
//! stats aggregator periodically reports the achieved throughput.

pub mod config;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod orchestrator;
pub mod profile;
pub mod publisher;
pub mod sample;
pub mod stats;
pub mod template;
pub mod worker;
