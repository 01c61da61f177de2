//! Right-skewed latency gauge.
//!
//! Response times cluster around the mean with a long tail to the right,
//! which a Gamma distribution with `alpha` in roughly `(1, 4)` reproduces.
//! Lower `alpha` gathers the mass on the left; `beta` is the rate, so a
//! higher `beta` pulls the tail in. Raw draws are rescaled with
//! `raw * (max - min) + min`.

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use std::sync::Arc;

use super::args::GeneratorArgs;
use super::render::render_float;
use crate::error::ConfigError;
use crate::sample::{now_nanos, MetricSample, MetricType, StaticMetadata};

const QUANTILE_SAMPLES: usize = 10_000;

#[derive(Debug)]
struct LatencyConfig {
    metadata: Arc<StaticMetadata>,
    min: f64,
    max: f64,
    alpha: f64,
    beta: f64,
    distribution: Gamma<f64>,
}

impl LatencyConfig {
    fn scale(&self, raw: f64) -> f64 {
        raw * (self.max - self.min) + self.min
    }
}

#[derive(Debug)]
pub struct LatencyDistribution {
    config: Arc<LatencyConfig>,
    name: Bytes,
    tags: Bytes,
    rng: StdRng,
}

impl LatencyDistribution {
    pub fn from_args(args: &GeneratorArgs<'_>, tags: Bytes) -> Result<Self, ConfigError> {
        let name = args.name("random")?;
        let min = args.float("min", 100.0)?;
        let max = args.float("max", 10_000.0)?;
        let alpha = args.float("alpha", 1.5)?;
        let beta = args.float("beta", 10.0)?;

        if max < min {
            return Err(ConfigError::InvalidRange {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        if alpha <= 0.0 || alpha.is_nan() {
            return Err(ConfigError::NonPositive("Alpha"));
        }
        if beta <= 0.0 || beta.is_nan() {
            return Err(ConfigError::NonPositive("Beta"));
        }

        // rand_distr takes the scale, the inverse of the rate
        let distribution = Gamma::new(alpha, 1.0 / beta)
            .map_err(|e| ConfigError::Invalid("latency distribution", e.to_string()))?;

        let metadata = StaticMetadata::new(name, tags, MetricType::Gauge);
        Ok(Self {
            name: Bytes::from(metadata.name.clone()),
            tags: metadata.tags.clone(),
            config: Arc::new(LatencyConfig {
                metadata,
                min,
                max,
                alpha,
                beta,
                distribution,
            }),
            rng: StdRng::from_entropy(),
        })
    }

    pub fn clone_for_worker(&self, name: String, tags: Bytes) -> Self {
        Self {
            config: self.config.clone(),
            name: Bytes::from(name),
            tags,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.config.metadata.name
    }

    pub fn generate_sample(&mut self) -> MetricSample {
        let config = &self.config;
        let raw = config.distribution.sample(&mut self.rng);

        MetricSample {
            metadata: config.metadata.clone(),
            name: self.name.clone(),
            tags: self.tags.clone(),
            value: render_float(config.scale(raw)),
            timestamp_nanos: now_nanos(),
        }
    }

    /// Scaled P50, P95 and P99 estimated from a fixed seeded sample
    pub fn estimate_quantiles(&self) -> [f64; 3] {
        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut draws: Vec<f64> = (0..QUANTILE_SAMPLES)
            .map(|_| config.distribution.sample(&mut rng))
            .collect();
        draws.sort_by(f64::total_cmp);

        [0.50, 0.95, 0.99].map(|q| {
            let index = ((QUANTILE_SAMPLES as f64 * q) as usize).min(QUANTILE_SAMPLES - 1);
            config.scale(draws[index])
        })
    }

    pub fn describe(&self) -> String {
        let config = &self.config;
        let [p50, p95, p99] = self.estimate_quantiles();
        format!(
            "Latency distribution generator ({}) between {:.4} and {:.4} with a mean of {:.4}, P50={:.4}, P95={:.4} and P99={:.4}",
            config.metadata.name,
            config.min,
            config.max,
            config.scale(config.alpha / config.beta),
            p50,
            p95,
            p99
        )
    }
}
