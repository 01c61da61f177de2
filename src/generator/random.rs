use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use super::args::GeneratorArgs;
use super::cache::ValueCache;
use super::render::{render_float, render_int};
use crate::error::ConfigError;
use crate::sample::{now_nanos, MetricSample, MetricType, StaticMetadata};

#[derive(Debug)]
struct IntRandomConfig {
    metadata: Arc<StaticMetadata>,
    min: i64,
    max: i64,
    cache: Option<ValueCache>,
}

/// Uniform integer gauge drawn from `[min, max)`
#[derive(Debug)]
pub struct IntRandom {
    config: Arc<IntRandomConfig>,
    name: Bytes,
    tags: Bytes,
    rng: StdRng,
}

impl IntRandom {
    pub fn from_args(args: &GeneratorArgs<'_>, tags: Bytes) -> Result<Self, ConfigError> {
        let name = args.name("answerToEverything")?;
        let min = args.int("min", 0)?;
        let max = args.int("max", i32::MAX as i64)?;

        if max < min {
            return Err(ConfigError::InvalidRange {
                min: min.to_string(),
                max: max.to_string(),
            });
        }

        let metadata = StaticMetadata::new(name, tags, MetricType::Gauge);
        Ok(Self {
            name: Bytes::from(metadata.name.clone()),
            tags: metadata.tags.clone(),
            config: Arc::new(IntRandomConfig {
                metadata,
                min,
                max,
                cache: ValueCache::for_range(min, max),
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
        let drawn = if config.min == config.max {
            config.min
        } else {
            self.rng.gen_range(config.min..config.max)
        };

        let value = match &config.cache {
            Some(cache) => cache.get_or_render(drawn),
            None => render_int(drawn),
        };

        MetricSample {
            metadata: config.metadata.clone(),
            name: self.name.clone(),
            tags: self.tags.clone(),
            value,
            timestamp_nanos: now_nanos(),
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "Random int generator ({}) between {} and {}",
            self.config.metadata.name, self.config.min, self.config.max
        )
    }
}

#[derive(Debug)]
struct FloatRandomConfig {
    metadata: Arc<StaticMetadata>,
    min: f64,
    max: f64,
}

/// Uniform float gauge drawn from `[min, max)`
#[derive(Debug)]
pub struct FloatRandom {
    config: Arc<FloatRandomConfig>,
    name: Bytes,
    tags: Bytes,
    rng: StdRng,
}

impl FloatRandom {
    pub fn from_args(args: &GeneratorArgs<'_>, tags: Bytes) -> Result<Self, ConfigError> {
        let name = args.name("random")?;
        let min = args.float("min", 0.0)?;
        let max = args.float("max", 100.0)?;

        if max < min {
            return Err(ConfigError::InvalidRange {
                min: min.to_string(),
                max: max.to_string(),
            });
        }

        let metadata = StaticMetadata::new(name, tags, MetricType::Gauge);
        Ok(Self {
            name: Bytes::from(metadata.name.clone()),
            tags: metadata.tags.clone(),
            config: Arc::new(FloatRandomConfig { metadata, min, max }),
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
        let drawn = self.rng.gen::<f64>() * (config.max - config.min) + config.min;

        MetricSample {
            metadata: config.metadata.clone(),
            name: self.name.clone(),
            tags: self.tags.clone(),
            value: render_float(drawn),
            timestamp_nanos: now_nanos(),
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "Random float generator ({}) between {:.6} and {:.6}",
            self.config.metadata.name, self.config.min, self.config.max
        )
    }
}
