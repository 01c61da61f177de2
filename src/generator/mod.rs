//! Value generators.
//!
//! A generator is built once per profile entry; each worker then receives its
//! own clone through [`Generator::clone_for_worker`]. Clones share the
//! immutable configuration and value cache, and own their cursor and RNG.

pub mod args;
pub mod cache;
pub mod counter;
pub mod latency;
pub mod random;
pub mod render;

use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::sample::MetricSample;
use args::GeneratorArgs;
pub use counter::{FloatCounter, IntCounter};
pub use latency::LatencyDistribution;
pub use random::{FloatRandom, IntRandom};

/// Generator names accepted in a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    CounterInt,
    CounterFloat,
    RandomInt,
    RandomFloat,
    Latency,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::CounterInt => "counterInt",
            GeneratorKind::CounterFloat => "counterFloat",
            GeneratorKind::RandomInt => "randomInt",
            GeneratorKind::RandomFloat => "randomFloat",
            GeneratorKind::Latency => "latency",
        }
    }

    /// Label used in argument error messages
    fn label(&self) -> &'static str {
        match self {
            GeneratorKind::CounterInt => "int counter",
            GeneratorKind::CounterFloat => "float counter",
            GeneratorKind::RandomInt => "random int",
            GeneratorKind::RandomFloat => "random float",
            GeneratorKind::Latency => "latency distribution",
        }
    }
}

impl FromStr for GeneratorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counterInt" => Ok(GeneratorKind::CounterInt),
            "counterFloat" => Ok(GeneratorKind::CounterFloat),
            "randomInt" => Ok(GeneratorKind::RandomInt),
            "randomFloat" => Ok(GeneratorKind::RandomFloat),
            "latency" => Ok(GeneratorKind::Latency),
            other => Err(ConfigError::UnknownGenerator(other.to_string())),
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum Generator {
    IntCounter(IntCounter),
    FloatCounter(FloatCounter),
    IntRandom(IntRandom),
    FloatRandom(FloatRandom),
    Latency(LatencyDistribution),
}

impl Generator {
    /// Build a generator family from its profile arguments.
    /// `shared_tags` are already formatted for the target protocol.
    pub fn build(
        kind: GeneratorKind,
        pairs: &[(String, String)],
        shared_tags: Bytes,
    ) -> Result<Self, ConfigError> {
        let args = GeneratorArgs::new(kind.label(), pairs);
        Ok(match kind {
            GeneratorKind::CounterInt => Generator::IntCounter(IntCounter::from_args(&args, shared_tags)?),
            GeneratorKind::CounterFloat => {
                Generator::FloatCounter(FloatCounter::from_args(&args, shared_tags)?)
            }
            GeneratorKind::RandomInt => Generator::IntRandom(IntRandom::from_args(&args, shared_tags)?),
            GeneratorKind::RandomFloat => {
                Generator::FloatRandom(FloatRandom::from_args(&args, shared_tags)?)
            }
            GeneratorKind::Latency => {
                Generator::Latency(LatencyDistribution::from_args(&args, shared_tags)?)
            }
        })
    }

    pub fn generate_sample(&mut self) -> MetricSample {
        match self {
            Generator::IntCounter(g) => g.generate_sample(),
            Generator::FloatCounter(g) => g.generate_sample(),
            Generator::IntRandom(g) => g.generate_sample(),
            Generator::FloatRandom(g) => g.generate_sample(),
            Generator::Latency(g) => g.generate_sample(),
        }
    }

    /// Per-worker instance with its own metric name and formatted tags
    pub fn clone_for_worker(&self, name: String, tags: Bytes) -> Self {
        match self {
            Generator::IntCounter(g) => Generator::IntCounter(g.clone_for_worker(name, tags)),
            Generator::FloatCounter(g) => Generator::FloatCounter(g.clone_for_worker(name, tags)),
            Generator::IntRandom(g) => Generator::IntRandom(g.clone_for_worker(name, tags)),
            Generator::FloatRandom(g) => Generator::FloatRandom(g.clone_for_worker(name, tags)),
            Generator::Latency(g) => Generator::Latency(g.clone_for_worker(name, tags)),
        }
    }

    /// Name declared in the profile
    pub fn name(&self) -> &str {
        match self {
            Generator::IntCounter(g) => g.base_name(),
            Generator::FloatCounter(g) => g.base_name(),
            Generator::IntRandom(g) => g.base_name(),
            Generator::FloatRandom(g) => g.base_name(),
            Generator::Latency(g) => g.base_name(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Generator::IntCounter(g) => g.describe(),
            Generator::FloatCounter(g) => g.describe(),
            Generator::IntRandom(g) => g.describe(),
            Generator::FloatRandom(g) => g.describe(),
            Generator::Latency(g) => g.describe(),
        }
    }
}
