use bytes::Bytes;
use std::sync::Arc;

use super::args::GeneratorArgs;
use super::cache::ValueCache;
use super::render::{render_float, render_int};
use crate::error::ConfigError;
use crate::sample::{now_nanos, MetricSample, MetricType, StaticMetadata};

#[derive(Debug)]
struct IntCounterConfig {
    metadata: Arc<StaticMetadata>,
    increment: i64,
    min: i64,
    max: i64,
    reset: bool,
    cache: Option<ValueCache>,
}

/// Integer counter stepping by a fixed increment between `min` and `max`.
///
/// Past a bound the counter either wraps to the opposite bound (`reset`) or
/// stays at the bound it reached for the rest of its life.
#[derive(Debug, Clone)]
pub struct IntCounter {
    config: Arc<IntCounterConfig>,
    name: Bytes,
    tags: Bytes,
    value: i64,
    terminal: Option<Bytes>,
}

impl IntCounter {
    pub fn from_args(args: &GeneratorArgs<'_>, tags: Bytes) -> Result<Self, ConfigError> {
        let name = args.name("answerToEverything")?;
        let value = args.int("value", 42)?;
        let increment = args.int("increment", 1)?;
        let mut min = args.int("min", 0)?;
        let mut max = args.int("max", i32::MAX as i64)?;
        let reset = args.boolean("reset", true)?;

        if max < min {
            return Err(ConfigError::InvalidRange {
                min: min.to_string(),
                max: max.to_string(),
            });
        }

        if increment == 0 {
            min = value;
            max = value;
        } else if value < min || value > max {
            return Err(ConfigError::ValueOutOfRange {
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }

        let cache = ValueCache::for_range(min, max);
        if let Some(cache) = &cache {
            cache.get_or_render(value);
        }

        let metadata = StaticMetadata::new(name, tags, MetricType::Counter);
        Ok(Self {
            name: Bytes::from(metadata.name.clone()),
            tags: metadata.tags.clone(),
            config: Arc::new(IntCounterConfig {
                metadata,
                increment,
                min,
                max,
                reset,
                cache,
            }),
            value,
            terminal: None,
        })
    }

    pub fn clone_for_worker(&self, name: String, tags: Bytes) -> Self {
        Self {
            config: self.config.clone(),
            name: Bytes::from(name),
            tags,
            value: self.value,
            terminal: self.terminal.clone(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.config.metadata.name
    }

    pub fn generate_sample(&mut self) -> MetricSample {
        let value = match self.terminal.clone() {
            Some(terminal) => terminal,
            None => {
                let rendered = self.render(self.value);
                self.advance();
                rendered
            }
        };

        MetricSample {
            metadata: self.config.metadata.clone(),
            name: self.name.clone(),
            tags: self.tags.clone(),
            value,
            timestamp_nanos: now_nanos(),
        }
    }

    fn render(&self, value: i64) -> Bytes {
        match &self.config.cache {
            Some(cache) => cache.get_or_render(value),
            None => render_int(value),
        }
    }

    fn advance(&mut self) {
        let config = &self.config;
        if config.increment == 0 {
            return;
        }

        let next = self.value.saturating_add(config.increment);
        if next >= config.min && next <= config.max {
            self.value = next;
            return;
        }

        let (reached, opposite) = if config.increment > 0 {
            (config.max, config.min)
        } else {
            (config.min, config.max)
        };

        if config.reset {
            self.value = opposite;
        } else {
            self.value = reached;
            self.terminal = Some(self.render(reached));
        }
    }

    pub fn describe(&self) -> String {
        let c = &self.config;
        let mut out = format!("Int counter generator ({})", c.metadata.name);
        if c.increment == 0 {
            out.push_str(&format!(" with a value of {}", self.value));
            return out;
        }

        out.push_str(&format!(
            " of initial value {} with increments of {}",
            self.value, c.increment
        ));
        if c.increment > 0 {
            out.push_str(&format!(" up to a maximum of {}", c.max));
            if c.reset {
                out.push_str(&format!(", it will then reset to {}.", c.min));
            }
        } else {
            out.push_str(&format!(" up to a minimum of {}", c.min));
            if c.reset {
                out.push_str(&format!(", it will then reset to {}.", c.max));
            }
        }
        out
    }
}

#[derive(Debug)]
struct FloatCounterConfig {
    metadata: Arc<StaticMetadata>,
    increment: f64,
    min: f64,
    max: f64,
    reset: bool,
    fixed: Option<Bytes>,
}

/// Float counter; same stepping rules as [`IntCounter`], values are never cached
#[derive(Debug, Clone)]
pub struct FloatCounter {
    config: Arc<FloatCounterConfig>,
    name: Bytes,
    tags: Bytes,
    value: f64,
    terminal: Option<Bytes>,
}

impl FloatCounter {
    pub fn from_args(args: &GeneratorArgs<'_>, tags: Bytes) -> Result<Self, ConfigError> {
        let name = args.name("pi")?;
        let value = args.float("value", 3.14)?;
        let increment = args.float("increment", 1.0)?;
        let mut min = args.float("min", 0.0)?;
        let mut max = args.float("max", 1e14)?;
        let reset = args.boolean("reset", true)?;

        if max < min {
            return Err(ConfigError::InvalidRange {
                min: min.to_string(),
                max: max.to_string(),
            });
        }

        let fixed = if increment == 0.0 {
            min = value;
            max = value;
            Some(render_float(value))
        } else if value < min || value > max {
            return Err(ConfigError::ValueOutOfRange {
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        } else {
            None
        };

        let metadata = StaticMetadata::new(name, tags, MetricType::Counter);
        Ok(Self {
            name: Bytes::from(metadata.name.clone()),
            tags: metadata.tags.clone(),
            config: Arc::new(FloatCounterConfig {
                metadata,
                increment,
                min,
                max,
                reset,
                fixed,
            }),
            value,
            terminal: None,
        })
    }

    pub fn clone_for_worker(&self, name: String, tags: Bytes) -> Self {
        Self {
            config: self.config.clone(),
            name: Bytes::from(name),
            tags,
            value: self.value,
            terminal: self.terminal.clone(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.config.metadata.name
    }

    pub fn generate_sample(&mut self) -> MetricSample {
        let value = match self.config.fixed.clone().or_else(|| self.terminal.clone()) {
            Some(value) => value,
            None => {
                let rendered = render_float(self.value);
                self.advance();
                rendered
            }
        };

        MetricSample {
            metadata: self.config.metadata.clone(),
            name: self.name.clone(),
            tags: self.tags.clone(),
            value,
            timestamp_nanos: now_nanos(),
        }
    }

    fn advance(&mut self) {
        let config = &self.config;
        let next = self.value + config.increment;
        if next >= config.min && next <= config.max {
            self.value = next;
            return;
        }

        let (reached, opposite) = if config.increment > 0.0 {
            (config.max, config.min)
        } else {
            (config.min, config.max)
        };

        if config.reset {
            self.value = opposite;
        } else {
            self.value = reached;
            self.terminal = Some(render_float(reached));
        }
    }

    pub fn describe(&self) -> String {
        let c = &self.config;
        let mut out = format!("Float counter generator ({})", c.metadata.name);
        if c.increment == 0.0 {
            out.push_str(&format!(" with a value of {:.4}", self.value));
            return out;
        }

        out.push_str(&format!(
            " of initial value {:.4} with increments of {:.4}",
            self.value, c.increment
        ));
        if c.increment > 0.0 {
            out.push_str(&format!(" up to a maximum of {:.4}", c.max));
            if c.reset {
                out.push_str(&format!(", it will then reset to {:.4}.", c.min));
            }
        } else {
            out.push_str(&format!(" up to a minimum of {:.4}", c.min));
            if c.reset {
                out.push_str(&format!(", it will then reset to {:.4}.", c.max));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_counter(raw: &[(&str, &str)]) -> Result<IntCounter, ConfigError> {
        let pairs: Vec<(String, String)> = raw
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IntCounter::from_args(&GeneratorArgs::new("int counter", &pairs), Bytes::new())
    }

    fn float_counter(raw: &[(&str, &str)]) -> Result<FloatCounter, ConfigError> {
        let pairs: Vec<(String, String)> = raw
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FloatCounter::from_args(&GeneratorArgs::new("float counter", &pairs), Bytes::new())
    }

    fn int_values(counter: &mut IntCounter, n: usize) -> Vec<String> {
        (0..n)
            .map(|_| String::from_utf8(counter.generate_sample().value.to_vec()).unwrap())
            .collect()
    }

    fn float_values(counter: &mut FloatCounter, n: usize) -> Vec<String> {
        (0..n)
            .map(|_| String::from_utf8(counter.generate_sample().value.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_static_int() {
        let mut c = int_counter(&[("value", "99"), ("increment", "0")]).unwrap();
        assert_eq!(int_values(&mut c, 3), ["99", "99", "99"]);
    }

    #[test]
    fn test_increment_and_decrement_int() {
        let mut c = int_counter(&[("value", "99"), ("increment", "1")]).unwrap();
        assert_eq!(int_values(&mut c, 3), ["99", "100", "101"]);

        let mut c = int_counter(&[("value", "99"), ("increment", "-1")]).unwrap();
        assert_eq!(int_values(&mut c, 3), ["99", "98", "97"]);
    }

    #[test]
    fn test_increment_without_cache() {
        let mut c = int_counter(&[
            ("value", "0"),
            ("min", "0"),
            ("max", "100000000"),
            ("increment", "50000000"),
        ])
        .unwrap();
        assert!(c.config.cache.is_none());
        assert_eq!(int_values(&mut c, 3), ["0", "50000000", "100000000"]);
    }

    #[test]
    fn test_int_overflow_wraps() {
        let mut c = int_counter(&[("value", "2147483647"), ("increment", "1")]).unwrap();
        assert_eq!(int_values(&mut c, 3), ["2147483647", "0", "1"]);

        let mut c = int_counter(&[
            ("value", "-2147483648"),
            ("increment", "-1"),
            ("min", "-2147483648"),
            ("max", "0"),
        ])
        .unwrap();
        assert_eq!(int_values(&mut c, 3), ["-2147483648", "0", "-1"]);
    }

    #[test]
    fn test_int_reset() {
        let mut c = int_counter(&[
            ("value", "1"),
            ("increment", "2"),
            ("min", "0"),
            ("max", "5"),
        ])
        .unwrap();
        assert_eq!(int_values(&mut c, 5), ["1", "3", "5", "0", "2"]);

        let mut c = int_counter(&[
            ("value", "6"),
            ("increment", "-3"),
            ("min", "0"),
            ("max", "10"),
        ])
        .unwrap();
        assert_eq!(int_values(&mut c, 5), ["6", "3", "0", "10", "7"]);
    }

    #[test]
    fn test_int_clamp() {
        let mut c = int_counter(&[
            ("value", "1"),
            ("increment", "2"),
            ("max", "5"),
            ("reset", "false"),
        ])
        .unwrap();
        assert_eq!(int_values(&mut c, 5), ["1", "3", "5", "5", "5"]);

        let mut c = int_counter(&[
            ("value", "6"),
            ("increment", "-3"),
            ("min", "0"),
            ("reset", "false"),
        ])
        .unwrap();
        assert_eq!(int_values(&mut c, 4), ["6", "3", "0", "0"]);
    }

    #[test]
    fn test_clamped_instance_does_not_affect_siblings() {
        let base = int_counter(&[
            ("value", "1"),
            ("increment", "2"),
            ("max", "5"),
            ("reset", "false"),
        ])
        .unwrap();
        let mut first = base.clone_for_worker("a".to_string(), Bytes::new());
        let mut second = base.clone_for_worker("b".to_string(), Bytes::new());

        assert_eq!(int_values(&mut first, 4), ["1", "3", "5", "5"]);
        assert_eq!(int_values(&mut second, 2), ["1", "3"]);
    }

    #[test]
    fn test_values_stay_in_range() {
        let mut c = int_counter(&[
            ("value", "3"),
            ("increment", "7"),
            ("min", "-4"),
            ("max", "11"),
        ])
        .unwrap();
        for value in int_values(&mut c, 200) {
            let v: i64 = value.parse().unwrap();
            assert!((-4..=11).contains(&v));
        }
    }

    #[test]
    fn test_cached_values_share_bytes() {
        let base = int_counter(&[("value", "0"), ("max", "10"), ("increment", "5")]).unwrap();
        let mut first = base.clone_for_worker("a".to_string(), Bytes::new());
        let mut second = base.clone_for_worker("b".to_string(), Bytes::new());

        let a = first.generate_sample().value;
        let b = second.generate_sample().value;
        assert_eq!(a, b);
        assert_eq!(a.as_ptr(), b.as_ptr());
    }

    #[test]
    fn test_int_rejects_invalid_bounds() {
        assert!(matches!(
            int_counter(&[("min", "10"), ("max", "5")]),
            Err(ConfigError::InvalidRange { .. })
        ));
        assert!(matches!(
            int_counter(&[("value", "-5")]),
            Err(ConfigError::ValueOutOfRange { .. })
        ));
        // a static counter ignores the range
        assert!(int_counter(&[("value", "-5"), ("increment", "0")]).is_ok());
    }

    #[test]
    fn test_static_float() {
        let mut c = float_counter(&[("value", "1.1"), ("increment", "0")]).unwrap();
        assert_eq!(float_values(&mut c, 3), ["1.1000", "1.1000", "1.1000"]);
    }

    #[test]
    fn test_increment_and_decrement_float() {
        let mut c = float_counter(&[("value", "50.0"), ("increment", "2.5")]).unwrap();
        assert_eq!(float_values(&mut c, 3), ["50.0000", "52.5000", "55.0000"]);

        let mut c = float_counter(&[("value", "25"), ("increment", "-2.5")]).unwrap();
        assert_eq!(float_values(&mut c, 3), ["25.0000", "22.5000", "20.0000"]);
    }

    #[test]
    fn test_very_small_negative_float() {
        let mut c = float_counter(&[
            ("value", "-0.00000015"),
            ("min", "-1000"),
            ("increment", "-2.5"),
        ])
        .unwrap();
        assert_eq!(float_values(&mut c, 3), ["-0.0000", "-2.5000", "-5.0000"]);
    }

    #[test]
    fn test_float_reset() {
        let mut c = float_counter(&[
            ("value", "1.0"),
            ("increment", "2.5"),
            ("min", "0"),
            ("max", "6"),
        ])
        .unwrap();
        assert_eq!(
            float_values(&mut c, 5),
            ["1.0000", "3.5000", "6.0000", "0.0000", "2.5000"]
        );

        let mut c = float_counter(&[
            ("value", "6.0"),
            ("increment", "-2.5"),
            ("min", "1"),
            ("max", "10"),
        ])
        .unwrap();
        assert_eq!(
            float_values(&mut c, 5),
            ["6.0000", "3.5000", "1.0000", "10.0000", "7.5000"]
        );
    }

    #[test]
    fn test_float_clamp() {
        let mut c = float_counter(&[
            ("value", "1.0"),
            ("increment", "2.5"),
            ("max", "6"),
            ("reset", "false"),
        ])
        .unwrap();
        assert_eq!(
            float_values(&mut c, 4),
            ["1.0000", "3.5000", "6.0000", "6.0000"]
        );

        let mut c = float_counter(&[
            ("value", "6.0"),
            ("increment", "-2.5"),
            ("min", "1"),
            ("reset", "false"),
        ])
        .unwrap();
        assert_eq!(
            float_values(&mut c, 4),
            ["6.0000", "3.5000", "1.0000", "1.0000"]
        );
    }

    #[test]
    fn test_describe() {
        let c = int_counter(&[("name", "hits"), ("value", "1"), ("max", "9")]).unwrap();
        assert_eq!(
            c.describe(),
            "Int counter generator (hits) of initial value 1 with increments of 1 up to a maximum of 9, it will then reset to 0."
        );

        let c = float_counter(&[("increment", "0")]).unwrap();
        assert_eq!(c.describe(), "Float counter generator (pi) with a value of 3.1400");
    }
}
