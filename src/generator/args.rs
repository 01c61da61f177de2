use std::str::FromStr;

use crate::error::ConfigError;

/// `key: value` arguments of one generator declared in the profile.
/// Unknown keys are ignored; the last occurrence of a key wins.
#[derive(Debug, Clone)]
pub struct GeneratorArgs<'a> {
    generator: &'static str,
    pairs: &'a [(String, String)],
}

impl<'a> GeneratorArgs<'a> {
    pub fn new(generator: &'static str, pairs: &'a [(String, String)]) -> Self {
        Self { generator, pairs }
    }

    fn raw(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn invalid(&self, key: &'static str, value: &str) -> ConfigError {
        ConfigError::InvalidArgument {
            generator: self.generator,
            key,
            value: value.to_string(),
        }
    }

    pub fn name(&self, default: &str) -> Result<String, ConfigError> {
        match self.raw("name") {
            Some("") => Err(self.invalid("name", "")),
            Some(name) => Ok(name.to_string()),
            None => Ok(default.to_string()),
        }
    }

    pub fn int(&self, key: &'static str, default: i64) -> Result<i64, ConfigError> {
        self.parsed(key, default)
    }

    /// Finite floats only; `NaN` and `inf` are rejected
    pub fn float(&self, key: &'static str, default: f64) -> Result<f64, ConfigError> {
        let value: f64 = self.parsed(key, default)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.invalid(key, self.raw(key).unwrap_or_default()))
        }
    }

    pub fn boolean(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.raw(key) {
            None => Ok(default),
            Some(value) => parse_bool(value).ok_or_else(|| self.invalid(key, value)),
        }
    }

    fn parsed<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.raw(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| self.invalid(key, value)),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_and_overrides() {
        let p = pairs(&[("value", "7"), ("reset", "false"), ("value", "9")]);
        let args = GeneratorArgs::new("int counter", &p);

        assert_eq!(args.int("value", 42).unwrap(), 9);
        assert_eq!(args.int("increment", 1).unwrap(), 1);
        assert!(!args.boolean("reset", true).unwrap());
        assert_eq!(args.name("answer").unwrap(), "answer");
    }

    #[test]
    fn test_invalid_values() {
        let p = pairs(&[("min", "abc"), ("reset", "maybe"), ("name", "")]);
        let args = GeneratorArgs::new("random int", &p);

        let err = args.int("min", 0).unwrap_err();
        assert_eq!(err.to_string(), "Error parsing random int min 'abc'");
        assert!(args.boolean("reset", true).is_err());
        assert!(args.name("x").is_err());
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        let p = pairs(&[("max", "inf"), ("value", "NaN"), ("min", "-0.5")]);
        let args = GeneratorArgs::new("float counter", &p);

        let err = args.float("max", 1.0).unwrap_err();
        assert_eq!(err.to_string(), "Error parsing float counter max 'inf'");
        assert!(matches!(
            args.float("value", 1.0),
            Err(ConfigError::InvalidArgument { key: "value", .. })
        ));
        assert_eq!(args.float("min", 0.0).unwrap(), -0.5);
    }
}
