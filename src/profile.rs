//! Profile grammar: `generatorName={key: value, ...},generatorName2={...}`

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error};

use crate::error::ConfigError;
use crate::generator::{Generator, GeneratorKind};

static PROFILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z]*=\{[^}]*\}(,[a-zA-Z]*=\{[^}]*\})*$").expect("valid regex")
});
static GENERATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]*=\{[^}]*\}").expect("valid regex"));
static ARGUMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]*:\s?[^,}]*").expect("valid regex"));

/// One generator declaration from the profile
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSpec {
    pub kind: GeneratorKind,
    pub args: Vec<(String, String)>,
}

/// Split a profile into generator declarations.
///
/// A profile that doesn't match the grammar, or that names an unknown
/// generator, is rejected as a whole.
pub fn parse_profile(profile: &str) -> Result<Vec<GeneratorSpec>, ConfigError> {
    if !PROFILE_RE.is_match(profile) {
        return Err(ConfigError::Profile(profile.to_string()));
    }

    GENERATOR_RE
        .find_iter(profile)
        .map(|declaration| {
            let declaration = declaration.as_str();
            let (name, body) = declaration
                .split_once('=')
                .ok_or_else(|| ConfigError::Profile(profile.to_string()))?;
            let kind: GeneratorKind = name.parse()?;

            let args = ARGUMENT_RE
                .find_iter(body)
                .filter_map(|arg| {
                    let (key, value) = arg.as_str().split_once(':')?;
                    Some((key.trim().to_string(), value.trim().to_string()))
                })
                .collect();

            Ok(GeneratorSpec { kind, args })
        })
        .collect()
}

/// Build every declared generator. Generators whose arguments are invalid
/// are logged and skipped; the others are still returned.
pub fn build_generators(specs: &[GeneratorSpec], shared_tags: &Bytes) -> Vec<Generator> {
    specs
        .iter()
        .filter_map(|spec| {
            match Generator::build(spec.kind, &spec.args, shared_tags.clone()) {
                Ok(generator) => {
                    debug!(kind = %spec.kind, name = generator.name(), "Generator built");
                    Some(generator)
                }
                Err(e) => {
                    error!("Error while instantiating {} generator: {}", spec.kind, e);
                    None
                }
            }
        })
        .collect()
}
