use once_cell::sync::Lazy;
use regex::Regex;

// ASCII word characters; values also admit `-`, which worker names and
// templated metric names contain
static TAG_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[[:word:].]+=[[:word:].\-]+").expect("valid regex"));

/// `key=value` pairs found in a comma-delimited tag string.
/// Malformed tokens are skipped.
pub fn tokenize(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    TAG_TOKEN_RE
        .find_iter(raw)
        .filter_map(|m| m.as_str().split_once('='))
}
