//! M3DB `writetagged` JSON. The endpoint takes one datapoint per request so
//! only the first sample of a batch is encoded.

use bytes::Bytes;

use super::tags::tokenize;
use crate::sample::MetricSample;

const HEADER: Bytes =
    Bytes::from_static(b"{\"namespace\":\"default\",\"id\":\"foo\",\"tags\":[{\"name\":\"__name__\",\"value\":\"");
const NAME_CLOSE: Bytes = Bytes::from_static(b"\"}");
const DATAPOINT: Bytes = Bytes::from_static(b"],\"datapoint\":{\"timestamp\":");
const VALUE: Bytes = Bytes::from_static(b",\"value\":");
const CLOSE: Bytes = Bytes::from_static(b"}}");

/// Each tag rendered as `,{"name":"k","value":"v"}`; `__name__` always comes first
pub fn format_tags(raw: &str) -> Bytes {
    let mut out = String::new();
    for (key, value) in tokenize(raw) {
        out.push_str(&format!(",{{\"name\":\"{key}\",\"value\":\"{value}\"}}"));
    }
    Bytes::from(out)
}

pub fn format_batch(samples: &[MetricSample]) -> Vec<Bytes> {
    let Some(sample) = samples.first() else {
        return Vec::new();
    };

    vec![
        HEADER,
        sample.name.clone(),
        NAME_CLOSE,
        sample.tags.clone(),
        DATAPOINT,
        Bytes::from((sample.timestamp_nanos / 1_000_000_000).to_string()),
        VALUE,
        sample.value.clone(),
        CLOSE,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::test_support::{concat, sample};

    #[test]
    fn test_single_metric_with_tags() {
        let samples = [sample("testValue", format_tags("tag1=value1,tag2=value2"), "42")];
        assert_eq!(
            concat(&format_batch(&samples)),
            r#"{"namespace":"default","id":"foo","tags":[{"name":"__name__","value":"testValue"},{"name":"tag1","value":"value1"},{"name":"tag2","value":"value2"}],"datapoint":{"timestamp":1257894000,"value":42}}"#
        );
    }

    #[test]
    fn test_only_first_sample_is_encoded() {
        let samples = [
            sample("first", format_tags(""), "1"),
            sample("second", format_tags(""), "2"),
        ];
        let body = concat(&format_batch(&samples));
        assert!(body.contains("first"));
        assert!(!body.contains("second"));
    }

    #[test]
    fn test_body_is_valid_json() {
        let samples = [sample("tsgen.rtt-1", format_tags("dc=east,worker=1"), "12.5000")];
        let body: serde_json::Value = serde_json::from_str(&concat(&format_batch(&samples))).unwrap();

        assert_eq!(body["tags"].as_array().unwrap().len(), 3);
        assert_eq!(body["tags"][2]["value"], "1");
        assert_eq!(body["datapoint"]["value"], 12.5);
    }
}
