//! Carbon plaintext: `name[;k=v;...] value seconds\n` per sample

use bytes::Bytes;

use super::tags::tokenize;
use crate::sample::MetricSample;

const SPACE: Bytes = Bytes::from_static(b" ");
const NEWLINE: Bytes = Bytes::from_static(b"\n");

pub fn format_tags(raw: &str) -> Bytes {
    let mut out = String::new();
    for (key, value) in tokenize(raw) {
        out.push(';');
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    Bytes::from(out)
}

pub fn format_batch(samples: &[MetricSample]) -> Vec<Bytes> {
    let mut segments = Vec::with_capacity(samples.len() * 7);
    for sample in samples {
        segments.extend([
            sample.name.clone(),
            sample.tags.clone(),
            SPACE,
            sample.value.clone(),
            SPACE,
            Bytes::from((sample.timestamp_nanos / 1_000_000_000).to_string()),
            NEWLINE,
        ]);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::test_support::{concat, sample};

    #[test]
    fn test_single_metric_no_tags() {
        let samples = [sample("testValue", format_tags(""), "42")];
        assert_eq!(concat(&format_batch(&samples)), "testValue 42 1257894000\n");
    }

    #[test]
    fn test_single_metric_with_tags() {
        let tags = format_tags("tag1=value1,tag2=value2");
        let samples = [sample("testValue", tags, "42")];
        assert_eq!(
            concat(&format_batch(&samples)),
            "testValue;tag1=value1;tag2=value2 42 1257894000\n"
        );
    }

    #[test]
    fn test_two_metrics_with_tags() {
        let tags = format_tags("tag1=value1,tag2=value2");
        let samples = [
            sample("testValue1", tags.clone(), "42"),
            sample("testValue2", tags, "84"),
        ];
        assert_eq!(
            concat(&format_batch(&samples)),
            "testValue1;tag1=value1;tag2=value2 42 1257894000\ntestValue2;tag1=value1;tag2=value2 84 1257894000\n"
        );
    }

    #[test]
    fn test_segments_reference_sample_bytes() {
        let samples = [sample("testValue", Bytes::new(), "42")];
        let segments = format_batch(&samples);
        assert_eq!(segments[0].as_ptr(), samples[0].name.as_ptr());
        assert_eq!(segments[3].as_ptr(), samples[0].value.as_ptr());
    }
}
