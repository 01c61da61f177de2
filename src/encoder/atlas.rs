//! Atlas publish API JSON.
//!
//! `{"tags":{...},"metrics":[{"tags":{"name":"n","atlas.dstype":"gauge"},"timestamp":ts,"value":v},...]}`
//! with `ts` in `timestamp_nanos / 1000` units.

use bytes::Bytes;

use super::tags::tokenize;
use crate::sample::MetricSample;

const OPEN: Bytes = Bytes::from_static(b"{");
const METRICS_OPEN: Bytes = Bytes::from_static(b",\"metrics\":[");
const METRIC_OPEN: Bytes = Bytes::from_static(b"{\"tags\":{\"name\":\"");
const METRIC_CONTINUE: Bytes = Bytes::from_static(b",{\"tags\":{\"name\":\"");
const DSTYPE: Bytes = Bytes::from_static(b"\",\"atlas.dstype\":\"");
const TIMESTAMP: Bytes = Bytes::from_static(b"\"},\"timestamp\":");
const VALUE: Bytes = Bytes::from_static(b",\"value\":");
const CLOSE: Bytes = Bytes::from_static(b"}");
const METRICS_CLOSE: Bytes = Bytes::from_static(b"]}");

pub fn format_tags(raw: &str) -> Bytes {
    let body: Vec<String> = tokenize(raw)
        .map(|(key, value)| format!("\"{key}\":\"{value}\""))
        .collect();
    Bytes::from(format!("\"tags\":{{{}}}", body.join(",")))
}

pub fn format_batch(samples: &[MetricSample]) -> Vec<Bytes> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };

    let mut segments = Vec::with_capacity(samples.len() * 9 + 4);
    segments.extend([OPEN, first.tags.clone(), METRICS_OPEN]);

    for (i, sample) in samples.iter().enumerate() {
        segments.extend([
            if i == 0 { METRIC_OPEN } else { METRIC_CONTINUE },
            sample.name.clone(),
            DSTYPE,
            sample.metric_type().as_bytes(),
            TIMESTAMP,
            Bytes::from((sample.timestamp_nanos / 1000).to_string()),
            VALUE,
            sample.value.clone(),
            CLOSE,
        ]);
    }

    segments.push(METRICS_CLOSE);
    segments
}
