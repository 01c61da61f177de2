//! InfluxDB line protocol, one line per batch:
//! `tsgen[,k=v...] name1=v1,name2=v2 nanos`

use bytes::Bytes;

use super::tags::tokenize;
use crate::sample::MetricSample;

const MEASUREMENT: Bytes = Bytes::from_static(b"tsgen");
const SPACE: Bytes = Bytes::from_static(b" ");
const EQUAL: Bytes = Bytes::from_static(b"=");
const COMMA: Bytes = Bytes::from_static(b",");

pub fn format_tags(raw: &str) -> Bytes {
    let mut out = String::new();
    for (key, value) in tokenize(raw) {
        out.push(',');
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    Bytes::from(out)
}

pub fn format_batch(samples: &[MetricSample]) -> Vec<Bytes> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };

    let mut segments = Vec::with_capacity(samples.len() * 4 + 4);
    segments.extend([MEASUREMENT, first.tags.clone(), SPACE]);

    for (i, sample) in samples.iter().enumerate() {
        if i > 0 {
            segments.push(COMMA);
        }
        segments.extend([sample.name.clone(), EQUAL, sample.value.clone()]);
    }

    // line protocol carries one timestamp per line
    segments.extend([SPACE, Bytes::from(first.timestamp_nanos.to_string())]);
    segments
}
