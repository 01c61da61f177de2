//! Protocol encoders.
//!
//! Byte protocols produce an ordered list of [`Bytes`] segments: static
//! grammar literals interleaved with cheap clones of the sample fields, so
//! sample bytes are never copied. Timescale has no byte form and hands the
//! samples to its publisher as-is.

pub mod atlas;
pub mod carbon;
pub mod influxdb;
pub mod m3db;
pub mod tags;

use bytes::{Bytes, BytesMut};

use crate::config::Format;
use crate::sample::MetricSample;

/// Encoded output of one tick
#[derive(Debug, Clone)]
pub enum Payload {
    Segments(Vec<Bytes>),
    Samples(Vec<MetricSample>),
}

impl Payload {
    /// Number of samples or segments carried
    pub fn len(&self) -> usize {
        match self {
            Payload::Segments(segments) => segments.len(),
            Payload::Samples(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenated wire bytes. Sample payloads render one
    /// `name tags value timestamp` line per sample.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Payload::Segments(segments) => {
                let size = segments.iter().map(Bytes::len).sum();
                let mut buf = BytesMut::with_capacity(size);
                for segment in segments {
                    buf.extend_from_slice(segment);
                }
                buf.freeze()
            }
            Payload::Samples(samples) => {
                let mut buf = BytesMut::new();
                for sample in samples {
                    buf.extend_from_slice(&sample.name);
                    buf.extend_from_slice(b" ");
                    buf.extend_from_slice(&sample.tags);
                    buf.extend_from_slice(b" ");
                    buf.extend_from_slice(&sample.value);
                    buf.extend_from_slice(format!(" {}\n", sample.timestamp_nanos).as_bytes());
                }
                buf.freeze()
            }
        }
    }
}

/// Encoder selected once at startup from the configured format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    Atlas,
    Carbon,
    Influxdb,
    M3db,
    Timescale,
}

impl Encoder {
    pub fn for_format(format: Format) -> Self {
        match format {
            Format::Atlas => Encoder::Atlas,
            Format::Carbon => Encoder::Carbon,
            Format::Influxdb => Encoder::Influxdb,
            Format::M3db => Encoder::M3db,
            Format::Timescale => Encoder::Timescale,
        }
    }

    /// Render a raw `k=v,k2=v2` tag string into this protocol's tag block
    pub fn format_tags(&self, raw: &str) -> Bytes {
        match self {
            Encoder::Atlas => atlas::format_tags(raw),
            Encoder::Carbon => carbon::format_tags(raw),
            Encoder::Influxdb => influxdb::format_tags(raw),
            Encoder::M3db => m3db::format_tags(raw),
            Encoder::Timescale => {
                let pairs: Vec<String> = tags::tokenize(raw)
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                Bytes::from(pairs.join(","))
            }
        }
    }

    pub fn format_batch(&self, samples: Vec<MetricSample>) -> Payload {
        match self {
            Encoder::Atlas => Payload::Segments(atlas::format_batch(&samples)),
            Encoder::Carbon => Payload::Segments(carbon::format_batch(&samples)),
            Encoder::Influxdb => Payload::Segments(influxdb::format_batch(&samples)),
            Encoder::M3db => Payload::Segments(m3db::format_batch(&samples)),
            Encoder::Timescale => Payload::Samples(samples),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};

    use crate::sample::{MetricSample, MetricType, StaticMetadata};

    /// 2009-11-10T23:00:00Z
    pub fn reference_nanos() -> i64 {
        Utc.with_ymd_and_hms(2009, 11, 10, 23, 0, 0)
            .unwrap()
            .timestamp_nanos_opt()
            .unwrap()
    }

    pub fn sample(name: &str, tags: Bytes, value: &str) -> MetricSample {
        MetricSample {
            metadata: StaticMetadata::new(name, tags.clone(), MetricType::Gauge),
            name: Bytes::from(name.to_string()),
            tags,
            value: Bytes::from(value.to_string()),
            timestamp_nanos: reference_nanos(),
        }
    }

    pub fn concat(segments: &[Bytes]) -> String {
        segments
            .iter()
            .map(|s| std::str::from_utf8(s).unwrap())
            .collect()
    }
}
