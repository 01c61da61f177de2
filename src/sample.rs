use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;

/// Kind of metric a generator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        }
    }

    pub fn as_bytes(&self) -> Bytes {
        Bytes::from_static(self.as_str().as_bytes())
    }
}

/// Metadata shared by every clone of one generator family
#[derive(Debug)]
pub struct StaticMetadata {
    /// Name as declared in the profile
    pub name: String,
    /// Shared tags, already formatted for the target protocol
    pub tags: Bytes,
    pub metric_type: MetricType,
}

impl StaticMetadata {
    pub fn new(name: impl Into<String>, tags: Bytes, metric_type: MetricType) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            tags,
            metric_type,
        })
    }
}

/// One timestamped observation produced by a generator
#[derive(Debug, Clone)]
pub struct MetricSample {
    pub metadata: Arc<StaticMetadata>,
    /// Worker-specific metric name
    pub name: Bytes,
    /// Worker-specific tags, formatted for the target protocol
    pub tags: Bytes,
    /// Pre-rendered ASCII value, possibly shared with a value cache
    pub value: Bytes,
    pub timestamp_nanos: i64,
}

impl MetricSample {
    pub fn metric_type(&self) -> MetricType {
        self.metadata.metric_type
    }
}

/// Current wall-clock time as Unix nanoseconds
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}
