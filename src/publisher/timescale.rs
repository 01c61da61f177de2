use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use super::Publisher;
use crate::encoder::Payload;
use crate::error::PublishError;
use crate::sample::{MetricSample, MetricType};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tsgen_metrics (
    time TIMESTAMPTZ NOT NULL,
    name TEXT NOT NULL,
    value DOUBLE PRECISION NOT NULL,
    kind TEXT NOT NULL,
    tags JSONB NOT NULL DEFAULT '{}'::jsonb
)
"#;

/// Numeric value parsed back from its rendered bytes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointValue {
    Int(i64),
    Float(f64),
}

impl PointValue {
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(raw).ok()?;
        text.parse::<i64>()
            .map(PointValue::Int)
            .or_else(|_| text.parse::<f64>().map(PointValue::Float))
            .ok()
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            PointValue::Int(v) => v as f64,
            PointValue::Float(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Counter,
    Gauge,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Counter => "counter",
            ValueKind::Gauge => "gauge",
        }
    }
}

impl From<MetricType> for ValueKind {
    fn from(metric_type: MetricType) -> Self {
        match metric_type {
            MetricType::Counter => ValueKind::Counter,
            MetricType::Gauge => ValueKind::Gauge,
        }
    }
}

/// One row of `tsgen_metrics`
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub time: DateTime<Utc>,
    pub name: String,
    pub value: PointValue,
    pub kind: ValueKind,
    pub tags: BTreeMap<String, String>,
}

impl Row {
    /// `None` when the value bytes are not numeric
    pub fn from_sample(sample: &MetricSample) -> Option<Self> {
        let value = PointValue::parse(&sample.value)?;

        let mut tags = BTreeMap::new();
        for raw in [&sample.metadata.tags, &sample.tags] {
            merge_tags(&mut tags, raw);
        }

        Some(Self {
            time: Utc.timestamp_nanos(sample.timestamp_nanos),
            name: String::from_utf8_lossy(&sample.name).into_owned(),
            value,
            kind: sample.metric_type().into(),
            tags,
        })
    }
}

/// Later tags override earlier ones with the same key
fn merge_tags(tags: &mut BTreeMap<String, String>, raw: &[u8]) {
    let raw = String::from_utf8_lossy(raw);
    for tag in raw.split(',') {
        let (key, value) = tag.split_once('=').unwrap_or((tag, ""));
        if !key.is_empty() {
            tags.insert(key.to_string(), value.to_string());
        }
    }
}

/// Inserts sample batches into Postgres/TimescaleDB through a shared pool
#[derive(Debug, Clone)]
pub struct TimescalePublisher {
    pool: PgPool,
}

impl TimescalePublisher {
    pub async fn connect(url: &str) -> Result<Self, PublishError> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .acquire_timeout(Duration::from_secs(1))
            .connect(url)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        info!("Connected to Timescale, writing to table tsgen_metrics");

        Ok(Self { pool })
    }
}

#[async_trait]
impl Publisher for TimescalePublisher {
    #[tracing::instrument(skip(self, payload), fields(samples = payload.len()))]
    async fn publish(&mut self, payload: &Payload) -> Result<(), PublishError> {
        let Payload::Samples(samples) = payload else {
            return Err(PublishError::Unsupported(
                "Timescale publisher only accepts sample batches",
            ));
        };

        let rows: Vec<Row> = samples.iter().filter_map(Row::from_sample).collect();
        if rows.is_empty() {
            return Ok(());
        }

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO tsgen_metrics (time, name, value, kind, tags) ");
        query.push_values(rows, |mut b, row| {
            b.push_bind(row.time)
                .push_bind(row.name)
                .push_bind(row.value.as_f64())
                .push_bind(row.kind.as_str())
                .push_bind(Json(row.tags));
        });

        query.build().execute(&self.pool).await?;
        Ok(())
    }
}
