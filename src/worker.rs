use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::encoder::Encoder;
use crate::generator::Generator;
use crate::publisher::Publisher;
use crate::sample::MetricSample;
use crate::template::WorkerTemplates;

/// Delivery counters of one worker over one accounting window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker_id: usize,
    /// Samples carried by successful publishes
    pub success_count: u64,
    /// Samples carried by failed publishes
    pub failure_count: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    Sent,
    /// Channel full; the record was discarded
    Dropped,
    /// Aggregator is gone
    Closed,
    /// Window not elapsed yet
    NotDue,
}

/// Worker timing settings
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub interval: Duration,
    pub stats_push_interval: Duration,
}

pub struct Worker {
    id: usize,
    full_name: String,
    generators: Vec<Generator>,
    encoder: Encoder,
    publisher: Box<dyn Publisher>,
    settings: WorkerSettings,
    stats_tx: mpsc::Sender<WorkerStats>,
    window_start: Instant,
    success_count: u64,
    failure_count: u64,
}

impl Worker {
    /// Clone every generator family with this worker's metric name and tags
    pub fn new(
        id: usize,
        templates: &WorkerTemplates,
        generators: &[Generator],
        encoder: Encoder,
        publisher: Box<dyn Publisher>,
        settings: WorkerSettings,
        stats_tx: mpsc::Sender<WorkerStats>,
    ) -> Self {
        let generators = generators
            .iter()
            .map(|generator| {
                let metric_name = templates.metric_name(generator.name());
                let tags = encoder.format_tags(&templates.instance_tags(&metric_name));
                generator.clone_for_worker(metric_name, tags)
            })
            .collect();

        Self {
            id,
            full_name: templates.full_name.clone(),
            generators,
            encoder,
            publisher,
            settings,
            stats_tx,
            window_start: Instant::now(),
            success_count: 0,
            failure_count: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Generate, encode and publish one batch. Returns whether the publish succeeded.
    pub async fn tick(&mut self) -> bool {
        let samples: Vec<MetricSample> = self
            .generators
            .iter_mut()
            .map(Generator::generate_sample)
            .collect();
        let count = samples.len() as u64;
        let payload = self.encoder.format_batch(samples);

        match self.publisher.publish(&payload).await {
            Ok(()) => {
                self.success_count += count;
                metrics::counter!(crate::metrics::PUBLISH_SUCCESS, count);
                true
            }
            Err(e) => {
                self.failure_count += count;
                metrics::counter!(crate::metrics::PUBLISH_FAILURE, count);
                debug!(worker = %self.full_name, "Publish failed: {}", e);
                false
            }
        }
    }

    /// Push the current window to the aggregator once it has lasted long
    /// enough. Never waits: a full channel drops the record.
    pub fn flush_stats(&mut self, now: Instant) -> EmitOutcome {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.settings.stats_push_interval {
            return EmitOutcome::NotDue;
        }

        let stats = WorkerStats {
            worker_id: self.id,
            success_count: self.success_count,
            failure_count: self.failure_count,
            elapsed,
        };
        self.window_start = now;
        self.success_count = 0;
        self.failure_count = 0;

        match self.stats_tx.try_send(stats) {
            Ok(()) => EmitOutcome::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => {
                metrics::counter!(crate::metrics::DROPPED_STATS, 1);
                warn!(worker = %self.full_name, "Stats channel full, discarding stats");
                EmitOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => EmitOutcome::Closed,
        }
    }

    /// Tick until cancelled or until the aggregator goes away
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.window_start = Instant::now();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                    if self.flush_stats(Instant::now()) == EmitOutcome::Closed {
                        debug!(worker = %self.full_name, "Stats channel closed");
                        break;
                    }
                }
            }
        }

        info!("Worker {} stopped", self.full_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Format;
    use crate::encoder::Payload;
    use crate::error::PublishError;
    use crate::profile::{build_generators, parse_profile};
    use crate::publisher::NullPublisher;
    use crate::template::Templates;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Recorder {
        bodies: Arc<Mutex<Vec<Bytes>>>,
        fail: bool,
    }

    #[async_trait]
    impl Publisher for Recorder {
        async fn publish(&mut self, payload: &Payload) -> Result<(), PublishError> {
            self.bodies.lock().unwrap().push(payload.to_bytes());
            if self.fail {
                Err(PublishError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    const SETTINGS: WorkerSettings = WorkerSettings {
        interval: Duration::from_millis(10),
        stats_push_interval: Duration::from_millis(50),
    };

    fn worker(
        id: usize,
        publisher: Box<dyn Publisher>,
        stats_tx: mpsc::Sender<WorkerStats>,
    ) -> Worker {
        let encoder = Encoder::for_format(Format::Carbon);
        let templates = Templates::new("dc=east,worker=WORKERNUM", "tsgen.", "-WORKERNUM", "box", 9)
            .unwrap();
        let specs = parse_profile(
            "counterInt={name: fixed, value: 10, increment: 0},counterInt={name: step, value: 1}",
        )
        .unwrap();
        let shared = encoder.format_tags(&templates.shared_tags);
        let generators = build_generators(&specs, &shared);

        Worker::new(
            id,
            &templates.for_worker(id),
            &generators,
            encoder,
            publisher,
            SETTINGS,
            stats_tx,
        )
    }

    #[tokio::test]
    async fn test_tick_publishes_templated_batch() {
        let (tx, _rx) = mpsc::channel(4);
        let recorder = Recorder::default();
        let mut w = worker(2, Box::new(recorder.clone()), tx);
        assert_eq!(w.full_name(), "worker-9-2");

        assert!(w.tick().await);
        assert!(w.tick().await);

        let bodies = recorder.bodies.lock().unwrap();
        let first = std::str::from_utf8(&bodies[0]).unwrap();
        let lines: Vec<&str> = first.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("tsgen.fixed-2;dc=east;worker=2 10 "));
        assert!(lines[1].starts_with("tsgen.step-2;dc=east;worker=2 1 "));

        let second = std::str::from_utf8(&bodies[1]).unwrap();
        assert!(second.contains("tsgen.step-2;dc=east;worker=2 2 "));
        assert_eq!(w.success_count, 4);
    }

    #[test]
    fn test_expanded_tags_reach_the_encoder() {
        let encoder = Encoder::for_format(Format::Carbon);
        let templates = Templates::new(
            "thread=WORKERFULLNAME,series=METRICNAME",
            "tsgen.",
            "-WORKERNUM",
            "box",
            77,
        )
        .unwrap();
        let specs = parse_profile("counterInt={name: hits}").unwrap();
        let generators = build_generators(&specs, &encoder.format_tags(&templates.shared_tags));
        let (tx, _rx) = mpsc::channel(1);

        let mut w = Worker::new(
            3,
            &templates.for_worker(3),
            &generators,
            encoder,
            Box::new(NullPublisher),
            SETTINGS,
            tx,
        );

        let sample = w.generators[0].generate_sample();
        assert_eq!(sample.name, "tsgen.hits-3");
        assert_eq!(sample.tags, ";thread=worker-77-3;series=tsgen.hits-3");
    }

    #[tokio::test]
    async fn test_failures_are_counted() {
        let (tx, _rx) = mpsc::channel(4);
        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };
        let mut w = worker(0, Box::new(recorder), tx);

        assert!(!w.tick().await);
        assert_eq!(w.failure_count, 2);
        assert_eq!(w.success_count, 0);
    }

    #[tokio::test]
    async fn test_flush_waits_for_window() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut w = worker(1, Box::new(NullPublisher), tx);
        w.tick().await;

        let start = w.window_start;
        assert_eq!(w.flush_stats(start + Duration::from_millis(10)), EmitOutcome::NotDue);

        let now = start + Duration::from_millis(60);
        assert_eq!(w.flush_stats(now), EmitOutcome::Sent);
        let stats = rx.recv().await.unwrap();
        assert_eq!(stats.worker_id, 1);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.elapsed, Duration::from_millis(60));

        // window restarted
        assert_eq!(w.success_count, 0);
        assert_eq!(w.flush_stats(now), EmitOutcome::NotDue);
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.try_send(WorkerStats {
            worker_id: 99,
            success_count: 0,
            failure_count: 0,
            elapsed: Duration::ZERO,
        })
        .unwrap();

        let mut w = worker(0, Box::new(NullPublisher), tx);
        w.tick().await;
        let later = w.window_start + Duration::from_secs(1);
        assert_eq!(w.flush_stats(later), EmitOutcome::Dropped);

        // the worker keeps going with a fresh window
        assert!(w.tick().await);
        assert_eq!(w.success_count, 2);
        assert_eq!(rx.recv().await.unwrap().worker_id, 99);
    }

    #[tokio::test]
    async fn test_closed_channel_is_reported() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut w = worker(0, Box::new(NullPublisher), tx);
        let later = w.window_start + Duration::from_secs(1);
        assert_eq!(w.flush_stats(later), EmitOutcome::Closed);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (tx, mut rx) = mpsc::channel(64);
        let w = worker(0, Box::new(NullPublisher), tx);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(w.run(cancel.clone()));

        let stats = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(stats.success_count > 0);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
