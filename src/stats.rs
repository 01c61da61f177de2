//! Aggregation of worker delivery statistics into periodic summaries

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::worker::WorkerStats;

/// Totals over one print window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub workers: usize,
    pub success_count: u64,
    pub failure_count: u64,
    pub duration: Duration,
}

impl Summary {
    pub fn add(&mut self, stats: &WorkerStats) {
        self.success_count += stats.success_count;
        self.failure_count += stats.failure_count;
        self.duration += stats.elapsed;
    }

    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Successful samples per second of summed worker time
    pub fn avg_successful_mps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.success_count as f64 / secs
        }
    }

    /// Percentage of samples successfully sent
    pub fn success_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.success_count as f64 / total as f64 * 100.0
        }
    }

    /// `MRS: workers,mps,succ,total,ratio`
    pub fn csv_line(&self) -> String {
        format!(
            "MRS: {},{:.3},{},{},{:6.2}",
            self.workers,
            self.avg_successful_mps(),
            human_readable(self.success_count),
            human_readable(self.total()),
            self.success_ratio()
        )
    }
}

/// Round to the nearest K, M, G or T
pub fn human_readable(n: u64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "G"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];

    for (scale, unit) in UNITS {
        if n >= scale {
            return format!("{:.0}{}", (n as f64 / scale as f64).round(), unit);
        }
    }
    n.to_string()
}

pub struct StatsAggregator {
    rx: mpsc::Receiver<WorkerStats>,
    workers: usize,
    accumulation: usize,
}

impl StatsAggregator {
    /// Every summary covers `print_to_push_ratio` records per worker
    pub fn new(rx: mpsc::Receiver<WorkerStats>, workers: usize, print_to_push_ratio: usize) -> Self {
        Self {
            rx,
            workers,
            accumulation: (print_to_push_ratio * workers).max(1),
        }
    }

    pub fn accumulation(&self) -> usize {
        self.accumulation
    }

    /// Wait for a full window of records. `None` once every sender is gone.
    pub async fn next_summary(&mut self) -> Option<Summary> {
        let mut summary = Summary {
            workers: self.workers,
            ..Default::default()
        };

        for received in 0..self.accumulation {
            let stats = self.rx.recv().await?;
            debug!("Received {}/{} stats records", received + 1, self.accumulation);
            summary.add(&stats);
        }

        Some(summary)
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Accumulating {} stats records before each summary",
            self.accumulation
        );

        loop {
            let summary = tokio::select! {
                _ = cancel.cancelled() => break,
                summary = self.next_summary() => summary,
            };

            let Some(summary) = summary else {
                break;
            };

            info!(
                "{} workers successfully sent an average of {:.3} metrics per second. A total of {} metrics were successfully sent out of {} generated. Success ratio is {:6.2}%",
                summary.workers,
                summary.avg_successful_mps(),
                human_readable(summary.success_count),
                human_readable(summary.total()),
                summary.success_ratio()
            );
            info!("{}", summary.csv_line());
        }

        debug!("Stats aggregator stopped");
    }
}
