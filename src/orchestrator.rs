//! Worker lifecycle: staggered start, shared stats channel, shutdown

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::encoder::Encoder;
use crate::generator::Generator;
use crate::profile::{build_generators, parse_profile};
use crate::publisher::PublisherFactory;
use crate::stats::StatsAggregator;
use crate::template::Templates;
use crate::worker::{Worker, WorkerSettings};

pub struct Orchestrator {
    config: Arc<Config>,
    templates: Templates,
    encoder: Encoder,
    generators: Vec<Generator>,
    factory: PublisherFactory,
}

impl Orchestrator {
    /// Resolve templates and build the generator families. Fails before any
    /// worker starts when the profile or the tags are invalid.
    pub fn new(config: Arc<Config>, factory: PublisherFactory) -> Result<Self> {
        let templates = Templates::from_config(&config)?;
        let encoder = Encoder::for_format(config.format);
        let specs = parse_profile(&config.profile)?;
        let shared_tags = encoder.format_tags(&templates.shared_tags);
        let generators = build_generators(&specs, &shared_tags);

        if generators.is_empty() {
            bail!("No usable generator in profile '{}'", config.profile);
        }

        for generator in &generators {
            info!("{}", generator.describe());
        }

        Ok(Self {
            config,
            templates,
            encoder,
            generators,
            factory,
        })
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// Start the workers, one per `workers_interval`, then wait for
    /// cancellation and join everything. Returns how many workers ran.
    pub async fn run(self, cancel: CancellationToken) -> Result<usize> {
        let workers = self.config.workers;
        let ratio = self.config.stats_print_to_push_ratio();
        let (stats_tx, stats_rx) = mpsc::channel(workers * (ratio + 1));

        let aggregator = StatsAggregator::new(stats_rx, workers, ratio);
        let aggregator = tokio::spawn(aggregator.run(cancel.clone()));

        let settings = WorkerSettings {
            interval: self.config.interval,
            stats_push_interval: self.config.stats_push_interval,
        };

        let mut stagger = if self.config.workers_interval.is_zero() {
            None
        } else {
            Some(tokio::time::interval(self.config.workers_interval))
        };

        let mut tasks = JoinSet::new();
        for id in 0..workers {
            if let Some(stagger) = stagger.as_mut() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = stagger.tick() => {}
                }
            }

            let publisher = self
                .factory
                .create()
                .with_context(|| format!("Failed to create publisher for worker {}", id))?;
            let worker = Worker::new(
                id,
                &self.templates.for_worker(id),
                &self.generators,
                self.encoder,
                publisher,
                settings,
                stats_tx.clone(),
            );

            info!("Launched {}", worker.full_name());
            tasks.spawn(worker.run(cancel.clone()));
            metrics::gauge!(crate::metrics::WORKERS_ACTIVE, tasks.len() as f64);
        }

        let launched = tasks.len();
        if launched == workers {
            info!("All workers launched");
        }

        // only the workers keep the channel open from here on
        drop(stats_tx);

        cancel.cancelled().await;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Worker task failed: {}", e);
            }
            metrics::gauge!(crate::metrics::WORKERS_ACTIVE, tasks.len() as f64);
        }

        if let Err(e) = aggregator.await {
            warn!("Stats aggregator failed: {}", e);
        }

        info!("Stopped {} workers", launched);
        Ok(launched)
    }
}
