//! Component orchestration -- assembly, channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `minewatch-daemon`.
//! It validates configuration, builds the log pipeline and the event
//! dispatcher, wires them together with a bounded channel, and runs the
//! main loop until a shutdown signal arrives or the tailer worker dies.
//!
//! A fatal tailer error is not retried in-process: the orchestrator shuts
//! down and [`Orchestrator::run`] returns an error so the supervisor
//! (systemd, Docker) restarts the daemon.
//!
//! # Startup Order (consumer before producer)
//!
//! 1. Event dispatcher (consumes PlayerEvents)
//! 2. Log pipeline (produces PlayerEvents)
//!
//! # Shutdown Order (producer first)
//!
//! 1. Log pipeline (stop tailing, join the worker thread)
//! 2. Event dispatcher (drain queued PlayerEvents, then exit)

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use minewatch_core::config::MinewatchConfig;
use minewatch_core::event::PlayerEvent;
use minewatch_core::pipeline::{HealthStatus, Pipeline};
use minewatch_log_pipeline::{EventDispatcher, LogPipeline, LogPipelineBuilder, PipelineConfig};

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};
use crate::metrics_server;
use crate::sinks::{JournalStatStore, TracingNotifier};

/// Interval between health log lines in the main loop.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Interval between checks for an exited tailer worker.
const WORKER_WATCH_INTERVAL: Duration = Duration::from_millis(500);

pub type Dispatcher = EventDispatcher<JournalStatStore, TracingNotifier>;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: MinewatchConfig,
    /// Log pipeline (absent when `log_pipeline.enabled = false`).
    pipeline: Option<LogPipeline>,
    /// Receiving half of the event channel, handed to the dispatcher on run.
    event_rx: Option<mpsc::Receiver<PlayerEvent>>,
    /// Shared dispatcher (journal store + notifier).
    dispatcher: Arc<Dispatcher>,
    /// Running dispatcher task and its stop token.
    dispatcher_task: Option<(CancellationToken, JoinHandle<u64>)>,
    /// Shutdown broadcast sender (signals background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or
    /// any enabled component fails to build.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = MinewatchConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    pub async fn build_from_config(config: MinewatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            let addr = metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::debug!(%addr, "metrics recorder installed");
        }

        let (shutdown_tx, _) = broadcast::channel(16);

        let (pipeline, event_rx) = if config.log_pipeline.enabled {
            tracing::info!("initializing log pipeline");
            let pipeline_config = PipelineConfig::from_core(&config.log_pipeline);
            let (pipeline, rx) = LogPipelineBuilder::new()
                .config(pipeline_config)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build log pipeline: {}", e))?;
            (Some(pipeline), rx)
        } else {
            tracing::warn!("log pipeline disabled; no events will be produced");
            (None, None)
        };

        let store = JournalStatStore::open(&config.storage.journal_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to open statistics journal: {}", e))?;
        let dispatcher = EventDispatcher::new(store, TracingNotifier::new(), &config.notify.channel)
            .with_notifications(config.notify.enabled);

        tracing::info!(
            log_pipeline = pipeline.is_some(),
            notify = config.notify.enabled,
            journal = %config.storage.journal_path,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            pipeline,
            event_rx,
            dispatcher: Arc::new(dispatcher),
            dispatcher_task: None,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Start all components and block until `SIGTERM` or `SIGINT`.
    pub async fn run(&mut self) -> Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

        self.run_until(async move {
            tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            }
        })
        .await
    }

    /// Start all components and block until `shutdown` resolves.
    ///
    /// The future's output names the trigger in the shutdown log line.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = &'static str>,
    {
        self.start().await?;

        let mut uptime_updater_task = if self.config.metrics.enabled {
            Some(spawn_uptime_updater(
                self.start_time,
                self.shutdown_tx.subscribe(),
            ))
        } else {
            None
        };

        tracing::info!("entering main event loop");
        tokio::pin!(shutdown);
        let mut health_tick = tokio::time::interval(HEALTH_LOG_INTERVAL);
        health_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        health_tick.tick().await;
        let mut worker_watch = tokio::time::interval(WORKER_WATCH_INTERVAL);
        worker_watch.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let outcome = loop {
            tokio::select! {
                signal = &mut shutdown => {
                    tracing::info!(signal = signal, "shutdown signal received");
                    break Ok(());
                }
                _ = worker_watch.tick() => {
                    if self.pipeline.as_ref().is_some_and(LogPipeline::worker_exited) {
                        tracing::error!("log pipeline worker exited, shutting down for restart");
                        break Err(anyhow::anyhow!("log pipeline worker exited unexpectedly"));
                    }
                }
                _ = health_tick.tick() => {
                    let health = self.health().await;
                    if health.status.is_healthy() {
                        tracing::debug!(uptime_secs = health.uptime_secs, "daemon healthy");
                    } else {
                        tracing::warn!(
                            status = %health.status,
                            uptime_secs = health.uptime_secs,
                            "daemon health check"
                        );
                    }
                }
            }
        };

        let _ = self.shutdown_tx.send(());
        if let Some(task) = uptime_updater_task.take() {
            let _ = task.await;
        }

        let stopped = self.shutdown().await;
        outcome.and(stopped)
    }

    /// Spawn the dispatcher, then start the pipeline.
    async fn start(&mut self) -> Result<()> {
        if let Some(rx) = self.event_rx.take() {
            let cancel = CancellationToken::new();
            let dispatcher = Arc::clone(&self.dispatcher);
            let token = cancel.clone();
            let handle = tokio::spawn(async move { dispatcher.run(rx, token).await });
            self.dispatcher_task = Some((cancel, handle));
            tracing::info!("event dispatcher started");
        }

        if let Some(pipeline) = self.pipeline.as_mut() {
            if let Err(e) = pipeline.start().await {
                tracing::error!(error = %e, "log pipeline failed to start");
                self.stop_dispatcher().await;
                return Err(e.into());
            }
        }

        Ok(())
    }

    /// Stop the pipeline first so its worker can flush into the channel,
    /// then drain the dispatcher.
    async fn shutdown(&mut self) -> Result<()> {
        let mut result = Ok(());
        if let Some(pipeline) = self.pipeline.as_mut() {
            tracing::info!("stopping log pipeline");
            if let Err(e) = pipeline.stop().await {
                tracing::error!(error = %e, "failed to stop log pipeline");
                result = Err(e.into());
            }
        }

        self.stop_dispatcher().await;
        tracing::info!("minewatch-daemon shut down");
        result
    }

    async fn stop_dispatcher(&mut self) {
        if let Some((cancel, handle)) = self.dispatcher_task.take() {
            cancel.cancel();
            match handle.await {
                Ok(delivered) => tracing::info!(delivered, "event dispatcher stopped"),
                Err(e) => tracing::error!(error = %e, "event dispatcher task failed"),
            }
        }
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let mut modules = Vec::with_capacity(2);

        let pipeline_status = match &self.pipeline {
            Some(pipeline) => pipeline.health_check().await,
            None => HealthStatus::Unhealthy("disabled".to_owned()),
        };
        modules.push(ModuleHealth::new(
            "log-pipeline",
            self.config.log_pipeline.enabled,
            pipeline_status,
        ));

        let dispatcher_status = match &self.dispatcher_task {
            Some((_, handle)) if handle.is_finished() => {
                HealthStatus::Unhealthy("dispatcher task exited".to_owned())
            }
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("not running".to_owned()),
        };
        modules.push(ModuleHealth::new(
            "dispatcher",
            self.config.log_pipeline.enabled,
            dispatcher_status,
        ));

        let status = aggregate_status(&modules);
        let uptime_secs = self.start_time.elapsed().as_secs();

        if self.config.metrics.enabled {
            use minewatch_core::metrics as m;
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
        }

        DaemonHealth {
            status,
            uptime_secs,
            modules,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &MinewatchConfig {
        &self.config
    }

    /// Get the shared event dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Spawn a background task that periodically updates the uptime metric.
///
/// Updates every 10 seconds to keep the metric fresh for Prometheus scrapes.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    use minewatch_core::metrics as m;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let uptime_secs = start_time.elapsed().as_secs();
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
