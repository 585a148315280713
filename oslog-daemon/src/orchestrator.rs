//! Daemon orchestration -- assembly, supervisor lifecycle, and shutdown.
//!
//! The [`Orchestrator`] is the central coordinator of `oslog-daemon`.
//! It validates configuration, resolves the ingester identity, opens the
//! sink, runs the stream supervisor, and tears everything down in order.
//!
//! # Startup Order
//!
//! 1. Validate config and convert the `[stream]` section
//! 2. Resolve the ingester UUID
//! 3. Install the metrics recorder (if enabled)
//! 4. Open the sink with all tag names registered
//! 5. Spawn the supervisor with a cancellation token
//!
//! # Shutdown Order
//!
//! 1. Cancel the token (no further batch submissions)
//! 2. Wait for the supervisor up to `shutdown_timeout_secs`, abort otherwise
//! 3. Sync the sink under `sync_timeout_secs`
//! 4. Close the sink

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use oslog_core::config::OslogConfig;
use oslog_core::sink::Sink;
use oslog_stream::{
    CommandProducer, JsonLinesSink, Producer, StreamConfig, StreamSupervisor, SupervisorReport,
    TagSet,
};

use crate::{ingester, metrics_server};

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: OslogConfig,
    /// Runtime view of the `[stream]` section.
    stream_config: StreamConfig,
    /// Output sink shared with the supervisor.
    sink: Arc<JsonLinesSink>,
    /// Stable identity of this ingester.
    ingester_id: Uuid,
    /// Cancels batch submission on shutdown.
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read, parsed,
    /// or validated, or if any startup step fails.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = OslogConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    pub async fn build_from_config(config: OslogConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let stream_config = StreamConfig::from_core(&config.stream)
            .map_err(|e| anyhow::anyhow!("invalid stream config: {}", e))?;

        let ingester_id = ingester::resolve_ingester_id(&config.general)?;
        tracing::info!(ingester_uuid = %ingester_id, "ingester identity resolved");

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
        }

        let tags = TagSet::new(
            std::iter::once(stream_config.tag_name.clone()).chain(config.sink.tags.iter().cloned()),
        )
        .map_err(|e| anyhow::anyhow!("invalid sink tags: {}", e))?;

        let sink = JsonLinesSink::open(&config.sink.output, tags)
            .await
            .map_err(|e| anyhow::anyhow!("failed to open sink '{}': {}", config.sink.output, e))?;

        tracing::info!(
            output = %config.sink.output,
            tag = %stream_config.tag_name,
            command = %stream_config.command,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            stream_config,
            sink: Arc::new(sink),
            ingester_id,
            cancel: CancellationToken::new(),
        })
    }

    /// Run the supervisor until SIGTERM or SIGINT.
    ///
    /// Returns the supervisor's counters, or `None` if it had to be aborted.
    pub async fn run(&mut self) -> Result<Option<SupervisorReport>> {
        let producer = CommandProducer::from_config(&self.stream_config);
        self.run_until(producer, wait_for_shutdown_signal()).await
    }

    /// Run the supervisor with the given producer until `shutdown` resolves.
    pub async fn run_until<P, F>(
        &mut self,
        producer: P,
        shutdown: F,
    ) -> Result<Option<SupervisorReport>>
    where
        P: Producer + 'static,
        F: Future<Output = Result<&'static str>>,
    {
        let supervisor = StreamSupervisor::builder(producer, Arc::clone(&self.sink))
            .config(self.stream_config.clone())
            .cancel_token(self.cancel.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build stream supervisor: {}", e))?;
        let mut handle = tokio::spawn(supervisor.run());

        tracing::info!(ingester_uuid = %self.ingester_id, "oslog-daemon running");

        let mut signal_error = None;
        tokio::select! {
            signal = shutdown => match signal {
                Ok(name) => tracing::info!(signal = name, "shutdown signal received"),
                Err(e) => {
                    tracing::error!(error = %e, "failed to wait for shutdown signal");
                    signal_error = Some(e);
                }
            },
            joined = &mut handle => {
                self.close_sink().await;
                return match joined {
                    Ok(report) => {
                        tracing::error!("stream supervisor exited before shutdown was requested");
                        Ok(Some(report))
                    }
                    Err(e) => Err(anyhow::anyhow!("stream supervisor task failed: {}", e)),
                };
            }
        }

        self.cancel.cancel();

        let timeout = Duration::from_secs(self.config.general.shutdown_timeout_secs);
        let report = match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(report)) => {
                tracing::info!(
                    launches = report.launches,
                    restarts = report.restarts,
                    records_delivered = report.records_delivered,
                    "stream supervisor stopped"
                );
                Some(report)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "stream supervisor task failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "stream supervisor did not stop in time, aborting"
                );
                handle.abort();
                None
            }
        };

        self.close_sink().await;
        match signal_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Sync and close the sink; failures are logged, not returned.
    async fn close_sink(&self) {
        let sync_timeout = Duration::from_secs(self.config.sink.sync_timeout_secs);
        if let Err(e) = self.sink.sync(sync_timeout).await {
            tracing::warn!(error = %e, "failed to sync sink");
        }
        if let Err(e) = self.sink.close().await {
            tracing::warn!(error = %e, "failed to close sink");
        }
        tracing::info!(sink = %self.sink.name(), "sink closed");
    }

    /// Stable identity of this ingester.
    pub fn ingester_id(&self) -> Uuid {
        self.ingester_id
    }

    /// Token that stops the supervisor when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &OslogConfig {
        &self.config
    }

    /// Runtime stream configuration.
    pub fn stream_config(&self) -> &StreamConfig {
        &self.stream_config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
