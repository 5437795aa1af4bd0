//! Per-chain health prober.
//!
//! # Responsibilities
//! - Run an immediate pass, then one pass per interval
//! - Probe every enabled endpoint of the chain concurrently
//! - Feed each endpoint's pass result into its state machine exactly once
//! - Hand one record per probed endpoint to the health sink
//!
//! # Cancellation
//! `ProberHandle::stop` triggers the prober's own shutdown signal and joins
//! the task. Attempts and backoff waits race the signal, so a pass in
//! flight ends promptly. An endpoint whose probe was cancelled keeps its
//! previous state and produces no record.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::chain::{ChainState, Endpoint};
use crate::config::HealthCheckConfig;
use crate::health::probe::{probe_block_number, ProbeFailure, ProbeSuccess};
use crate::health::state::Transition;
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::observability::metrics;
use crate::persistence::{HealthRecord, HealthSink};
use crate::resilience::retries::{retry_with_backoff, RetryOutcome, RetryPolicy};

/// Counts from one completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub probed: usize,
    pub healthy: usize,
    pub cancelled: usize,
}

/// Probes one chain's endpoints.
pub struct ChainProber {
    chain: Arc<ChainState>,
    config: HealthCheckConfig,
    client: reqwest::Client,
    sink: Arc<dyn HealthSink>,
}

impl ChainProber {
    pub fn new(
        chain: Arc<ChainState>,
        config: HealthCheckConfig,
        client: reqwest::Client,
        sink: Arc<dyn HealthSink>,
    ) -> Self {
        Self {
            chain,
            config,
            client,
            sink,
        }
    }

    /// Start the probe loop on the runtime.
    pub fn spawn(self) -> ProberHandle {
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let chain = self.chain.name().to_string();
        let handle = tokio::spawn(self.run(signal));

        ProberHandle {
            chain,
            shutdown,
            handle,
        }
    }

    async fn run(self, mut signal: ShutdownSignal) {
        let interval = self.config.interval().max(Duration::from_millis(1));
        tracing::info!(
            chain = %self.chain.name(),
            endpoints = self.chain.endpoints().len(),
            interval_ms = interval.as_millis() as u64,
            "Chain prober starting"
        );

        // First tick completes immediately.
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = signal.recv() => break,
                _ = ticker.tick() => {}
            }
            self.run_pass(&signal).await;
        }

        tracing::info!(chain = %self.chain.name(), "Chain prober stopped");
    }

    /// Probe every enabled endpoint once, concurrently.
    pub async fn run_pass(&self, signal: &ShutdownSignal) -> PassSummary {
        let pass_id = Uuid::new_v4();
        let started = Instant::now();

        let probes = self
            .chain
            .endpoints()
            .iter()
            .filter(|e| e.enabled())
            .map(|e| self.probe_endpoint(e, signal.clone(), pass_id));
        let results = join_all(probes).await;

        let mut summary = PassSummary::default();
        for result in results {
            match result {
                Some(record) => {
                    summary.probed += 1;
                    if record.success {
                        summary.healthy += 1;
                    }
                    self.sink.record(record);
                }
                None => summary.cancelled += 1,
            }
        }

        tracing::debug!(
            chain = %self.chain.name(),
            %pass_id,
            probed = summary.probed,
            healthy = summary.healthy,
            cancelled = summary.cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Probe pass complete"
        );
        summary
    }

    async fn probe_endpoint(
        &self,
        endpoint: &Arc<Endpoint>,
        mut signal: ShutdownSignal,
        pass_id: Uuid,
    ) -> Option<HealthRecord> {
        let policy = RetryPolicy::new(self.config.retries, self.config.retry_backoff());
        let timeout = self.config.timeout();
        let client = &self.client;
        let chain = self.chain.name();
        let started = Instant::now();

        let outcome = retry_with_backoff(policy, &mut signal, |attempt| async move {
            let result = probe_block_number(client, endpoint.url(), timeout).await;
            if let Err(failure) = &result {
                tracing::debug!(
                    chain = %chain,
                    endpoint = %endpoint.name(),
                    %pass_id,
                    attempt,
                    error = %failure.error,
                    "Probe attempt failed"
                );
            }
            result
        })
        .await;

        let now = SystemTime::now();
        let record = match outcome {
            RetryOutcome::Success {
                value: ProbeSuccess {
                    block_number,
                    response_time_ms,
                },
                attempts,
            } => {
                let transition = endpoint.record_success(response_time_ms, block_number);
                self.log_transition(endpoint, transition, None);
                tracing::trace!(
                    chain = %chain,
                    endpoint = %endpoint.name(),
                    %pass_id,
                    attempts,
                    block_number,
                    response_time_ms,
                    "Probe succeeded"
                );
                HealthRecord::success(
                    endpoint.id(),
                    endpoint.name(),
                    chain,
                    response_time_ms,
                    block_number,
                    now,
                )
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error:
                    ProbeFailure {
                        error,
                        response_time_ms,
                    },
            } => {
                let transition =
                    endpoint.record_failure(response_time_ms, self.config.unhealthy_threshold);
                self.log_transition(endpoint, transition, Some(&error.to_string()));
                tracing::debug!(
                    chain = %chain,
                    endpoint = %endpoint.name(),
                    %pass_id,
                    attempts,
                    consecutive_failures = endpoint.runtime().consecutive_failures,
                    error = %error,
                    "Probe pass failed"
                );
                HealthRecord::failure(
                    endpoint.id(),
                    endpoint.name(),
                    chain,
                    response_time_ms,
                    error,
                    now,
                )
            }
            RetryOutcome::Cancelled => return None,
        };

        metrics::record_probe(chain, endpoint.name(), record.success, started.elapsed());
        metrics::record_endpoint_health(chain, endpoint.name(), endpoint.is_healthy());
        Some(record)
    }

    fn log_transition(&self, endpoint: &Endpoint, transition: Transition, error: Option<&str>) {
        match transition {
            Transition::Unchanged => {}
            Transition::Recovered => tracing::info!(
                chain = %self.chain.name(),
                endpoint = %endpoint.name(),
                url = %endpoint.url(),
                "Endpoint is healthy"
            ),
            Transition::MarkedUnhealthy => tracing::warn!(
                chain = %self.chain.name(),
                endpoint = %endpoint.name(),
                url = %endpoint.url(),
                threshold = self.config.unhealthy_threshold,
                error = error.unwrap_or_default(),
                "Endpoint marked unhealthy"
            ),
        }
    }
}

/// Owner's handle to a running prober.
#[derive(Debug)]
pub struct ProberHandle {
    chain: String,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl ProberHandle {
    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the prober and wait for its task to exit.
    pub async fn stop(self) {
        self.shutdown.trigger();
        if let Err(e) = self.handle.await {
            tracing::error!(chain = %self.chain, error = %e, "Chain prober task failed");
        }
    }
}
