//! Reachability probes against the provider's model listing

use std::sync::Arc;
use std::time::Duration;

use murmur_core::{ServiceRegistry, Upstream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Probes `GET {base}/models` and records the result for every service
/// backed by that provider
#[derive(Debug, Clone)]
pub struct Prober {
    upstream: Upstream,
    services: Arc<[&'static str]>,
    timeout: Duration,
}

impl Prober {
    pub fn new(upstream: Upstream, services: &[&'static str], timeout: Duration) -> Self {
        Self {
            upstream,
            services: services.into(),
            timeout,
        }
    }

    fn registry(&self) -> &ServiceRegistry {
        self.upstream.registry()
    }

    /// Run one probe; a single attempt, no retries
    pub async fn probe(&self) {
        let outcome = self.upstream.send(self.upstream.get("models"), self.timeout).await;

        match &outcome {
            Ok(_) => tracing::debug!("upstream probe succeeded"),
            Err(error) => tracing::warn!(error = %error, "upstream probe failed"),
        }

        for service in self.services.iter() {
            self.registry().record(service, &outcome);
        }
    }

    /// Probe on a fixed interval until `shutdown` is cancelled
    pub fn spawn(self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tracing::info!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "starting background upstream probes"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => self.probe().await,
                }
            }

            tracing::debug!("background upstream probes stopped");
        })
    }
}
