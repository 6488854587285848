//! Process-wide record of upstream reachability
//!
//! Every upstream call and every health probe reports here. Entries are
//! replaced whole under the `DashMap` shard lock, so readers never see a
//! half-written status.

use std::collections::BTreeMap;

use dashmap::DashMap;
use jiff::Timestamp;
use serde::Serialize;

use crate::error::UpstreamError;

/// Last known state of one upstream service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    /// `None` until the service has been observed
    pub reachable: Option<bool>,
    pub last_checked: Option<Timestamp>,
    pub last_error: Option<String>,
}

/// Aggregate over all registered services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every service answered on its last observation
    Healthy,
    /// At least one service is unreachable
    Degraded,
    /// Nothing is unreachable but something has not been observed yet
    Unknown,
}

/// Reachability registry shared by handlers and probes
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: DashMap<String, ServiceStatus>,
}

impl ServiceRegistry {
    /// Create a registry with every named service marked unknown
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::default();
        for name in names {
            registry.register(name);
        }
        registry
    }

    /// Add a service in the unknown state; existing entries are left alone
    pub fn register(&self, name: impl Into<String>) {
        self.services.entry(name.into()).or_default();
    }

    /// Record a call that reached the provider and succeeded
    pub fn record_success(&self, name: &str) {
        self.store(
            name,
            ServiceStatus {
                reachable: Some(true),
                last_checked: Some(Timestamp::now()),
                last_error: None,
            },
        );
    }

    /// Record a failed call according to what the error says about the provider
    ///
    /// Local validation failures never reached the provider and are ignored.
    pub fn record_failure(&self, name: &str, error: &UpstreamError) {
        let Some(reachable) = error.reachability() else {
            return;
        };

        if !reachable {
            tracing::warn!(service = name, error = %error, "upstream marked unreachable");
        }

        self.store(
            name,
            ServiceStatus {
                reachable: Some(reachable),
                last_checked: Some(Timestamp::now()),
                last_error: Some(error.to_string()),
            },
        );
    }

    /// Record the outcome of an upstream call
    pub fn record<T>(&self, name: &str, outcome: &Result<T, UpstreamError>) {
        match outcome {
            Ok(_) => self.record_success(name),
            Err(error) => self.record_failure(name, error),
        }
    }

    pub fn get(&self, name: &str) -> Option<ServiceStatus> {
        self.services.get(name).map(|entry| entry.value().clone())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Copy of every entry, ordered by name
    pub fn snapshot(&self) -> BTreeMap<String, ServiceStatus> {
        self.services
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn overall(&self) -> OverallStatus {
        overall_of(self.snapshot().values())
    }

    fn store(&self, name: &str, status: ServiceStatus) {
        self.services.insert(name.to_owned(), status);
    }
}

/// Aggregate a set of statuses
pub fn overall_of<'a>(statuses: impl IntoIterator<Item = &'a ServiceStatus>) -> OverallStatus {
    let mut unobserved = false;

    for status in statuses {
        match status.reachable {
            Some(false) => return OverallStatus::Degraded,
            None => unobserved = true,
            Some(true) => {}
        }
    }

    if unobserved {
        OverallStatus::Unknown
    } else {
        OverallStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn registry() -> ServiceRegistry {
        ServiceRegistry::new(["transcription", "chat"])
    }

    #[test]
    fn starts_unknown() {
        let registry = registry();

        assert_eq!(registry.get("chat"), Some(ServiceStatus::default()));
        assert_eq!(registry.overall(), OverallStatus::Unknown);
        assert_eq!(registry.names(), vec!["chat", "transcription"]);
    }

    #[test]
    fn success_clears_previous_error() {
        let registry = registry();
        registry.record_failure("chat", &UpstreamError::Timeout(Duration::from_secs(1)));
        assert_eq!(registry.get("chat").unwrap().reachable, Some(false));

        registry.record_success("chat");
        let status = registry.get("chat").unwrap();
        assert_eq!(status.reachable, Some(true));
        assert!(status.last_error.is_none());
        assert!(status.last_checked.is_some());
    }

    #[test]
    fn rejection_means_reachable() {
        let registry = registry();
        registry.record_failure(
            "transcription",
            &UpstreamError::Rejected {
                status: 401,
                message: "invalid key".to_owned(),
            },
        );

        let status = registry.get("transcription").unwrap();
        assert_eq!(status.reachable, Some(true));
        assert!(status.last_error.unwrap().contains("invalid key"));
    }

    #[test]
    fn invalid_input_leaves_registry_untouched() {
        let registry = registry();
        registry.record_failure("chat", &UpstreamError::invalid_input("no user turn"));
        assert_eq!(registry.get("chat"), Some(ServiceStatus::default()));
    }

    #[test]
    fn aggregate_status() {
        let registry = registry();
        registry.record_success("chat");
        assert_eq!(registry.overall(), OverallStatus::Unknown);

        registry.record_success("transcription");
        assert_eq!(registry.overall(), OverallStatus::Healthy);

        registry.record_failure(
            "transcription",
            &UpstreamError::Unavailable {
                message: "connection refused".to_owned(),
                retry_after: None,
            },
        );
        assert_eq!(registry.overall(), OverallStatus::Degraded);
    }

    #[test]
    fn register_keeps_existing_state() {
        let registry = registry();
        registry.record_success("chat");
        registry.register("chat");
        assert_eq!(registry.get("chat").unwrap().reachable, Some(true));
    }

    #[test]
    fn serializes_unknown_as_null() {
        let value = serde_json::to_value(ServiceStatus::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "reachable": null, "last_checked": null, "last_error": null })
        );
        assert_eq!(serde_json::to_value(OverallStatus::Degraded).unwrap(), "degraded");
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let registry = Arc::new(ServiceRegistry::default());
        let mut tasks = Vec::new();

        for i in 0..32 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let name = format!("service-{i}");
                registry.register(name.clone());
                registry.record_success(&name);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.snapshot().len(), 32);
        assert_eq!(registry.overall(), OverallStatus::Healthy);
    }
}
