use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use murmur_core::extract::QueryParams;
use murmur_core::{OverallStatus, ServiceRegistry, ServiceStatus, status::overall_of};
use serde::{Deserialize, Serialize};

use crate::probe::Prober;

/// State for the `/services` endpoint
#[derive(Clone)]
pub struct HealthState {
    pub registry: Arc<ServiceRegistry>,
    pub prober: Prober,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    status: OverallStatus,
    services: BTreeMap<String, ServiceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ServicesQuery {
    /// Probe the provider before answering
    #[serde(default)]
    probe: bool,
}

/// Process liveness; never depends on upstream state
pub async fn health_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Upstream reachability as last observed
pub async fn services_handler(
    State(state): State<HealthState>,
    QueryParams(query): QueryParams<ServicesQuery>,
) -> Json<ServicesResponse> {
    if query.probe {
        state.prober.probe().await;
    }

    // Aggregate from the same snapshot that is returned
    let services = state.registry.snapshot();
    let status = overall_of(services.values());

    Json(ServicesResponse { status, services })
}
