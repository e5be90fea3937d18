//! Service readiness reporting for the exchange API.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use greencart_core::catalog::ProductQuery;

use crate::api::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub store: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state).await;
    let store = store_check(&state).await;
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "greencart-server runtime initialized".to_string(),
        },
        catalog,
        store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

/// Probe the catalog with a throwaway product name. Even an unmatched
/// name must come back with the generic alternatives, so an empty answer
/// means the catalog is misconfigured.
async fn catalog_check(state: &AppState) -> HealthCheck {
    let probe = match ProductQuery::parse("readiness probe") {
        Ok(probe) => probe,
        Err(error) => {
            return HealthCheck {
                status: "degraded",
                detail: format!("catalog probe rejected: {error}"),
            }
        }
    };

    match state.catalog.find_alternatives(&probe).await {
        Ok(alternatives) if !alternatives.is_empty() => HealthCheck {
            status: "ready",
            detail: format!("catalog probe returned {} alternatives", alternatives.len()),
        },
        Ok(_) => HealthCheck {
            status: "degraded",
            detail: "catalog probe returned no alternatives".to_string(),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("catalog probe failed: {error}") }
        }
    }
}

async fn store_check(state: &AppState) -> HealthCheck {
    let retained = state.store.sent_count().await;
    let capacity = state.store.capacity();
    HealthCheck {
        status: "ready",
        detail: format!("{retained} of {capacity} send-log entries in use"),
    }
}
