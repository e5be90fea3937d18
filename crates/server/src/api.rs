//! JSON API serving the message composer and the sending extension.
//!
//! Current surface:
//! - staging and polling of the next outgoing message payload
//! - send logging with a bounded, queryable history
//! - sustainable alternatives, personalized when a profile is supplied
//! - mock affordability lookups by name/date of birth or account email
//! - readiness reporting for probes

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use greencart_core::catalog::{AlternativesCatalog, ProductQuery};
use greencart_core::credit::ProfileProvider;
use greencart_core::errors::DomainError;
use greencart_core::personalize::{AlternativeRecord, PersonalizationEngine, UserProfile};

use crate::health;
use crate::store::{ExchangeStore, MessagePayload, SentMessage};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ExchangeStore>,
    pub catalog: Arc<dyn AlternativesCatalog>,
    pub credit: Arc<dyn ProfileProvider>,
    pub engine: PersonalizationEngine,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Body of `POST /api/log-sent`. Every field is optional; the extension
/// omits what it could not scrape from the conversation view.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendLogRequest {
    pub conversation_id: Option<String>,
    pub listing: Option<serde_json::Value>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Body of `POST /api/find-sustainable-products`. Advisory fields the
/// composer also sends (`currentPrice`, `category`) are accepted and
/// ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindAlternativesRequest {
    pub product_name: String,
    pub user_profile: Option<UserProfile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LookupUserRequest {
    pub name: String,
    pub dob: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LookupEmailRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct Acknowledged {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct AlternativesResponse {
    pub success: bool,
    pub alternatives: Vec<AlternativeRecord>,
    pub personalized: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user_profile: UserProfile,
    pub data_source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub success: bool,
    pub error: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/store-message", post(store_message))
        .route("/api/latest-message", get(latest_message))
        .route("/api/log-sent", post(log_sent))
        .route("/api/logs", get(recent_logs))
        .route("/api/find-sustainable-products", post(find_sustainable_products))
        .route("/api/lookup-user", post(lookup_user))
        .route("/api/lookup-user-by-email", post(lookup_user_by_email))
        .route("/health", get(health::health))
        .fallback(fallback_not_found)
        .layer(cors_layer())
        .with_state(state)
}

/// The composer page and the extension content scripts call in from
/// arbitrary origins, so the API answers any of them.
fn cors_layer() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

// ---------------------------------------------------------------------------
// Exchange handlers
// ---------------------------------------------------------------------------

pub async fn store_message(
    State(state): State<AppState>,
    body: Option<Json<MessagePayload>>,
) -> Json<Acknowledged> {
    let payload = body.map(|Json(payload)| payload).unwrap_or_default();

    info!(
        event_name = "exchange.message.staged",
        search_keyword = %payload.search_keyword,
        has_message = !payload.message.is_empty(),
        "staged outgoing message payload"
    );
    state.store.replace(payload).await;

    Json(Acknowledged { success: true })
}

pub async fn latest_message(State(state): State<AppState>) -> Json<MessagePayload> {
    Json(state.store.latest().await)
}

pub async fn log_sent(
    State(state): State<AppState>,
    body: Option<Json<SendLogRequest>>,
) -> Json<Acknowledged> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let entry = SentMessage {
        conversation_id: request.conversation_id,
        listing: request.listing,
        message: request.message,
        timestamp: Utc::now().timestamp(),
    };

    info!(
        event_name = "exchange.send.logged",
        conversation_id = entry.conversation_id.as_deref().unwrap_or("unknown"),
        "recorded a sent message"
    );
    state.store.record_sent(entry).await;

    Json(Acknowledged { success: true })
}

pub async fn recent_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<Vec<SentMessage>> {
    Json(state.store.recent(query.limit).await)
}

// ---------------------------------------------------------------------------
// Personalization handlers
// ---------------------------------------------------------------------------

pub async fn find_sustainable_products(
    State(state): State<AppState>,
    body: Option<Json<FindAlternativesRequest>>,
) -> Result<Json<AlternativesResponse>, (StatusCode, Json<ApiFailure>)> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let query = match ProductQuery::parse(&request.product_name) {
        Ok(query) => query,
        Err(_) => return Err(failure(StatusCode::BAD_REQUEST, "productName required")),
    };

    let candidates = state.catalog.find_alternatives(&query).await.map_err(upstream_error)?;
    let personalized = request.user_profile.is_some();
    let alternatives = state.engine.rank(candidates, request.user_profile.as_ref());

    info!(
        event_name = "personalize.alternatives.served",
        product_name = %query.as_str(),
        personalized,
        served = alternatives.len(),
        "served sustainable alternatives"
    );

    Ok(Json(AlternativesResponse { success: true, alternatives, personalized }))
}

pub async fn lookup_user(
    State(state): State<AppState>,
    body: Option<Json<LookupUserRequest>>,
) -> Result<Json<ProfileResponse>, (StatusCode, Json<ApiFailure>)> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let name = request.name.trim();
    let dob = request.dob.trim();

    if name.is_empty() || dob.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "name and dob required"));
    }

    // Identities stay out of the logs; the correlation id stands in.
    let correlation_id = format!("LKP-{}", &uuid_v4()[..12]);
    let lookup = state.credit.lookup_by_name_dob(name, dob).await.map_err(upstream_error)?;

    let Some(lookup) = lookup else {
        warn!(
            event_name = "credit.lookup.miss",
            correlation_id = %correlation_id,
            "no credit record for identity"
        );
        return Err(failure(StatusCode::NOT_FOUND, "User not found in credit records"));
    };

    info!(
        event_name = "credit.lookup.resolved",
        correlation_id = %correlation_id,
        data_source = lookup.data_source,
        score_tier = lookup.profile.score_tier.as_str(),
        "resolved affordability profile"
    );

    Ok(Json(ProfileResponse {
        success: true,
        user_profile: lookup.profile,
        data_source: lookup.data_source,
    }))
}

pub async fn lookup_user_by_email(
    State(state): State<AppState>,
    body: Option<Json<LookupEmailRequest>>,
) -> Result<Json<ProfileResponse>, (StatusCode, Json<ApiFailure>)> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let email = request.email.trim();

    if email.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "email required"));
    }

    let correlation_id = format!("LKP-{}", &uuid_v4()[..12]);
    let lookup = state.credit.lookup_by_email(email).await.map_err(upstream_error)?;

    let Some(lookup) = lookup else {
        warn!(
            event_name = "credit.lookup.miss",
            correlation_id = %correlation_id,
            "no credit record for email"
        );
        return Err(failure(StatusCode::NOT_FOUND, "User not found"));
    };

    info!(
        event_name = "credit.lookup.resolved",
        correlation_id = %correlation_id,
        data_source = lookup.data_source,
        score_tier = lookup.profile.score_tier.as_str(),
        "resolved affordability profile"
    );

    Ok(Json(ProfileResponse {
        success: true,
        user_profile: lookup.profile,
        data_source: lookup.data_source,
    }))
}

async fn fallback_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "Not found" })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<ApiFailure>) {
    (status, Json(ApiFailure { success: false, error: message.to_string() }))
}

fn upstream_error(error: DomainError) -> (StatusCode, Json<ApiFailure>) {
    error!(event_name = "api.upstream_failure", error = %error, "collaborator call failed");
    let body = ApiFailure { success: false, error: error.to_string() };
    (StatusCode::SERVICE_UNAVAILABLE, Json(body))
}

fn uuid_v4() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use greencart_core::catalog::{CatalogResult, StaticCatalog};
    use greencart_core::credit::{CreditResult, MockCreditBureau, ProfileLookup};
    use greencart_core::personalize::{ScoreTier, FALLBACK_NOTE, TOP_PICK_BADGE};
    use tower::ServiceExt;

    use super::*;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(ExchangeStore::new(100)),
            catalog: Arc::new(StaticCatalog::new()),
            credit: Arc::new(MockCreditBureau::new()),
            engine: PersonalizationEngine::new(),
        }
    }

    fn state() -> State<AppState> {
        State(test_state())
    }

    struct MissingProfileProvider;

    #[async_trait]
    impl ProfileProvider for MissingProfileProvider {
        async fn lookup_by_name_dob(
            &self,
            _name: &str,
            _dob: &str,
        ) -> CreditResult<Option<ProfileLookup>> {
            Ok(None)
        }

        async fn lookup_by_email(&self, _email: &str) -> CreditResult<Option<ProfileLookup>> {
            Ok(None)
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl AlternativesCatalog for FailingCatalog {
        async fn find_alternatives(
            &self,
            _query: &ProductQuery,
        ) -> CatalogResult<Vec<AlternativeRecord>> {
            Err(DomainError::CatalogUnavailable("catalog offline".to_string()))
        }
    }

    #[tokio::test]
    async fn store_then_fetch_round_trips_the_payload() {
        let State(app_state) = state();

        let payload = MessagePayload {
            message: "Hello, is this still available?".to_string(),
            search_keyword: "bike".to_string(),
            max_price: Some(200.0),
            min_price: None,
        };
        let ack =
            store_message(State(app_state.clone()), Some(Json(payload.clone()))).await;
        assert!(ack.0.success);

        let latest = latest_message(State(app_state)).await;
        assert_eq!(latest.0, payload);
    }

    #[tokio::test]
    async fn store_message_without_body_resets_the_slot() {
        let State(app_state) = state();

        store_message(
            State(app_state.clone()),
            Some(Json(MessagePayload {
                message: "old".to_string(),
                ..MessagePayload::default()
            })),
        )
        .await;
        store_message(State(app_state.clone()), None).await;

        let latest = latest_message(State(app_state)).await;
        assert_eq!(latest.0, MessagePayload::default());
    }

    #[tokio::test]
    async fn log_sent_records_entry_with_timestamp_and_logs_respect_limit() {
        let State(app_state) = state();

        for index in 0..3 {
            log_sent(
                State(app_state.clone()),
                Some(Json(SendLogRequest {
                    conversation_id: Some(format!("conv-{index}")),
                    listing: Some(serde_json::json!({ "title": "Desk", "price": "$40" })),
                    message: Some("sent".to_string()),
                })),
            )
            .await;
        }

        let all = recent_logs(State(app_state.clone()), Query(LogsQuery::default())).await;
        assert_eq!(all.0.len(), 3);
        assert!(all.0[0].timestamp > 0);

        let limited =
            recent_logs(State(app_state), Query(LogsQuery { limit: Some(1) })).await;
        assert_eq!(limited.0.len(), 1);
        assert_eq!(limited.0[0].conversation_id.as_deref(), Some("conv-2"));
    }

    #[tokio::test]
    async fn find_products_requires_a_product_name() {
        let result = find_sustainable_products(state(), None).await;

        let (status, Json(body)) = result.expect_err("empty request should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.error, "productName required");
    }

    #[tokio::test]
    async fn find_products_without_profile_is_not_personalized() {
        let result = find_sustainable_products(
            state(),
            Some(Json(FindAlternativesRequest {
                product_name: "office chair".to_string(),
                user_profile: None,
            })),
        )
        .await
        .expect("should succeed");

        assert!(result.0.success);
        assert!(!result.0.personalized);
        assert_eq!(result.0.alternatives[0].name, "Upcycled Office Chair");
        assert!(result.0.alternatives.iter().all(|alt| alt.badge.is_none()));
    }

    #[tokio::test]
    async fn find_products_personalizes_and_badges_for_a_profile() {
        let profile = UserProfile::new(ScoreTier::Good).with_price_range(50.0, 2000.0);

        let result = find_sustainable_products(
            state(),
            Some(Json(FindAlternativesRequest {
                product_name: "office chair".to_string(),
                user_profile: Some(profile),
            })),
        )
        .await
        .expect("should succeed");

        assert!(result.0.personalized);
        assert_eq!(result.0.alternatives[0].name, "Upcycled Office Chair");
        assert_eq!(result.0.alternatives[0].badge.as_deref(), Some(TOP_PICK_BADGE));
    }

    #[tokio::test]
    async fn find_products_notes_fallback_when_nothing_matches_the_range() {
        let profile =
            UserProfile::new(ScoreTier::Excellent).with_price_range(10_000.0, 20_000.0);

        let result = find_sustainable_products(
            state(),
            Some(Json(FindAlternativesRequest {
                product_name: "mystery gadget".to_string(),
                user_profile: Some(profile),
            })),
        )
        .await
        .expect("should succeed");

        assert_eq!(result.0.alternatives.len(), 2);
        assert!(result
            .0
            .alternatives
            .iter()
            .all(|alt| alt.note.as_deref() == Some(FALLBACK_NOTE)));
    }

    #[tokio::test]
    async fn find_products_maps_catalog_failure_to_service_unavailable() {
        let mut app_state = test_state();
        app_state.catalog = Arc::new(FailingCatalog);

        let result = find_sustainable_products(
            State(app_state),
            Some(Json(FindAlternativesRequest {
                product_name: "office chair".to_string(),
                user_profile: None,
            })),
        )
        .await;

        let (status, Json(body)) = result.expect_err("catalog failure should surface");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.success);
    }

    #[tokio::test]
    async fn lookup_user_requires_name_and_dob() {
        let result = lookup_user(
            state(),
            Some(Json(LookupUserRequest { name: "Jane Doe".to_string(), dob: "  ".to_string() })),
        )
        .await;

        let (status, Json(body)) = result.expect_err("missing dob should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "name and dob required");
    }

    #[tokio::test]
    async fn lookup_user_returns_a_sanitized_deterministic_profile() {
        let request = LookupUserRequest {
            name: "Jane Doe".to_string(),
            dob: "01/15/1990".to_string(),
        };

        let first = lookup_user(state(), Some(Json(request)))
            .await
            .expect("lookup should succeed");

        assert!(first.0.success);
        assert_eq!(first.0.data_source, "mock");
        assert!(first.0.user_profile.price_range.is_some());
        assert!(first.0.user_profile.location.is_some());

        let second = lookup_user(
            state(),
            Some(Json(LookupUserRequest {
                name: "Jane Doe".to_string(),
                dob: "01/15/1990".to_string(),
            })),
        )
        .await
        .expect("repeat lookup should succeed");
        assert_eq!(first.0.user_profile, second.0.user_profile);
    }

    #[tokio::test]
    async fn lookup_user_misses_map_to_not_found() {
        let mut app_state = test_state();
        app_state.credit = Arc::new(MissingProfileProvider);

        let result = lookup_user(
            State(app_state),
            Some(Json(LookupUserRequest {
                name: "Jane Doe".to_string(),
                dob: "01/15/1990".to_string(),
            })),
        )
        .await;

        let (status, Json(body)) = result.expect_err("miss should surface");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "User not found in credit records");
    }

    #[tokio::test]
    async fn lookup_by_email_requires_email_and_reports_misses() {
        let empty = lookup_user_by_email(state(), None).await;
        let (status, Json(body)) = empty.expect_err("missing email should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "email required");

        let mut app_state = test_state();
        app_state.credit = Arc::new(MissingProfileProvider);
        let miss = lookup_user_by_email(
            State(app_state),
            Some(Json(LookupEmailRequest { email: "jane@example.com".to_string() })),
        )
        .await;
        let (status, Json(body)) = miss.expect_err("miss should surface");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "User not found");
    }

    #[tokio::test]
    async fn lookup_by_email_resolves_against_the_mock() {
        let result = lookup_user_by_email(
            state(),
            Some(Json(LookupEmailRequest { email: "jane@example.com".to_string() })),
        )
        .await
        .expect("lookup should succeed");

        assert!(result.0.success);
        assert_eq!(result.0.data_source, "mock");
        assert!(result.0.user_profile.availability.is_some());
    }

    // -----------------------------------------------------------------------
    // Full-router behavior
    // -----------------------------------------------------------------------

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("parse body")
    }

    #[tokio::test]
    async fn unknown_routes_fall_back_to_a_json_not_found() {
        let response = router(test_state())
            .oneshot(Request::builder().uri("/api/unknown").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, serde_json::json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn responses_allow_any_origin() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/latest-message")
                    .header(header::ORIGIN, "chrome-extension://composer")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let allow_origin = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .expect("cors header present");
        assert_eq!(allow_origin, "*");
    }

    #[tokio::test]
    async fn store_message_accepts_an_empty_body() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/store-message")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "success": true }));
    }

    #[tokio::test]
    async fn health_route_is_wired_into_the_router() {
        let response = router(test_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ready");
    }
}
