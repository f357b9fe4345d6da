mod campaigns;
mod influencers;
mod scrape;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use reachdb_scrape::{ScrapeError, ScrapeRunner};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub runner: Arc<ScrapeRunner>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "invalid_state" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &reachdb_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_scrape_error(request_id: String, error: &ScrapeError) -> ApiError {
    match error {
        ScrapeError::NotFound => ApiError::new(request_id, "not_found", "scrape run not found"),
        ScrapeError::InvalidState { status } => ApiError::new(
            request_id,
            "invalid_state",
            format!("scrape run is not complete (status: {status})"),
        ),
        ScrapeError::InvalidTarget(url) => ApiError::new(
            request_id,
            "validation_error",
            format!("'{url}' is not a valid Instagram profile URL"),
        ),
        ScrapeError::Provider(message) => {
            tracing::error!(error = %message, "scrape provider request failed");
            ApiError::new(
                request_id,
                "provider_unavailable",
                "scrape provider request failed",
            )
        }
        ScrapeError::Db(e) => map_db_error(request_id, e),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/scrape/profile", post(scrape::submit_profile_scrape))
        .route("/api/v1/scrape/runs", get(scrape::list_runs))
        .route(
            "/api/v1/scrape/runs/{run_id}/status",
            get(scrape::get_run_status),
        )
        .route(
            "/api/v1/scrape/runs/{run_id}/results",
            get(scrape::get_run_results),
        )
        .route(
            "/api/v1/influencers",
            get(influencers::list_influencers).post(influencers::create_influencer),
        )
        .route(
            "/api/v1/influencers/from-scraped-data",
            post(influencers::create_from_scraped_data),
        )
        .route(
            "/api/v1/influencers/{id}",
            get(influencers::get_influencer)
                .put(influencers::update_influencer)
                .delete(influencers::delete_influencer),
        )
        .route(
            "/api/v1/campaigns",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route(
            "/api/v1/campaigns/{id}",
            get(campaigns::get_campaign)
                .put(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route(
            "/api/v1/campaigns/{id}/influencers",
            post(campaigns::assign_influencer),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match reachdb_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use reachdb_core::{AppConfig, Environment};
    use reachdb_scrape::{ApifyProvider, DryRunDelays};
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://unused".to_owned(),
            env: Environment::Test,
            bind_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: "debug".to_owned(),
            apify_token: None,
            // Unroutable on purpose: route tests must never hit a provider.
            apify_base_url: "http://127.0.0.1:9".to_owned(),
            apify_timeout_secs: 1,
            apify_max_retries: 0,
            apify_retry_backoff_base_ms: 1,
            profile_actor_id: "apify~instagram-profile-scraper".to_owned(),
            email_actor_id: "vdrmota~contact-info-scraper".to_owned(),
            scrape_results_limit: 1,
            dry_run_to_running_ms: 30,
            dry_run_to_succeeded_ms: 30,
            db_max_connections: 5,
            db_min_connections: 1,
            db_acquire_timeout_secs: 5,
        }
    }

    fn test_app(pool: sqlx::PgPool) -> Router {
        let config = test_config();
        let client = reachdb_apify::ApifyClient::with_base_url(
            "test-token",
            config.apify_timeout_secs,
            &config.apify_base_url,
        )
        .expect("client");
        let runner = ScrapeRunner::new(
            pool.clone(),
            Arc::new(ApifyProvider::new(client)),
            &config,
        );
        let auth = crate::middleware::AuthState::from_env(true).expect("auth");
        build_app(
            AppState {
                pool,
                runner: Arc::new(runner),
            },
            auth,
            default_rate_limit_state(),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_invalid_state_maps_to_bad_request() {
        let response = ApiError::new("req-1", "invalid_state", "not done yet").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_conflict_maps_to_409() {
        let response = ApiError::new("req-1", "conflict", "duplicate").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn provider_errors_hide_detail_from_clients() {
        let err = map_scrape_error(
            "req-1".to_owned(),
            &ScrapeError::Provider("token leaked-secret rejected".to_owned()),
        );
        assert_eq!(err.error.code, "provider_unavailable");
        assert!(!err.error.message.contains("leaked-secret"));
    }

    // ------------------------------------------------------------------
    // Scrape routes
    // ------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn dry_run_flow_over_http(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/scrape/profile",
                serde_json::json!({
                    "instagram_url": "https://www.instagram.com/glowwithmaya/",
                    "dry_run": true
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let run_id = json["data"]["run_id"].as_str().expect("run_id").to_owned();
        assert!(run_id.starts_with("dry-run-"), "got: {run_id}");

        // Results are rejected until the simulation finishes.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/scrape/runs/{run_id}/results"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Poll status until SUCCEEDED.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(format!("/api/v1/scrape/runs/{run_id}/status"))
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            if json["data"]["status"] == "SUCCEEDED" {
                assert_eq!(json["data"]["results_count"], 1);
                assert_eq!(json["data"]["is_dry_run"], true);
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "dry run never completed"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/scrape/runs/{run_id}/results"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["success"], true);
        assert_eq!(
            json["data"]["profile_data"]["username"].as_str(),
            Some("dry_run_profile")
        );
        assert_eq!(json["data"]["emails"].as_array().map(Vec::len), Some(2));

        // The run shows up in the run listing.
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/scrape/runs")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn scrape_submit_rejects_invalid_url(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(post_json(
                "/api/v1/scrape/profile",
                serde_json::json!({ "instagram_url": "https://example.com/nope" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn unknown_dry_run_status_is_404(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/scrape/runs/dry-run-42/status")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ------------------------------------------------------------------
    // Influencer routes
    // ------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn influencer_crud_round_trip(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/influencers",
                serde_json::json!({
                    "name": "Maya Ortiz",
                    "email": "maya@glow.example",
                    "instagram_handle": "glowwithmaya",
                    "followers_count": 120_000
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let id = json["data"]["id"].as_str().expect("public id").to_owned();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/influencers/{id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["name"], "Maya Ortiz");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/v1/influencers/{id}"))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "notes": "priority contact" }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["notes"], "priority contact");
        assert_eq!(json["data"]["name"], "Maya Ortiz", "sparse update");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/v1/influencers/{id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/influencers/{id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn duplicate_influencer_email_is_conflict(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let body = serde_json::json!({ "name": "Maya", "email": "maya@glow.example" });

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/influencers", body.clone()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(post_json("/api/v1/influencers", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_from_scraped_data_conflicts_on_known_email(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let scraped = serde_json::json!({
            "scraped_data": {
                "username": "glowwithmaya",
                "full_name": "Maya Ortiz",
                "biography": "Skincare and light",
                "followers_count": 120_000,
                "profile_pic_url": null,
                "url": "https://www.instagram.com/glowwithmaya/",
                "emails": ["maya@glow.example"]
            }
        });

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/influencers/from-scraped-data",
                scraped.clone(),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["instagram_handle"], "glowwithmaya");
        assert_eq!(json["data"]["email"], "maya@glow.example");

        let response = app
            .oneshot(post_json("/api/v1/influencers/from-scraped-data", scraped))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    // ------------------------------------------------------------------
    // Campaign routes
    // ------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn campaign_create_assign_and_duplicate_assign(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/campaigns",
                serde_json::json!({ "name": "Spring Launch", "budget": "2500.00" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "draft");
        let campaign_id = json["data"]["id"].as_str().expect("id").to_owned();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/influencers",
                serde_json::json!({ "name": "Maya", "email": "maya@glow.example" }),
            ))
            .await
            .expect("response");
        let json = body_json(response).await;
        let influencer_id = json["data"]["id"].as_str().expect("id").to_owned();

        let assign = serde_json::json!({ "influencer_id": influencer_id });
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/campaigns/{campaign_id}/influencers"),
                assign.clone(),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(post_json(
                &format!("/api/v1/campaigns/{campaign_id}/influencers"),
                assign,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn unknown_campaign_is_404(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/campaigns/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
