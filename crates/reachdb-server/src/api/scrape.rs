//! Scrape-run handlers: submission, status polling, result retrieval, and
//! the run listing.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use reachdb_core::ScrapeResult;
use reachdb_scrape::RunStatusView;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, map_scrape_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SubmitScrapeRequest {
    pub instagram_url: String,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct SubmitScrapeResponse {
    run_id: String,
    message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunItem {
    run_id: String,
    actor_id: Option<String>,
    status: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    status_message: Option<String>,
    results_count: i32,
    is_dry_run: bool,
    target_url: Option<String>,
    created_at: DateTime<Utc>,
}

/// POST /api/v1/scrape/profile — start a scrape (or a simulated dry run).
pub(super) async fn submit_profile_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SubmitScrapeRequest>,
) -> Result<Json<ApiResponse<SubmitScrapeResponse>>, ApiError> {
    let run_id = state
        .runner
        .submit(&body.instagram_url, body.dry_run)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;

    let message = if body.dry_run {
        "Dry run started; poll the status endpoint to follow the simulated lifecycle".to_owned()
    } else {
        "Scrape run started".to_owned()
    };

    Ok(Json(ApiResponse {
        data: SubmitScrapeResponse { run_id, message },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/scrape/runs/:run_id/status — poll run status.
pub(super) async fn get_run_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(run_id): Path<String>,
) -> Result<Json<ApiResponse<RunStatusView>>, ApiError> {
    let status = state
        .runner
        .get_status(&run_id)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: status,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/scrape/runs/:run_id/results — fetch normalized results.
pub(super) async fn get_run_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(run_id): Path<String>,
) -> Result<Json<ApiResponse<ScrapeResult>>, ApiError> {
    let result = state
        .runner
        .get_results(&run_id)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/scrape/runs — most recent runs from the local log.
pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<RunItem>>>, ApiError> {
    let rows = reachdb_db::list_scrape_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| RunItem {
            run_id: row.run_id,
            actor_id: row.actor_id,
            status: row.status,
            started_at: row.started_at,
            finished_at: row.finished_at,
            status_message: row.status_message,
            results_count: row.results_count,
            is_dry_run: row.is_dry_run,
            target_url: row.target_url,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_item_is_serializable() {
        let item = RunItem {
            run_id: "dry-run-1700000000000".to_string(),
            actor_id: None,
            status: "SUCCEEDED".to_string(),
            started_at: Some(Utc::now()),
            finished_at: Some(Utc::now()),
            status_message: Some("Dry run completed".to_string()),
            results_count: 1,
            is_dry_run: true,
            target_url: Some("https://www.instagram.com/acme/".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&item).expect("serialize run item");
        assert!(json.contains("\"status\":\"SUCCEEDED\""));
        assert!(json.contains("\"results_count\":1"));
    }

    #[test]
    fn submit_request_defaults_dry_run_to_false() {
        let body: SubmitScrapeRequest = serde_json::from_str(
            r#"{ "instagram_url": "https://www.instagram.com/acme/" }"#,
        )
        .expect("deserialize");
        assert!(!body.dry_run);
    }
}
