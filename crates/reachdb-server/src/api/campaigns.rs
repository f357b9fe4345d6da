//! Campaign entity handlers and influencer assignment.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

const VALID_STATUSES: &[&str] = &["draft", "active", "completed", "cancelled"];

#[derive(Debug, Deserialize)]
pub(super) struct CreateCampaignRequest {
    pub name: String,
    pub brief: Option<String>,
    pub budget: Option<Decimal>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub brief: Option<String>,
    pub status: Option<String>,
    pub budget: Option<Decimal>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AssignInfluencerRequest {
    pub influencer_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub(super) struct CampaignsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CampaignItem {
    id: Uuid,
    name: String,
    brief: Option<String>,
    status: String,
    budget: Option<Decimal>,
    starts_on: Option<NaiveDate>,
    ends_on: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<reachdb_db::CampaignRow> for CampaignItem {
    fn from(row: reachdb_db::CampaignRow) -> Self {
        Self {
            id: row.public_id,
            name: row.name,
            brief: row.brief,
            status: row.status,
            budget: row.budget,
            starts_on: row.starts_on,
            ends_on: row.ends_on,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn validate_name(req_id: &str, name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be 1–200 characters",
        ));
    }
    Ok(())
}

fn validate_status(req_id: &str, status: &str) -> Result<(), ApiError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!("status must be one of {VALID_STATUSES:?}, got '{status}'"),
        ))
    }
}

fn validate_dates(
    req_id: &str,
    starts_on: Option<NaiveDate>,
    ends_on: Option<NaiveDate>,
) -> Result<(), ApiError> {
    if let (Some(start), Some(end)) = (starts_on, ends_on) {
        if end < start {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                "ends_on must not be before starts_on",
            ));
        }
    }
    Ok(())
}

fn campaign_not_found(req_id: &str, e: reachdb_db::DbError) -> ApiError {
    match e {
        reachdb_db::DbError::NotFound => {
            ApiError::new(req_id, "not_found", "campaign not found")
        }
        other => map_db_error(req_id.to_owned(), &other),
    }
}

/// POST /api/v1/campaigns — create in `draft` status.
pub(super) async fn create_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CampaignItem>>), ApiError> {
    let rid = &req_id.0;
    let name = body.name.trim().to_owned();
    validate_name(rid, &name)?;
    validate_dates(rid, body.starts_on, body.ends_on)?;

    let row = reachdb_db::create_campaign(
        &state.pool,
        &reachdb_db::NewCampaign {
            name: &name,
            brief: body.brief.as_deref(),
            budget: body.budget,
            starts_on: body.starts_on,
            ends_on: body.ends_on,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/campaigns
pub(super) async fn list_campaigns(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CampaignsQuery>,
) -> Result<Json<ApiResponse<Vec<CampaignItem>>>, ApiError> {
    let rows = reachdb_db::list_campaigns(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CampaignItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/campaigns/:id
pub(super) async fn get_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CampaignItem>>, ApiError> {
    let row = reachdb_db::get_campaign_by_public_id(&state.pool, id)
        .await
        .map_err(|e| campaign_not_found(&req_id.0, e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/v1/campaigns/:id — sparse update.
pub(super) async fn update_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCampaignRequest>,
) -> Result<Json<ApiResponse<CampaignItem>>, ApiError> {
    let rid = &req_id.0;
    if let Some(ref name) = body.name {
        validate_name(rid, name.trim())?;
    }
    if let Some(ref status) = body.status {
        validate_status(rid, status)?;
    }
    validate_dates(rid, body.starts_on, body.ends_on)?;

    let row = reachdb_db::update_campaign(
        &state.pool,
        id,
        body.name.as_deref().map(str::trim),
        body.brief.as_deref(),
        body.status.as_deref(),
        body.budget,
        body.starts_on,
        body.ends_on,
    )
    .await
    .map_err(|e| campaign_not_found(rid, e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/campaigns/:id — soft delete.
pub(super) async fn delete_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    reachdb_db::delete_campaign(&state.pool, id)
        .await
        .map_err(|e| campaign_not_found(&req_id.0, e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/campaigns/:id/influencers — invite an influencer.
pub(super) async fn assign_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<AssignInfluencerRequest>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;

    let campaign = reachdb_db::get_campaign_by_public_id(&state.pool, id)
        .await
        .map_err(|e| campaign_not_found(rid, e))?;
    let influencer =
        reachdb_db::get_influencer_by_public_id(&state.pool, body.influencer_id)
            .await
            .map_err(|e| match e {
                reachdb_db::DbError::NotFound => {
                    ApiError::new(rid.clone(), "not_found", "influencer not found")
                }
                other => map_db_error(rid.clone(), &other),
            })?;

    reachdb_db::assign_influencer(&state.pool, campaign.id, influencer.id)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::new(
                    rid.clone(),
                    "conflict",
                    "influencer is already assigned to this campaign",
                )
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    Ok(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_item_is_serializable() {
        let item = CampaignItem {
            id: Uuid::new_v4(),
            name: "Spring Launch".to_string(),
            brief: None,
            status: "draft".to_string(),
            budget: Some(Decimal::new(250_000, 2)),
            starts_on: None,
            ends_on: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&item).expect("serialize campaign");
        assert!(json.contains("\"status\":\"draft\""));
    }

    #[test]
    fn status_validation_accepts_lifecycle_values() {
        for status in ["draft", "active", "completed", "cancelled"] {
            assert!(validate_status("req-1", status).is_ok());
        }
        assert!(validate_status("req-1", "archived").is_err());
    }

    #[test]
    fn date_validation_rejects_inverted_ranges() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).expect("date");
        let end = NaiveDate::from_ymd_opt(2025, 5, 1).expect("date");
        assert!(validate_dates("req-1", Some(start), Some(end)).is_err());
        assert!(validate_dates("req-1", Some(end), Some(start)).is_ok());
        assert!(validate_dates("req-1", None, Some(end)).is_ok());
    }
}
