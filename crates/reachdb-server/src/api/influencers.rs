//! Influencer entity handlers, including creation from scraped profile data.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use reachdb_core::ProfileRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateInfluencerRequest {
    pub name: String,
    pub email: String,
    pub instagram_handle: Option<String>,
    pub instagram_url: Option<String>,
    pub followers_count: Option<i64>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateInfluencerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub instagram_handle: Option<String>,
    pub instagram_url: Option<String>,
    pub followers_count: Option<i64>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
}

/// Body for `POST /influencers/from-scraped-data`: the normalized scrape
/// output plus optional explicit overrides.
#[derive(Debug, Deserialize)]
pub(super) struct FromScrapedDataRequest {
    pub scraped_data: ProfileRecord,
    #[serde(default)]
    pub additional_data: AdditionalData,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AdditionalData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct InfluencersQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct InfluencerItem {
    id: Uuid,
    name: String,
    email: String,
    instagram_handle: Option<String>,
    instagram_url: Option<String>,
    followers_count: Option<i64>,
    bio: Option<String>,
    avatar_url: Option<String>,
    notes: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<reachdb_db::InfluencerRow> for InfluencerItem {
    fn from(row: reachdb_db::InfluencerRow) -> Self {
        Self {
            id: row.public_id,
            name: row.name,
            email: row.email,
            instagram_handle: row.instagram_handle,
            instagram_url: row.instagram_url,
            followers_count: row.followers_count,
            bio: row.bio,
            avatar_url: row.avatar_url,
            notes: row.notes,
            is_active: row.is_active,
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

fn validate_email(req_id: &str, email: &str) -> Result<(), ApiError> {
    if email.contains('@') && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!("'{email}' is not a valid email address"),
        ))
    }
}

fn map_email_conflict(req_id: &str, e: &reachdb_db::DbError) -> ApiError {
    if e.is_unique_violation() {
        return ApiError::new(
            req_id,
            "conflict",
            "an influencer with that email already exists",
        );
    }
    map_db_error(req_id.to_owned(), e)
}

/// POST /api/v1/influencers — create from explicit fields.
pub(super) async fn create_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateInfluencerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InfluencerItem>>), ApiError> {
    let rid = &req_id.0;
    let name = body.name.trim().to_owned();
    let email = body.email.trim().to_lowercase();
    validate_name(rid, &name)?;
    validate_email(rid, &email)?;

    let row = reachdb_db::create_influencer(
        &state.pool,
        &reachdb_db::NewInfluencer {
            name: &name,
            email: &email,
            instagram_handle: body.instagram_handle.as_deref(),
            instagram_url: body.instagram_url.as_deref(),
            followers_count: body.followers_count,
            bio: body.bio.as_deref(),
            avatar_url: body.avatar_url.as_deref(),
            notes: body.notes.as_deref(),
        },
    )
    .await
    .map_err(|e| map_email_conflict(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /api/v1/influencers/from-scraped-data — materialize a scraped
/// profile as an influencer.
///
/// The email comes from the overrides if given, otherwise from the first
/// discovered address. A duplicate email is rejected before any write.
pub(super) async fn create_from_scraped_data(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<FromScrapedDataRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InfluencerItem>>), ApiError> {
    let rid = &req_id.0;
    let scraped = &body.scraped_data;

    let email = body
        .additional_data
        .email
        .as_deref()
        .or_else(|| scraped.emails.first().map(String::as_str))
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    validate_email(rid, &email)?;

    let name = body
        .additional_data
        .name
        .clone()
        .or_else(|| scraped.full_name.clone())
        .unwrap_or_else(|| scraped.username.clone());
    let name = name.trim().to_owned();
    validate_name(rid, &name)?;

    if reachdb_db::find_influencer_by_email(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .is_some()
    {
        return Err(ApiError::new(
            rid,
            "conflict",
            "an influencer with that email already exists",
        ));
    }

    let instagram_url = scraped.url.clone().or_else(|| {
        (!scraped.username.is_empty())
            .then(|| format!("https://www.instagram.com/{}/", scraped.username))
    });

    let row = reachdb_db::create_influencer(
        &state.pool,
        &reachdb_db::NewInfluencer {
            name: &name,
            email: &email,
            instagram_handle: (!scraped.username.is_empty()).then_some(scraped.username.as_str()),
            instagram_url: instagram_url.as_deref(),
            followers_count: scraped.followers_count,
            bio: scraped.biography.as_deref(),
            avatar_url: scraped.profile_pic_url.as_deref(),
            notes: body.additional_data.notes.as_deref(),
        },
    )
    .await
    .map_err(|e| map_email_conflict(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/influencers — list active influencers.
pub(super) async fn list_influencers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<InfluencersQuery>,
) -> Result<Json<ApiResponse<Vec<InfluencerItem>>>, ApiError> {
    let rows = reachdb_db::list_influencers(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(InfluencerItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/influencers/:id
pub(super) async fn get_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InfluencerItem>>, ApiError> {
    let row = reachdb_db::get_influencer_by_public_id(&state.pool, id)
        .await
        .map_err(|e| match e {
            reachdb_db::DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", "influencer not found")
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/v1/influencers/:id — sparse update; absent fields are preserved.
pub(super) async fn update_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateInfluencerRequest>,
) -> Result<Json<ApiResponse<InfluencerItem>>, ApiError> {
    let rid = &req_id.0;
    let email = body.email.as_deref().map(|e| e.trim().to_lowercase());
    if let Some(ref e) = email {
        validate_email(rid, e)?;
    }
    if let Some(ref n) = body.name {
        validate_name(rid, n.trim())?;
    }

    let row = reachdb_db::update_influencer(
        &state.pool,
        id,
        &reachdb_db::UpdateInfluencer {
            name: body.name.as_deref().map(str::trim),
            email: email.as_deref(),
            instagram_handle: body.instagram_handle.as_deref(),
            instagram_url: body.instagram_url.as_deref(),
            followers_count: body.followers_count,
            bio: body.bio.as_deref(),
            avatar_url: body.avatar_url.as_deref(),
            notes: body.notes.as_deref(),
        },
    )
    .await
    .map_err(|e| match e {
        reachdb_db::DbError::NotFound => {
            ApiError::new(rid.clone(), "not_found", "influencer not found")
        }
        other => map_email_conflict(rid, &other),
    })?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/influencers/:id — soft delete.
pub(super) async fn delete_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    reachdb_db::delete_influencer(&state.pool, id)
        .await
        .map_err(|e| match e {
            reachdb_db::DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", "influencer not found")
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_scraped_data_request_defaults_additional_data() {
        let body: FromScrapedDataRequest = serde_json::from_value(serde_json::json!({
            "scraped_data": {
                "username": "acme",
                "full_name": "Acme Co",
                "biography": null,
                "followers_count": 10,
                "profile_pic_url": null,
                "url": null,
                "emails": ["hello@acme.test"]
            }
        }))
        .expect("deserialize");
        assert!(body.additional_data.email.is_none());
        assert_eq!(body.scraped_data.username, "acme");
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(validate_email("req-1", "maya@glow.example").is_ok());
        assert!(validate_email("req-1", "not-an-email").is_err());
        assert!(validate_email("req-1", "two words@x.test").is_err());
        assert!(validate_email("req-1", "").is_err());
    }
}
