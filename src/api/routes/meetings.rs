//! Meeting API endpoints.
//!
//! - `POST /meetings` create a meeting (202 while queued, 200 when done inline)
//! - `GET /meetings` list recent meetings as `{items, nextCursor}`
//! - `GET /meetings/:id` fetch one, `?auto=1` completes it inline if unresolved
//! - `POST /meetings/:id/force-summarize` recompute unconditionally

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::meeting::{Meeting, MeetingPipeline, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

const MIN_TRANSCRIPT_CHARS: usize = 10;

/// Request body for `POST /meetings`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateMeetingRequest {
    pub title: Option<String>,
    pub transcript: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQueryParams {
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetQueryParams {
    pub auto: Option<String>,
}

pub fn router(pipeline: MeetingPipeline) -> Router {
    Router::new()
        .route("/meetings", post(create_meeting).get(list_meetings))
        .route("/meetings/:id", get(get_meeting))
        .route("/meetings/:id/force-summarize", post(force_summarize))
        .with_state(pipeline)
}

async fn create_meeting(
    State(pipeline): State<MeetingPipeline>,
    payload: Result<Json<CreateMeetingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Meeting>)> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (title, transcript) = validate_create(request)?;

    let outcome = pipeline.create_meeting(&title, &transcript).await?;
    let status = if outcome.processing {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome.meeting)))
}

fn validate_create(request: CreateMeetingRequest) -> ApiResult<(String, String)> {
    let title = request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("title is required"))?;

    let transcript = request
        .transcript
        .ok_or_else(|| ApiError::bad_request("transcript is required"))?;

    if transcript.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
        return Err(ApiError::bad_request(format!(
            "transcript must be at least {} characters",
            MIN_TRANSCRIPT_CHARS
        )));
    }

    Ok((title, transcript))
}

async fn list_meetings(
    State(pipeline): State<MeetingPipeline>,
    Query(params): Query<ListQueryParams>,
) -> ApiResult<Json<Value>> {
    let limit = parse_limit(params.limit.as_deref())?;
    let meetings = pipeline.list_meetings(limit).await?;
    Ok(Json(json!({ "items": meetings, "nextCursor": null })))
}

fn parse_limit(raw: Option<&str>) -> ApiResult<usize> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_LIST_LIMIT);
    };

    match raw.parse::<usize>() {
        Ok(limit) if (1..=MAX_LIST_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(ApiError::bad_request(format!(
            "limit must be an integer between 1 and {}",
            MAX_LIST_LIMIT
        ))),
    }
}

async fn get_meeting(
    State(pipeline): State<MeetingPipeline>,
    Path(id): Path<String>,
    Query(params): Query<GetQueryParams>,
) -> ApiResult<Json<Meeting>> {
    let auto = params.auto.as_deref().is_some_and(is_truthy);

    let meeting = pipeline
        .get_meeting(&id, auto)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Meeting {} not found", id)))?;

    Ok(Json(meeting))
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

async fn force_summarize(
    State(pipeline): State<MeetingPipeline>,
    Path(id): Path<String>,
) -> ApiResult<Json<Meeting>> {
    info!("Force summarize requested via API for meeting {}", id);

    let meeting = pipeline
        .force_recompute(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Meeting {} not found", id)))?;

    Ok(Json(meeting))
}
