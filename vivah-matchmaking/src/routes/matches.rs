use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use vivah_shared::errors::AppResult;
use vivah_shared::types::auth::AuthUser;
use vivah_shared::types::{ApiResponse, PageParams, PageWindow, Paginated};

use crate::matching::history::{DEFAULT_HISTORY_LIMIT, DEFAULT_MUTUAL_LIMIT};
use crate::matching::recommendations::DEFAULT_RECOMMENDATION_LIMIT;
use crate::matching::ActionOutcome;
use crate::models::{MatchHistoryItem, MatchStatus, MutualMatchData, RecommendedProfile};
use crate::AppState;

// --- Request / response types ---

#[derive(Debug, Deserialize, Validate)]
pub struct MatchActionRequest {
    #[validate(range(min = 1, message = "profile_id must be a positive integer"))]
    pub profile_id: i64,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct RecordActionResponse {
    pub is_mutual_match: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// --- GET /recommendations ---

pub async fn get_recommendations(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ApiResponse<Paginated<RecommendedProfile>>>> {
    let window = params.window(DEFAULT_RECOMMENDATION_LIMIT);
    let page = state.service.get_recommended_matches(user.id, window).await?;
    Ok(Json(ApiResponse::ok(page)))
}

// --- POST /actions ---

pub async fn record_action(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<MatchActionRequest>,
) -> AppResult<Json<ApiResponse<RecordActionResponse>>> {
    req.validate()?;

    let is_mutual_match = state
        .service
        .record_action(user.id, req.profile_id, &req.action)
        .await?;

    Ok(Json(ApiResponse::ok(RecordActionResponse { is_mutual_match })))
}

// --- PUT /actions ---

pub async fn update_action(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<MatchActionRequest>,
) -> AppResult<Json<ApiResponse<ActionOutcome>>> {
    req.validate()?;

    let outcome = state
        .service
        .update_action(user.id, req.profile_id, &req.action)
        .await?;

    Ok(Json(ApiResponse::ok(outcome)))
}

// --- GET /history ---

pub async fn get_history(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> AppResult<Json<ApiResponse<Paginated<MatchHistoryItem>>>> {
    let status = match q.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(s.parse::<MatchStatus>()?),
    };
    let window = PageWindow::new(q.limit, q.offset, DEFAULT_HISTORY_LIMIT);

    let page = state.service.get_match_history(user.id, status, window).await?;
    Ok(Json(ApiResponse::ok(page)))
}

// --- GET /mutual ---

pub async fn get_mutual(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ApiResponse<Paginated<MutualMatchData>>>> {
    let window = params.window(DEFAULT_MUTUAL_LIMIT);
    let page = state.service.get_mutual_matches(user.id, window).await?;
    Ok(Json(ApiResponse::ok(page)))
}
