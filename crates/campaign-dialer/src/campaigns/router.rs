use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::domain::{Campaign, CampaignDraft, CampaignStatus, CampaignUpdate};
use super::report::CampaignSummary;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::http::PageQuery;
use crate::state::AppContext;

// Every route names its id `campaign_id`; on `/history` it is the group id.
pub fn campaign_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/campaigns", get(list_handler).post(create_handler))
        .route("/api/campaigns/stats/summary", get(summary_handler))
        .route(
            "/api/campaigns/:campaign_id",
            get(get_handler).put(update_handler).delete(archive_handler),
        )
        .route("/api/campaigns/:campaign_id/history", get(history_handler))
        .route("/api/campaigns/:campaign_id/status", patch(status_handler))
        .route("/api/campaigns/:campaign_id/duplicate", post(duplicate_handler))
        .route("/api/campaigns/:campaign_id/analytics", get(analytics_handler))
        .route("/api/campaigns/:campaign_id/calls", get(calls_handler))
        .route("/api/campaigns/:campaign_id/start", post(start_handler))
        .route("/api/campaigns/:campaign_id/pause", post(pause_handler))
        .route("/api/campaigns/:campaign_id/resume", post(resume_handler))
        .with_state(ctx)
}

#[derive(Debug, Default, Deserialize)]
struct CampaignListQuery {
    #[serde(default)]
    skip: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    status: Option<CampaignStatus>,
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: CampaignStatus,
}

async fn list_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Query(query): Query<CampaignListQuery>,
) -> Result<Json<Vec<Campaign>>, AppError> {
    let page = PageQuery {
        skip: query.skip,
        limit: query.limit,
    }
    .strict(&ctx.settings.pagination)?;
    Ok(Json(ctx.campaigns.list(page, query.status).await?))
}

async fn create_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Json(draft): Json<CampaignDraft>,
) -> Result<(StatusCode, Json<Campaign>), AppError> {
    let campaign = ctx.campaigns.create(draft).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

async fn get_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Campaign>, AppError> {
    Ok(Json(ctx.campaigns.get(campaign_id).await?))
}

/// Appends a new version; the referenced one is left untouched.
async fn update_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
    Json(update): Json<CampaignUpdate>,
) -> Result<(StatusCode, Json<Campaign>), AppError> {
    let campaign = ctx.campaigns.create_version(campaign_id, update).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

async fn archive_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let archived = ctx.campaigns.archive(campaign_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Campaign archived successfully",
        "campaign": archived,
    })))
}

async fn history_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<Campaign>>, AppError> {
    Ok(Json(ctx.campaigns.history(group_id).await?))
}

async fn status_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Campaign>, AppError> {
    Ok(Json(
        ctx.campaigns.set_status(campaign_id, change.status).await?,
    ))
}

async fn duplicate_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Campaign>), AppError> {
    let copy = ctx.campaigns.duplicate(campaign_id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

async fn analytics_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let analytics = ctx.campaigns.analytics(campaign_id).await?;
    Ok(Json(json!({ "success": true, "analytics": analytics })))
}

async fn calls_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.strict(&ctx.settings.pagination)?;
    let calls = ctx.campaigns.calls(campaign_id, page).await?;
    Ok(Json(json!({ "success": true, "calls": calls })))
}

async fn start_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let started = ctx.campaigns.start(campaign_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Campaign started successfully",
        "campaign": started.campaign,
        "dispatch": started.dispatch,
    })))
}

async fn pause_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let paused = ctx.campaigns.pause(campaign_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Campaign paused successfully",
        "campaign": paused,
    })))
}

async fn resume_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let resumed = ctx.campaigns.resume(campaign_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Campaign resumed successfully",
        "campaign": resumed,
    })))
}

async fn summary_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
) -> Result<Json<CampaignSummary>, AppError> {
    Ok(Json(ctx.campaigns.summary().await?))
}
