use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppContext;

const DEFAULT_ACTIVITY_LIMIT: u32 = 10;
const DEFAULT_ANALYTICS_DAYS: u32 = 30;
const MAX_ANALYTICS_DAYS: u32 = 365;

pub fn dashboard_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/dashboard/stats", get(stats_handler))
        .route("/api/dashboard/recent-activity", get(activity_handler))
        .route("/api/dashboard/analytics", get(analytics_handler))
        .route("/api/dashboard/performance", get(performance_handler))
        .with_state(ctx)
}

#[derive(Debug, Default, Deserialize)]
struct ActivityQuery {
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyticsQuery {
    #[serde(default)]
    days: Option<u32>,
}

async fn stats_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let stats = ctx.dashboard.stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

async fn activity_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Value>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    let max = ctx.settings.pagination.max_page_size;
    if limit == 0 || limit > max {
        return Err(AppError::Validation(format!(
            "Limit must be between 1 and {max}"
        )));
    }
    let activity = ctx.dashboard.recent_activity(limit as usize).await?;
    Ok(Json(json!({ "success": true, "activity": activity })))
}

async fn analytics_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_ANALYTICS_DAYS);
    if days == 0 || days > MAX_ANALYTICS_DAYS {
        return Err(AppError::Validation(format!(
            "Days must be between 1 and {MAX_ANALYTICS_DAYS}"
        )));
    }
    let analytics = ctx.dashboard.analytics(days).await?;
    Ok(Json(json!({ "success": true, "analytics": analytics })))
}

async fn performance_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let performance = ctx.dashboard.performance().await?;
    Ok(Json(json!({ "success": true, "performance": performance })))
}
