use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use super::domain::{CallFilter, CallRecord};
use crate::auth::AuthenticatedUser;
use crate::dispatch::{BatchCallRequest, BatchDispatch};
use crate::error::AppError;
use crate::http::PageQuery;
use crate::provider::SendCallRequest;
use crate::state::AppContext;

pub fn call_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/calls", get(list_handler))
        .route("/api/calls/send", post(send_handler))
        .route("/api/calls/:call_id", get(get_handler))
        .route("/start_campaign", post(start_batch_handler))
        .with_state(ctx)
}

#[derive(Debug, Default, Deserialize)]
struct CallListQuery {
    #[serde(default)]
    skip: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    batch_id: Option<String>,
}

async fn list_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Query(query): Query<CallListQuery>,
) -> Result<Json<Vec<CallRecord>>, AppError> {
    let page = PageQuery {
        skip: query.skip,
        limit: query.limit,
    }
    .clamped(&ctx.settings.pagination);
    let filter = CallFilter {
        completed: query.completed,
        batch_id: query.batch_id,
    };
    Ok(Json(ctx.calls.list(page, &filter).await?))
}

async fn get_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(call_id): Path<String>,
) -> Result<Json<CallRecord>, AppError> {
    Ok(Json(ctx.calls.get(&call_id).await?))
}

async fn send_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Json(request): Json<SendCallRequest>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(ctx.dispatcher.send_single(request).await?))
}

async fn start_batch_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Json(request): Json<BatchCallRequest>,
) -> Result<Json<BatchDispatch>, AppError> {
    Ok(Json(ctx.dispatcher.dispatch_batch(request).await?))
}
