use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::domain::{BatchOutcome, ContactDraft, ContactRecord, ContactUpdate, ImportSummary};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::http::{success_message, PageQuery};
use crate::state::AppContext;

pub fn contact_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/contacts", get(list_handler).post(create_handler))
        .route(
            "/api/contacts/:contact_id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/api/contacts/batch", post(batch_handler))
        .route("/api/contacts/import", post(import_handler))
        .route("/api/contacts/search/:query", get(search_handler))
        .route("/api/contacts/stats/summary", get(stats_handler))
        .with_state(ctx)
}

async fn list_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ContactRecord>>, AppError> {
    let page = query.strict(&ctx.settings.pagination)?;
    Ok(Json(ctx.contacts.list(page).await?))
}

async fn create_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Json(draft): Json<ContactDraft>,
) -> Result<(StatusCode, Json<ContactRecord>), AppError> {
    let contact = ctx.contacts.create(draft).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn get_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(contact_id): Path<i64>,
) -> Result<Json<ContactRecord>, AppError> {
    Ok(Json(ctx.contacts.get(contact_id).await?))
}

async fn update_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(contact_id): Path<i64>,
    Json(update): Json<ContactUpdate>,
) -> Result<Json<ContactRecord>, AppError> {
    Ok(Json(ctx.contacts.update(contact_id, update).await?))
}

async fn delete_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(contact_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    ctx.contacts.delete(contact_id).await?;
    Ok(Json(success_message("Contact deleted successfully")))
}

async fn batch_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Json(drafts): Json<Vec<ContactDraft>>,
) -> Result<Json<BatchOutcome>, AppError> {
    Ok(Json(ctx.contacts.batch_create(drafts).await?))
}

/// Body is the raw CSV document.
async fn import_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    body: Bytes,
) -> Result<Json<ImportSummary>, AppError> {
    Ok(Json(ctx.contacts.import_csv(&body).await?))
}

async fn search_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(query): Path<String>,
) -> Result<Json<Value>, AppError> {
    let contacts = ctx.contacts.search(&query).await?;
    Ok(Json(json!({ "success": true, "contacts": contacts })))
}

async fn stats_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let stats = ctx.contacts.statistics().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}
