use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use super::domain::{UserRegistration, UserStatistics, UserUpdate, UserView};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::http::{success_message, PageQuery};
use crate::state::AppContext;

pub fn user_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/users", get(list_handler).post(create_handler))
        .route(
            "/api/users/:user_id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/api/users/search/:query", get(search_handler))
        .route("/api/users/stats/summary", get(stats_handler))
        .route("/api/users/email/:email", get(by_email_handler))
        .with_state(ctx)
}

async fn list_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let page = query.strict(&ctx.settings.pagination)?;
    let users = ctx.users.list(page).await?;
    Ok(Json(users.iter().map(|user| user.view()).collect()))
}

async fn create_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Json(registration): Json<UserRegistration>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let user = ctx.users.create(registration).await?;
    Ok((StatusCode::CREATED, Json(user.view())))
}

async fn get_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(ctx.users.get(user_id).await?.view()))
}

async fn update_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(user_id): Path<i64>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(ctx.users.update(user_id, update).await?.view()))
}

async fn delete_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    ctx.users.delete(user_id).await?;
    Ok(Json(success_message("User deleted successfully")))
}

async fn search_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(query): Path<String>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = ctx.users.search(&query).await?;
    Ok(Json(users.iter().map(|user| user.view()).collect()))
}

async fn stats_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
) -> Result<Json<UserStatistics>, AppError> {
    Ok(Json(ctx.users.statistics().await?))
}

async fn by_email_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(email): Path<String>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(ctx.users.get_by_email(&email).await?.view()))
}
