use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use super::extract::AuthenticatedUser;
use super::service::{LoginRequest, TokenResponse};
use crate::error::AppError;
use crate::state::AppContext;
use crate::users::{UserRegistration, UserView};

pub fn auth_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(me_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/refresh-token", post(refresh_handler))
        .with_state(ctx)
}

async fn register_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(registration): Json<UserRegistration>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let user = ctx.auth.register(registration).await?;
    Ok((StatusCode::CREATED, Json(user.view())))
}

async fn login_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(ctx.auth.login(request).await?))
}

async fn me_handler(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserView> {
    Json(user.view())
}

async fn logout_handler(AuthenticatedUser(user): AuthenticatedUser) -> Json<Value> {
    info!(user_id = user.id, "user logged out");
    Json(json!({ "message": "Successfully logged out" }))
}

async fn refresh_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Json<TokenResponse> {
    Json(ctx.auth.refresh(&user))
}
