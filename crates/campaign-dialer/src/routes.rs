use std::sync::Arc;

use axum::Router;

use crate::auth::auth_router;
use crate::calls::call_router;
use crate::campaigns::campaign_router;
use crate::contacts::contact_router;
use crate::dashboard::dashboard_router;
use crate::features::feature_router;
use crate::state::AppContext;
use crate::users::user_router;
use crate::webhook::webhook_router;

/// Every domain router merged over one shared context.
pub fn api_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .merge(auth_router(ctx.clone()))
        .merge(user_router(ctx.clone()))
        .merge(contact_router(ctx.clone()))
        .merge(campaign_router(ctx.clone()))
        .merge(call_router(ctx.clone()))
        .merge(webhook_router(ctx.clone()))
        .merge(dashboard_router(ctx.clone()))
        .merge(feature_router(ctx))
}
