//! Provider passthroughs used by the dashboard UI: voice previews and call recordings.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::provider::VoicePreview;
use crate::state::AppContext;
use crate::validation::validate_phone;

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceTestRequest {
    pub voice: String,
    pub user_phone_number: String,
}

impl VoiceTestRequest {
    pub fn into_preview(self) -> Result<VoicePreview, AppError> {
        let voice = self.voice.trim();
        if voice.is_empty() {
            return Err(AppError::Validation("Voice is required".to_string()));
        }
        let phone_number = self.user_phone_number.trim();
        validate_phone(phone_number).map_err(AppError::Validation)?;
        Ok(VoicePreview::new(phone_number, voice))
    }
}

pub fn feature_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/features/test-voice", post(test_voice_handler))
        .route(
            "/api/features/calls/:call_id/recording",
            get(recording_handler),
        )
        .with_state(ctx)
}

async fn test_voice_handler(
    State(ctx): State<Arc<AppContext>>,
    caller: AuthenticatedUser,
    Json(request): Json<VoiceTestRequest>,
) -> Result<Json<Value>, AppError> {
    let preview = request.into_preview()?;
    info!(user_id = caller.0.id, voice = %preview.voice, "voice preview requested");
    Ok(Json(ctx.provider.speak(&preview).await?))
}

async fn recording_handler(
    State(ctx): State<Arc<AppContext>>,
    _caller: AuthenticatedUser,
    Path(call_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(ctx.provider.recording(&call_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_requires_voice_and_valid_phone() {
        let ok = VoiceTestRequest {
            voice: " maya ".to_string(),
            user_phone_number: "+14155550100".to_string(),
        }
        .into_preview()
        .expect("valid preview");
        assert_eq!(ok.voice, "maya");
        assert_eq!(ok.phone_number, "+14155550100");

        let blank = VoiceTestRequest {
            voice: "".to_string(),
            user_phone_number: "+14155550100".to_string(),
        };
        assert!(matches!(blank.into_preview(), Err(AppError::Validation(_))));

        let bad_phone = VoiceTestRequest {
            voice: "maya".to_string(),
            user_phone_number: "0123".to_string(),
        };
        assert!(bad_phone.into_preview().is_err());
    }
}
