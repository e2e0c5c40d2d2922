//! Shared state handed to every router.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::auth::password::MIN_COST;
use crate::auth::{AuthService, TokenSigner};
use crate::calls::CallLog;
use crate::campaigns::CampaignService;
use crate::config::{AppConfig, AuthConfig, PaginationConfig};
use crate::contacts::ContactService;
use crate::dashboard::DashboardService;
use crate::db;
use crate::dispatch::Dispatcher;
use crate::embedding::{self, TranscriptEmbedder};
use crate::error::AppError;
use crate::followup::FollowUpScheduler;
use crate::provider::{BlandClient, CallProvider};
use crate::users::UserService;
use crate::webhook::WebhookProcessor;

/// The subset of configuration the request handlers read.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub webhook_url: String,
    pub pagination: PaginationConfig,
    pub auth: AuthConfig,
    pub follow_up_delay: Duration,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            webhook_url: config.provider.webhook_url.clone(),
            pagination: config.pagination,
            auth: config.auth.clone(),
            follow_up_delay: config.follow_up.default_delay,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:3000/webhook".to_string(),
            pagination: PaginationConfig::default(),
            auth: AuthConfig {
                token_secret: "campaign-dialer-test-secret".to_string(),
                token_ttl_minutes: 30,
                password_cost: MIN_COST,
            },
            follow_up_delay: Duration::from_secs(3600),
        }
    }
}

pub struct AppContext {
    pub settings: ServiceSettings,
    pub pool: SqlitePool,
    pub provider: Arc<dyn CallProvider>,
    pub users: UserService,
    pub auth: AuthService,
    pub contacts: ContactService,
    pub campaigns: CampaignService,
    pub calls: CallLog,
    pub dispatcher: Dispatcher,
    pub follow_ups: FollowUpScheduler,
    pub webhook: WebhookProcessor,
    pub dashboard: DashboardService,
}

impl AppContext {
    /// Wires every service over one pool and one provider.
    pub fn new(
        pool: SqlitePool,
        provider: Arc<dyn CallProvider>,
        embedder: Arc<dyn TranscriptEmbedder>,
        settings: ServiceSettings,
    ) -> Self {
        let users = UserService::new(pool.clone(), settings.auth.password_cost);
        let auth = AuthService::new(users.clone(), TokenSigner::from_config(&settings.auth));
        let contacts = ContactService::new(pool.clone());
        let calls = CallLog::new(pool.clone());
        let dispatcher = Dispatcher::new(
            pool.clone(),
            provider.clone(),
            settings.webhook_url.clone(),
        );
        let follow_ups = FollowUpScheduler::new(provider.clone(), settings.webhook_url.clone());
        let webhook = WebhookProcessor::new(
            calls.clone(),
            provider.clone(),
            embedder,
            follow_ups.clone(),
            settings.follow_up_delay,
        );
        let campaigns = CampaignService::new(
            pool.clone(),
            contacts.clone(),
            calls.clone(),
            dispatcher.clone(),
        );
        let dashboard = DashboardService::new(calls.clone(), campaigns.clone(), contacts.clone());

        Self {
            settings,
            pool,
            provider,
            users,
            auth,
            contacts,
            campaigns,
            calls,
            dispatcher,
            follow_ups,
            webhook,
            dashboard,
        }
    }

    /// Opens the database and builds the real provider and embedder clients.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let pool = db::connect(&config.database).await?;
        let provider: Arc<dyn CallProvider> = Arc::new(BlandClient::new(&config.provider)?);
        let embedder = embedding::from_config(&config.embedding)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        Ok(Self::new(
            pool,
            provider,
            embedder,
            ServiceSettings::from_config(config),
        ))
    }
}
