use crate::cli::ServeArgs;
use crate::infra::{cors_layer, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campaign_dialer::config::AppConfig;
use campaign_dialer::error::AppError;
use campaign_dialer::{api_router, telemetry, AppContext};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;
    if config.provider.webhook_is_local() {
        warn!(
            webhook_url = %config.provider.webhook_url,
            "webhook URL points at localhost; the provider cannot reach it"
        );
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ctx = Arc::new(AppContext::from_config(&config).await?);
    info!(
        provider_configured = ctx.provider.is_configured(),
        webhook_url = %ctx.settings.webhook_url,
        "services wired"
    );

    let app = with_operational_routes(api_router(ctx))
        .layer(Extension(app_state))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "campaign dialer ready");

    axum::serve(listener, app).await?;
    Ok(())
}
