use crate::cli::ServeArgs;
use crate::demo::seed_demo_brand;
use crate::infra::{AppState, InMemoryNotificationSink, InMemoryWalletRepository};
use crate::routes::with_wallet_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use brand_wallet::config::AppConfig;
use brand_wallet::error::AppError;
use brand_wallet::telemetry;
use brand_wallet::workflows::wallet::unlocks::CardUnlockService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryWalletRepository::default());
    if args.seed_demo {
        let (user_id, brand_id) = seed_demo_brand(&repository)?;
        info!(user_id = %user_id.0, brand_id = %brand_id.0, "demo wallet seeded");
    }
    let notifications = Arc::new(InMemoryNotificationSink::default());
    let wallet_service = Arc::new(CardUnlockService::new(
        repository,
        notifications,
        config.wallet.clone(),
    ));

    let app = with_wallet_routes(wallet_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, wallet_url = %config.wallet.action_url_base, "brand wallet service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
