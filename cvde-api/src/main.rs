use std::net::SocketAddr;
use std::sync::Arc;

use cvde_api::{
    app,
    state::{AppState, AuthConfig},
};
use cvde_store::catalog_repo::StoreCatalogRepository;
use cvde_store::faq_repo::StoreFaqRepository;
use cvde_store::order_repo::StoreOrderRepository;
use cvde_store::profile_repo::StoreProfileRepository;
use cvde_store::settings_repo::StoreSettingsRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cvde_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cvde_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting CVDE portal API on port {}", config.server.port);

    // Database connection; a failed migration aborts startup.
    let db = cvde_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run database migrations");

    // Order change feed, fed by the Postgres listener
    let (order_feed, _) = tokio::sync::broadcast::channel(100);
    tokio::spawn(cvde_store::listener::forward_order_changes(
        db.pool.clone(),
        order_feed.clone(),
    ));

    let app_state = AppState {
        catalog: Arc::new(StoreCatalogRepository::new(db.pool.clone())),
        orders: Arc::new(StoreOrderRepository::new(db.pool.clone())),
        profiles: Arc::new(StoreProfileRepository::new(db.pool.clone())),
        settings: Arc::new(StoreSettingsRepository::new(db.pool.clone())),
        faq: Arc::new(StoreFaqRepository::new(db.pool.clone())),
        order_feed,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server port");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
