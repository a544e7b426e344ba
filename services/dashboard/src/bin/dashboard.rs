//! services/dashboard/src/bin/dashboard.rs

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use dairy_track_core::{MilkingSessionBook, NotificationStore, RefreshOutcome, SessionContext};
use dashboard_lib::{
    adapters::{
        load_current_user, HttpExportAdapter, HttpHerdAdapter, HttpMilkingSessionAdapter,
        HttpNotificationAdapter, RemoteClient,
    },
    config::{Config, ConfigError},
    error::ApiError,
    web::{api_router, middleware::REQUEST_ID_HEADER, ApiDoc, AppState},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(api = %config.api_base_url, offset = %config.utc_offset, "Configuration loaded. Starting dashboard...");

    // --- 2. Resolve the Current User ---
    let user = load_current_user(&config.current_user_path).await;
    let context = Arc::new(SessionContext::new(user));

    // --- 3. Initialize Service Adapters ---
    let remote = Arc::new(RemoteClient::new(
        &config.api_base_url,
        config.request_timeout,
        config.utc_offset,
    )?);
    let notification_adapter = Arc::new(HttpNotificationAdapter::new(remote.clone(), context.user_id()));
    let milking_adapter = Arc::new(HttpMilkingSessionAdapter::new(remote.clone()));
    let herd_adapter = Arc::new(HttpHerdAdapter::new(remote.clone()));
    let export_adapter = Arc::new(HttpExportAdapter::new(remote));

    // --- 4. Build the Stores and Load Initial Data ---
    let notifications = NotificationStore::new(notification_adapter);
    let milking = Arc::new(MilkingSessionBook::new(context.clone(), milking_adapter, herd_adapter));

    if let RefreshOutcome::Fetched(Err(e)) = notifications.initial_load(context.user_id()).await {
        warn!("Initial notification fetch failed: {}", e);
    }
    if let Err(e) = milking.load_managed_cows().await {
        warn!("Could not load managed cows: {}", e);
    }
    if let Err(e) = milking.load().await {
        warn!("Initial milking session load failed: {}", e);
    }

    let app_state = Arc::new(AppState::new(
        config.clone(),
        context,
        notifications,
        milking,
        export_adapter,
    ));

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .expose_headers([axum::http::HeaderName::from_static(REQUEST_ID_HEADER)]);

    let app = Router::new()
        .merge(api_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    let shutdown = CancellationToken::new();
    tokio::spawn(watch_for_ctrl_c(shutdown.clone()));

    info!("Starting server on {}", config.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Dashboard stopped");
    Ok(())
}

async fn watch_for_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for the shutdown signal: {}", e),
    }
    shutdown.cancel();
}
