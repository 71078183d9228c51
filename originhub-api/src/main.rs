mod api;
mod config;

use config::ServerConfig;
use originhub_app::AppContext;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let config = ServerConfig::from_env();

    let app_context =
        match AppContext::connect(&config.database_url, config.db_max_connections).await {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!("Failed to initialize database: {}", e);
                std::process::exit(1);
            }
        };

    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN is not set, user sync and recount routes are disabled");
    }

    let app = api::router(app_context, config.admin_token.clone())
        .layer(TraceLayer::new_for_http())
        .layer(config.cors_layer())
        .layer(CompressionLayer::new());

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on http://{}", config.bind_addr);
    tracing::info!("CORS origins: {}", config.cors_origins.join(", "));

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
