use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    /// Secret expected in `X-Admin-Token` on operator routes.
    pub admin_token: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "postgres://{}:{}@{}:{}/{}",
                    var("POSTGRES_USER", "originhub"),
                    var("POSTGRES_PASSWORD", "originhub123"),
                    var("POSTGRES_HOST", "localhost"),
                    var("POSTGRES_PORT", "5432"),
                    var("POSTGRES_DB", "originhub"),
                )
            });

        let cors_origins = var("CORS_ORIGINS", "*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid DB_MAX_CONNECTIONS, using default");
                DEFAULT_MAX_CONNECTIONS
            }),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let admin_token = lookup("ADMIN_TOKEN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self {
            database_url,
            bind_addr: var("BIND_ADDR", DEFAULT_BIND_ADDR),
            cors_origins,
            db_max_connections,
            admin_token,
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        if self.cors_origins.iter().any(|o| o == "*") {
            return layer.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
