use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod catalog;
mod handlers;
mod middleware;
mod models;
mod openai_client;
mod response;
mod services;
mod store;

use store::conversations::{ConversationStore, MemoryConversationStore};
use store::users::{MemoryUserStore, UserStore};

/// Shared application state. The stores are trait objects so the in-memory
/// implementations can be swapped for persistent ones without touching the
/// handlers.
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub conversations: Arc<dyn ConversationStore>,
    pub catalog: catalog::EssentialCatalog,
    pub openai: Option<openai_client::OpenAiClient>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    // Initialize OpenAI client if API key is provided
    let openai = match std::env::var("OPENAI_API_KEY").ok() {
        Some(api_key) if !api_key.is_empty() => {
            tracing::info!("Initializing OpenAI client...");
            Some(openai_client::OpenAiClient::new(api_key))
        }
        _ => {
            tracing::warn!("OPENAI_API_KEY not found. AI conversation features will be disabled.");
            tracing::info!("To enable AI features, set: OPENAI_API_KEY and optionally OPENAI_MODEL");
            None
        }
    };

    let shared_state = Arc::new(AppState {
        users: Arc::new(MemoryUserStore::seeded()),
        conversations: Arc::new(MemoryConversationStore::new()),
        catalog: catalog::EssentialCatalog::seed(),
        openai,
    });

    let app = Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(handlers::essential::essential_routes())
        .merge(handlers::ai::ai_routes())
        .route("/health", axum::routing::get(health))
        .route("/api", axum::routing::get(api_info))
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(cors_layer())
        .layer(Extension(shared_state));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind server port");
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Server failed");
}

fn parse_cors_origin(origin: &str) -> Option<axum::http::HeaderValue> {
    origin.parse().ok()
}

/// Restricts CORS to `CORS_ORIGIN` when set, otherwise allows all origins.
fn cors_layer() -> CorsLayer {
    match std::env::var("CORS_ORIGIN") {
        Ok(origin) if !origin.is_empty() => match parse_cors_origin(&origin) {
            Some(origin) => {
                tracing::info!("CORS restricted to origin: {:?}", origin);
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods(tower_http::cors::Any)
                    .allow_headers(tower_http::cors::Any)
            }
            None => {
                tracing::warn!("CORS_ORIGIN is not a valid origin value, allowing all origins");
                CorsLayer::permissive()
            }
        },
        _ => CorsLayer::permissive(),
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,chatlingo_api=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,chatlingo_api=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("🚀 ChatLingo API starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );

    let openai_configured = std::env::var("OPENAI_API_KEY").is_ok();
    let jwt_configured = std::env::var("JWT_SECRET").is_ok();
    tracing::info!(
        "Configuration - OpenAI: {}, JWT secret: {}",
        if openai_configured { "✅" } else { "❌" },
        if jwt_configured { "✅" } else { "❌ (using fallback)" }
    );

    Ok(())
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_origin_parses_to_header_value() {
        let origin = parse_cors_origin("http://localhost:3001").unwrap();
        assert_eq!(origin.to_str().unwrap(), "http://localhost:3001");

        assert!(parse_cors_origin("not\na\nheader").is_none());
    }
}

async fn api_info(Extension(state): Extension<Arc<AppState>>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "message": "ChatLingo API Server",
        "version": env!("CARGO_PKG_VERSION"),
        "features": [
            "Essential Learning System",
            "AI-Powered Dialogue",
            "Progress Tracking",
            "User Authentication"
        ],
        "services": {
            "openai": if state.openai.is_some() { "configured" } else { "not_configured" },
        },
        "endpoints": {
            "health": "/health",
            "auth": "/api/auth/*",
            "essential": "/api/essential/*",
            "ai": "/api/ai/*"
        }
    }))
}
