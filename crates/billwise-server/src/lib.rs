//! Billwise Web Server
//!
//! Axum-based REST API for the Billwise personal finance analyzer.
//!
//! Security features:
//! - Bearer API key authentication (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy unless origins are configured
//! - Upload validation (image content types, 10 MB limit)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use billwise_core::ai::{AIBackend, AIClient};
use billwise_core::storage::Storage;

mod handlers;

/// Maximum bill image size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Request body cap for the upload route; leaves room for multipart framing
/// so oversize files reach the explicit size check
const UPLOAD_BODY_LIMIT: usize = 2 * MAX_UPLOAD_SIZE;

/// How to enable the AI routes, shown when no backend is configured
pub const AI_NOT_CONFIGURED_HINT: &str = "set OLLAMA_HOST, or AI_BACKEND=openai_compatible \
     with OPENAI_COMPATIBLE_HOST, to enable bill scanning and chat";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Comma-separated API keys accepted as bearer tokens
pub const API_KEYS_ENV: &str = "BILLWISE_API_KEYS";

/// Comma-separated CORS origins (`*` for any)
pub const ALLOWED_ORIGINS_ENV: &str = "BILLWISE_ALLOWED_ORIGINS";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// API keys, sent as "Bearer <key>" in the Authorization header
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

impl ServerConfig {
    /// Build a config from `BILLWISE_API_KEYS` and `BILLWISE_ALLOWED_ORIGINS`
    pub fn from_env(require_auth: bool) -> Self {
        Self {
            require_auth,
            allowed_origins: parse_list(&std::env::var(ALLOWED_ORIGINS_ENV).unwrap_or_default()),
            api_keys: parse_list(&std::env::var(API_KEYS_ENV).unwrap_or_default()),
        }
    }
}

/// Split a comma-separated setting, dropping blanks
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Shared application state
pub struct AppState {
    pub store: Storage,
    pub config: ServerConfig,
    pub ai: Option<AIClient>,
}

/// Authentication middleware - validates bearer API keys
///
/// API keys are compared using constant-time comparison to prevent timing attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key.trim(), &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        tracing::debug!(path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Success response carrying a payload
#[derive(Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Create the application router, configuring AI from the environment
pub fn create_router(store: Storage, config: ServerConfig) -> Router {
    let ai = AIClient::from_env();
    tracing::debug!(
        host = ai.as_ref().map(|c| c.host()),
        "Building router from environment"
    );
    create_router_with_options(store, config, ai)
}

/// Create the application router with an explicit AI client (for testing)
pub fn create_router_with_options(
    store: Storage,
    config: ServerConfig,
    ai: Option<AIClient>,
) -> Router {
    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        ai,
    });

    let api_routes = Router::new()
        // Bills
        .route(
            "/upload-bill",
            post(handlers::upload_bill).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Chat
        .route("/chat", post(handlers::chat))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction).delete(handlers::delete_transaction),
        )
        // Insights
        .route("/insights", get(handlers::get_insights))
        .route("/dashboard", get(handlers::get_dashboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Build CORS layer
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    store: Storage,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() {
        warn!(
            "⚠️  Authentication enabled but {} is empty - every /api request will be rejected",
            API_KEYS_ENV
        );
    }

    let ai = AIClient::from_env();
    check_ai_connection(ai.as_ref()).await;

    let app = create_router_with_options(store, config, ai);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(ai: Option<&AIClient>) {
    match ai {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured ({})", AI_NOT_CONFIGURED_HINT);
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// The AI collaborator answered with an error or unusable output
    pub fn bad_gateway(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        } else if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "Request failed");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
