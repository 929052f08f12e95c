use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use readmegen_core::ratelimit::TokenBucket;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};

use crate::prelude::{eprintln, *};

pub mod generate;

/// Outbound HTTP timeout for template fetches and usage-store calls.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, clap::Parser)]
#[command(name = "serve")]
#[command(about = "Run the README generation gateway")]
pub struct App {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Model used for README generation
    #[arg(long, env = "MODEL_NAME", default_value = "gemini-2.5-flash")]
    pub model: String,

    /// Gemini API key
    #[arg(long, env = "GOOGLE_GEMINI_API_KEY", default_value = "")]
    pub gemini_api_key: String,

    /// Base URL of the usage-tracking store (Supabase-style REST)
    #[arg(long, env = "SUPABASE_CLIENT_URL", default_value = "")]
    pub store_url: String,

    /// API key for the usage-tracking store
    #[arg(long, env = "SUPABASE_ANON_KEY", default_value = "")]
    pub store_api_key: String,

    /// Maximum accepted request body size in bytes (default 500 MiB)
    #[arg(long, env = "READMEGEN_MAX_BODY_BYTES", default_value = "524288000")]
    pub max_body_bytes: usize,

    /// Token-bucket burst capacity for the generation endpoint
    #[arg(long, env = "READMEGEN_RATE_BURST", default_value = "10")]
    pub rate_burst: u32,

    /// Seconds to refill one rate-limit token
    #[arg(long, env = "READMEGEN_RATE_REFILL_SECS", default_value = "60")]
    pub rate_refill_secs: u64,
}

/// Shared per-process state injected into every handler.
///
/// The token bucket is the only piece of state mutated across requests; the
/// reqwest client is documented safe for concurrent use.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<App>,
    pub limiter: Arc<TokenBucket>,
    pub http: reqwest::Client,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: App) -> Result<Self> {
        let limiter = TokenBucket::new(
            config.rate_burst,
            Duration::from_secs(config.rate_refill_secs),
        );
        let http = reqwest::Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            config: Arc::new(config),
            limiter: Arc::new(limiter),
            http,
            started_at: Instant::now(),
        })
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!(
            "Starting readmegen gateway on {}:{} (model: {})...",
            app.host, app.port, app.model
        );
    }

    let addr = format!("{}:{}", app.host, app.port);
    let state = AppState::new(app)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("readmegen listening on http://{addr}");

    axum::serve(listener, router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(AnyOrigin);

    let max_body_bytes = state.config.max_body_bytes;

    // Layers run top-down for inbound requests: CORS, panic guard, body cap,
    // rate limit, security headers, handler.
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        .route("/api/generate-readme", post(generate::generate_readme))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

/// Admission control: one token per request, health checks exempt.
async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.uri().path().ends_with("/health") {
        return next.run(request).await;
    }

    if !state.limiter.allow() {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({"error": "Too many requests, try again later."})),
        )
            .into_response();
    }

    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; script-src 'self'; object-src 'none'"),
    );
    response
}

/// Convert a handler panic into a generic 500 so the process keeps serving.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    log::error!("PANIC: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "Internal server error"})),
    )
        .into_response()
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "Ok",
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "memoryUsage": memory_usage(),
    }))
}

fn memory_usage() -> serde_json::Value {
    let (vms, rss) = read_statm().unwrap_or((0, 0));
    serde_json::json!({ "vms": vms, "rss": rss })
}

#[cfg(target_os = "linux")]
fn read_statm() -> Option<(u64, u64)> {
    // /proc/self/statm reports sizes in pages; assume the common 4 KiB page.
    const PAGE_SIZE: u64 = 4096;
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let mut fields = statm.split_whitespace();
    let vms: u64 = fields.next()?.parse().ok()?;
    let rss: u64 = fields.next()?.parse().ok()?;
    Some((vms * PAGE_SIZE, rss * PAGE_SIZE))
}

#[cfg(not(target_os = "linux"))]
fn read_statm() -> Option<(u64, u64)> {
    None
}
