//! Contact Form API Server
//!
//! Accepts contact-form submissions from the Czwarta Zmiana website, checks
//! that the sender's address can receive mail and forwards the message to the
//! band's inbox.

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use contact_core::ContactPipeline;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api_handler;
mod config;
mod middleware;
mod routes;

use config::{load_config, AppConfig, SecurityConfig};

/// Shared application state
pub struct AppState {
    pub pipeline: Arc<ContactPipeline>,
    pub config: Arc<AppConfig>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("Failed to load configuration")?;

    init_tracing(&config)?;

    info!("Starting Contact Form API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Mail relay {}:{} (secure: {}), delivering to {}",
        config.mail.server, config.mail.port, config.mail.secure, config.mail.to
    );

    let pipeline = ContactPipeline::new(config.contact_config())
        .context("Failed to initialize contact pipeline")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server host or port")?;

    let app_state = Arc::new(AppState {
        pipeline: Arc::new(pipeline),
        config: Arc::new(config),
    });

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on {}", addr);
    info!("Contact form endpoint: http://{}/api/send", addr);
    info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Create the main application router
fn create_router(state: Arc<AppState>) -> Router {
    let security = state.config.security.clone();
    with_layers(routes::build_routes(state), &security)
}

/// Wrap `router` in the middleware stack, innermost first
///
/// Security headers sit outside panic recovery so the catch-all 500 carries
/// them too.
fn with_layers(router: Router, security: &SecurityConfig) -> Router {
    router
        .layer(DefaultBodyLimit::max(security.max_body_size_bytes))
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&security.cors_origins))
        .layer(CompressionLayer::new())
}

/// CORS for the configured origins; any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Initialize tracing and logging
///
/// `RUST_LOG` wins over the configured log level.
fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.observability.log_level))
        .context("Invalid log filter")?;

    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()?;
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
