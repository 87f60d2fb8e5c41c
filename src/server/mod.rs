pub mod context;
pub mod handlers;
pub mod query;
pub mod response;
pub mod state;
pub mod url_validation;

use crate::config::{Config, SegmentStrategy};
use crate::error::RelayError;
use crate::metrics;
use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, Method, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use context::ProxyContext;
use response::ProxyResponse;
use state::AppState;
use std::time::Instant;
use tracing::{error, info};

/// Version header attached to every response.
const VERSION_HEADER: &str = "x-relay-version";

/// Build the Axum application: service routes plus the manifest dispatcher.
///
/// Classification of manifest traffic happens in [`dispatch`], the fallback
/// handler — routing is by path suffix, not by fixed route table. The
/// service routes chain into the same fallback for non-GET methods so an
/// OPTIONS request is answered with a CORS preflight no matter which path
/// it hits.
pub fn build_router(config: Config) -> Router {
    let state = AppState::new(config);
    let prometheus = metrics::prometheus_handle();

    Router::new()
        .route(
            "/health",
            get(handlers::health::health_check).fallback(dispatch),
        )
        .route(
            "/metrics",
            get(move || {
                let prometheus = prometheus.clone();
                async move { prometheus.map(|h| h.render()).unwrap_or_default() }
            })
            .fallback(dispatch),
        )
        .fallback(dispatch)
        .layer(middleware::from_fn(version_header))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let app = build_router(config);

    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("🚀 Relay listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

/// Attach the build version to every outbound response.
async fn version_header(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response.headers_mut().insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

/// Classify and serve a manifest request.
///
/// Evaluated in fixed priority order:
/// 1. GET on `*/master.m3u8` with a `url` parameter — multi-variant fetch
/// 2. GET on `*.m3u8` — media playlist fetch
/// 3. GET on `*.ts` (redirect strategy only) — segment redirect
/// 4. OPTIONS — CORS preflight
/// 5. anything else — 404
///
/// Handler failures are converted to the JSON error envelope here, in one
/// place, via [`RelayError`]'s response conversion.
async fn dispatch(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let start = Instant::now();
    let path = uri.path();
    let params = query::normalize(&query::raw_params(uri.query().unwrap_or_default()));
    let ctx = ProxyContext::new(params);

    let (operation, result) = if method == Method::GET
        && path.ends_with("/master.m3u8")
        && ctx.url().is_some()
    {
        ("master", handlers::master::handle(&state, &ctx).await)
    } else if method == Method::GET && path.ends_with(".m3u8") {
        ("media", handlers::media::handle(&state, path, &ctx).await)
    } else if method == Method::GET
        && path.ends_with(".ts")
        && state.config.segment_strategy == SegmentStrategy::Redirect
    {
        ("segment", handlers::segment::handle(&state, &ctx))
    } else if method == Method::OPTIONS {
        ("preflight", Ok(ProxyResponse::preflight()))
    } else {
        ("not_found", Err(RelayError::NotFound))
    };

    if matches!(
        result,
        Err(RelayError::UpstreamFetch { .. } | RelayError::PlaylistParse { .. })
    ) {
        metrics::record_upstream_error();
    }

    let response = match result {
        Ok(proxy_response) => proxy_response.into_response(),
        Err(e) => e.into_response(),
    };

    metrics::record_request(operation, response.status().as_u16());
    metrics::record_duration(operation, start);

    response
}
