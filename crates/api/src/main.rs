use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockrec_core::cache::{InMemoryCache, RecommendationCache};
use stockrec_core::config::Settings;
use stockrec_core::error::ServiceError;
use stockrec_core::extract::extract_pages;
use stockrec_core::ingest::{CompanyPageSource, ScreenerClient};
use stockrec_core::util::{cache_key, validate_company_name};
use stockrec_core::{Analyzer, AnalyzerOptions, FinancialSnapshot, StockRecommendation};

const SERVICE_NAME: &str = "stock-recommendation-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let source = ScreenerClient::from_settings(&settings)?;
    let state = AppState {
        source: Arc::new(source),
        analyzer: Arc::new(Analyzer::new(AnalyzerOptions::from_settings(&settings))),
        cache: Arc::new(InMemoryCache::from_settings(&settings)),
    };

    let app = router(state).layer(cors_layer(&settings));

    let addr = format!("{}:{}", settings.host, settings.port);
    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/health", get(health))
        .route("/api", get(api_info))
        .route("/recommend", post(recommend))
        .route("/company/:company_name/data", get(company_data))
        .route("/cache", delete(clear_cache))
        .route("/cache/stats", get(cache_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if settings.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

#[derive(Clone)]
struct AppState {
    source: Arc<dyn CompanyPageSource>,
    analyzer: Arc<Analyzer>,
    cache: Arc<dyn RecommendationCache>,
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    company_name: String,
}

#[derive(Debug, Serialize)]
struct CompanyDataResponse {
    company_name: String,
    data: FinancialSnapshot,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct CacheStatsResponse {
    cached_companies: usize,
    companies: Vec<String>,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": Utc::now(),
        "components": {
            "source": state.source.provider_name(),
            "analyzer": "operational",
            "api": "operational",
        },
    }))
}

async fn api_info() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Stock recommendation service is running",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn recommend(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<StockRecommendation>, StatusCode> {
    let company_name = req.company_name.trim();
    if !validate_company_name(company_name) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let key = cache_key(company_name);
    if let Some(hit) = state.cache.get(&key).await {
        tracing::info!(company = company_name, "serving cached recommendation");
        return Ok(Json(hit));
    }

    let snapshot = load_snapshot(&state, company_name).await?;
    if snapshot.is_not_found() {
        return Err(StatusCode::NOT_FOUND);
    }

    let recommendation = state.analyzer.analyze(&snapshot);
    tracing::info!(
        company = company_name,
        recommendation = %recommendation.recommendation,
        confidence = recommendation.confidence_score,
        "generated recommendation"
    );
    state.cache.put(&key, recommendation.clone()).await;

    Ok(Json(recommendation))
}

async fn company_data(
    State(state): State<AppState>,
    Path(company_name): Path<String>,
) -> Result<Json<CompanyDataResponse>, StatusCode> {
    let company_name = company_name.trim().to_string();
    if !validate_company_name(&company_name) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let snapshot = load_snapshot(&state, &company_name).await?;
    if snapshot.is_not_found() {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(Json(CompanyDataResponse {
        company_name,
        data: snapshot,
        status: "success",
    }))
}

async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.cache.clear().await;
    Json(json!({ "message": "Cache cleared successfully" }))
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.cache.stats().await;
    Json(CacheStatsResponse {
        cached_companies: stats.count,
        companies: stats.keys,
    })
}

/// Fetch the pages and run extraction off the async workers.
async fn load_snapshot(state: &AppState, company_name: &str) -> Result<FinancialSnapshot, StatusCode> {
    let pages = state
        .source
        .fetch_company_pages(company_name)
        .await
        .map_err(|e| status_for(&e))?
        .ok_or(StatusCode::NOT_FOUND)?;

    let name = company_name.to_string();
    let snapshot = tokio::task::spawn_blocking(move || extract_pages(&pages, &name))
        .await
        .map_err(|e| {
            let err = anyhow::Error::new(e).context("extraction task failed");
            sentry_anyhow::capture_anyhow(&err);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    tracing::info!(
        company = company_name,
        sections = ?snapshot.sections.populated_sections(),
        periods = snapshot.periods.len(),
        "extracted company data"
    );
    Ok(snapshot)
}

fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<ServiceError>() {
        Some(ServiceError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
        Some(ServiceError::CompanyNotFound(_)) => StatusCode::NOT_FOUND,
        Some(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
        _ => {
            sentry_anyhow::capture_anyhow(err);
            tracing::error!(error = %err, "company fetch failed");
            StatusCode::BAD_GATEWAY
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
