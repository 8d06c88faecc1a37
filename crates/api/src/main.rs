use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_kpi_core::domain::{CrmSnapshot, EntityId};
use crm_kpi_core::kpi::{self, KpiDashboard, KpiOptions, RmPerformance, TeamSummary};
use crm_kpi_core::store::{CrmStore, HttpJsonStore};
use crm_kpi_core::time::{self, Range};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = crm_kpi_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let opts = KpiOptions::from_env()?;

    let store: Option<Arc<dyn CrmStore>> = match HttpJsonStore::from_settings(&settings) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "CRM store not configured; starting API in degraded mode");
            None
        }
    };

    let state = AppState { store, opts };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, utc_offset = %opts.utc_offset, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", get(get_dashboard))
        .route("/team", get(get_team))
        .route("/rms/:rm_id/dashboard", get(get_rm_dashboard))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    store: Option<Arc<dyn CrmStore>>,
    opts: KpiOptions,
}

#[derive(Debug, Default, Deserialize)]
struct KpiQuery {
    range: Option<String>,
    now: Option<String>,
}

impl KpiQuery {
    fn resolve(&self, opts: &KpiOptions) -> Result<(Range, NaiveDateTime), StatusCode> {
        let range = match self.range.as_deref() {
            Some(s) => s.parse::<Range>().map_err(|_| StatusCode::BAD_REQUEST)?,
            None => Range::default(),
        };
        let now = time::period::resolve_now(self.now.as_deref(), chrono::Utc::now(), opts.utc_offset)
            .map_err(|_| StatusCode::BAD_REQUEST)?;
        Ok((range, now))
    }
}

async fn load_snapshot(state: &AppState) -> Result<CrmSnapshot, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    store.fetch_snapshot().await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "CRM store fetch failed");
        StatusCode::BAD_GATEWAY
    })
}

async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<KpiQuery>,
) -> Result<Json<KpiDashboard>, StatusCode> {
    let (range, now) = query.resolve(&state.opts)?;
    let snapshot = load_snapshot(&state).await?;
    Ok(Json(kpi::compute_dashboard(&snapshot, range, now, &state.opts)))
}

async fn get_team(
    State(state): State<AppState>,
    Query(query): Query<KpiQuery>,
) -> Result<Json<TeamSummary>, StatusCode> {
    let (range, now) = query.resolve(&state.opts)?;
    let snapshot = load_snapshot(&state).await?;
    Ok(Json(kpi::compute_dashboard(&snapshot, range, now, &state.opts).team))
}

async fn get_rm_dashboard(
    State(state): State<AppState>,
    Path(rm_id): Path<String>,
    Query(query): Query<KpiQuery>,
) -> Result<Json<RmPerformance>, StatusCode> {
    let (range, now) = query.resolve(&state.opts)?;
    let snapshot = load_snapshot(&state).await?;

    let rm_id = EntityId::new(rm_id);
    kpi::rm_dashboard(&snapshot, &rm_id, range, now, &state.opts)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &crm_kpi_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
