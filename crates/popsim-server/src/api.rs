//! HTTP handlers: the HTML form flow and the JSON API.

use crate::form::{self, FormAction, FormFields};
use crate::pages;
use crate::run_tracker::{RunStats, RunTracker};
use crate::runner;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use popsim_core::SimulationConfig;
use popsim_world::SurvivorEntry;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<RunTracker>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            tracker: Arc::new(RunTracker::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/health", get(health))
        .route("/api/simulations", post(create_simulation))
        .route("/api/stats", get(get_stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Blank setup form
pub async fn index() -> Html<String> {
    Html(pages::config_page(&FormFields::new(), &[], None))
}

/// Form submission for either step
pub async fn submit_form(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> Result<Html<String>, ApiError> {
    match FormAction::from_fields(&fields) {
        FormAction::Configure => match form::check_selection(&fields) {
            Ok(selected) => Ok(Html(pages::config_page(&fields, &selected, None))),
            Err(e) => {
                warn!("Rejected form step 1: {}", e);
                Ok(Html(pages::config_page(&fields, &[], Some(&e.to_string()))))
            }
        },
        FormAction::Run => match form::build_config(&fields) {
            Ok(config) => {
                let outcome = runner::execute(config).await?;
                state.tracker.record(&outcome.report);
                crate::record_counter!("simulation_runs", 1, source = "form");
                Ok(Html(pages::result_page(
                    &outcome.report.log.to_text(),
                    outcome.seed,
                )))
            }
            Err(e) => {
                warn!("Rejected form step 2: {}", e);
                Ok(Html(pages::config_page(&fields, &[], Some(&e.to_string()))))
            }
        },
        FormAction::Unknown => Ok(Html(pages::config_page(&fields, &[], None))),
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationResponse {
    seed: u64,
    generations_run: u32,
    extinct: bool,
    survivors: Vec<SurvivorEntry>,
    lines: Vec<String>,
}

/// Run a typed configuration
pub async fn create_simulation(
    State(state): State<AppState>,
    Json(config): Json<SimulationConfig>,
) -> Result<Json<SimulationResponse>, ApiError> {
    config.validate()?;
    info!(
        populations = config.populations.len(),
        interactions = config.interactions.len(),
        generations = config.generations,
        "Simulation requested"
    );

    let outcome = runner::execute(config).await?;
    state.tracker.record(&outcome.report);
    crate::record_counter!("simulation_runs", 1, source = "api");

    let report = outcome.report;
    Ok(Json(SimulationResponse {
        seed: outcome.seed,
        generations_run: report.generations_run,
        extinct: report.extinct,
        lines: report.log.lines(),
        survivors: report.survivors,
    }))
}

/// Get server statistics
pub async fn get_stats(State(state): State<AppState>) -> Json<RunStats> {
    Json(state.tracker.stats())
}

// Error handling
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}

impl From<popsim_core::Error> for ApiError {
    fn from(err: popsim_core::Error) -> Self {
        match err {
            popsim_core::Error::Validation(msg) => ApiError::Validation(msg),
            other => {
                error!("Core error: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("Simulation task failed: {}", err);
        ApiError::Internal(err.to_string())
    }
}
