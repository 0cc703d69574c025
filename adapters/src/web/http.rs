use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use application::ServiceError;
use application::ports::in_::MatchReportSummary;
use domain::{ExternalPlayerId, MatchReport, MatchReportError, PlayerResult, Rating};

use super::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/reportmatch", post(report_match))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMatchRequest {
    pub winner_name: String,
    pub loser_name: String,
    pub winner_elo_before: f64,
    pub loser_elo_before: f64,
    pub winner_elo_current: f64,
    pub loser_elo_current: f64,
    pub winner_steam_id: String,
    pub loser_steam_id: String,
}

impl TryFrom<ReportMatchRequest> for MatchReport {
    type Error = MatchReportError;

    fn try_from(req: ReportMatchRequest) -> Result<Self, Self::Error> {
        MatchReport::new(
            PlayerResult {
                display_name: req.winner_name,
                player_id: ExternalPlayerId(req.winner_steam_id.trim().to_string()),
                rating_before: Rating(req.winner_elo_before),
                rating_current: Rating(req.winner_elo_current),
            },
            PlayerResult {
                display_name: req.loser_name,
                player_id: ExternalPlayerId(req.loser_steam_id.trim().to_string()),
                rating_before: Rating(req.loser_elo_before),
                rating_current: Rating(req.loser_elo_current),
            },
        )
    }
}

#[derive(Serialize)]
struct ReportMatchResponse {
    status: &'static str,
    #[serde(flatten)]
    summary: MatchReportSummary,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Service(ServiceError),
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            ApiError::Service(err) => {
                let status = match &err {
                    ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                    ServiceError::NotFound(_) | ServiceError::NotLinked(_) => StatusCode::NOT_FOUND,
                    ServiceError::UpstreamUnavailable(_) | ServiceError::Platform(_) => StatusCode::BAD_GATEWAY,
                    ServiceError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
                    ServiceError::Configuration { .. } | ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };
        (status, Json(json!({ "status": "error", "error": message }))).into_response()
    }
}

pub async fn index() -> &'static str {
    "Hello, Yomi Ranked!"
}

pub async fn report_match(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReportMatchRequest>, JsonRejection>,
) -> Result<Json<impl Serialize>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected match report body");
        ApiError::BadRequest(rejection.body_text())
    })?;
    let report = MatchReport::try_from(request).map_err(|err| {
        warn!(error = %err, "Rejected invalid match report");
        ApiError::BadRequest(err.to_string())
    })?;

    // Detached: a sender hanging up must not cancel processing halfway.
    let processor = state.processor.clone();
    let outcome = state
        .in_flight
        .spawn(async move { processor.process(&report).await })
        .await
        .map_err(|_| {
            error!("Match report task ended without a result");
            ApiError::Internal("match report processing aborted".into())
        })?;
    let summary = outcome.map_err(|err| {
        warn!(error = %err, "Match report could not be processed");
        ApiError::from(err)
    })?;

    let failures = summary
        .guilds
        .iter()
        .flat_map(|g| [&g.winner, &g.loser])
        .filter(|sync| sync.is_failure())
        .count();
    info!(guilds = summary.guilds.len(), failures, "Match report handled");

    Ok(Json(ReportMatchResponse {
        status: "ok",
        summary,
    }))
}
