use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    ConfigError, GoalInputs, GoalOutcome, Ledger, LedgerSummary, PlannerDefaults, ScenarioResult,
    SequenceInputs, SimulationConfig, SurvivalGrid, SurvivalInputs, analyze_sequence_risk,
    build_survival_grid, reverse_goal, simulate,
};

mod params;

pub use params::{ApiRateConvention, GoalParams, SequenceParams, SimulateParams, SurvivalParams};

#[derive(Clone)]
struct AppState {
    defaults: Arc<PlannerDefaults>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub config: SimulationConfig,
    pub summary: LedgerSummary,
    pub years: Ledger,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalResponse {
    pub inputs: GoalInputs,
    #[serde(flatten)]
    pub outcome: GoalOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResponse {
    pub inputs: SequenceInputs,
    #[serde(flatten)]
    pub result: ScenarioResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalResponse {
    pub inputs: SurvivalInputs,
    pub survival_rate: f64,
    #[serde(flatten)]
    pub grid: SurvivalGrid,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn run_simulate(
    params: &SimulateParams,
    defaults: &PlannerDefaults,
) -> Result<SimulateResponse, ConfigError> {
    let config = params.resolve(defaults)?;
    let ledger = simulate(&config)?;
    Ok(SimulateResponse {
        config,
        summary: ledger.summary(),
        years: ledger,
    })
}

pub fn run_goal(
    params: &GoalParams,
    defaults: &PlannerDefaults,
) -> Result<GoalResponse, ConfigError> {
    let inputs = params.resolve(defaults)?;
    let outcome = reverse_goal(&inputs)?;
    Ok(GoalResponse { inputs, outcome })
}

pub fn run_sequence(
    params: &SequenceParams,
    defaults: &PlannerDefaults,
) -> Result<SequenceResponse, ConfigError> {
    let inputs = params.resolve(defaults)?;
    let result = analyze_sequence_risk(&inputs)?;
    Ok(SequenceResponse { inputs, result })
}

pub fn run_survival(
    params: &SurvivalParams,
    defaults: &PlannerDefaults,
) -> Result<SurvivalResponse, ConfigError> {
    let inputs = params.resolve(defaults)?;
    let grid = build_survival_grid(&inputs)?;
    Ok(SurvivalResponse {
        inputs,
        survival_rate: grid.survival_rate(),
        grid,
    })
}

pub async fn run_http_server(port: u16, defaults: PlannerDefaults) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(defaults);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "projection API listening");
    tracing::info!("Local access: http://127.0.0.1:{port}/api/defaults");

    axum::serve(listener, app).await
}

fn router(defaults: PlannerDefaults) -> Router {
    let state = AppState {
        defaults: Arc::new(defaults),
    };
    Router::new()
        .route("/api/defaults", get(defaults_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/goal", get(goal_get_handler).post(goal_post_handler))
        .route(
            "/api/sequence",
            get(sequence_get_handler).post(sequence_post_handler),
        )
        .route(
            "/api/survival",
            get(survival_get_handler).post(survival_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

async fn defaults_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.defaults.as_ref())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    State(state): State<AppState>,
    Query(params): Query<SimulateParams>,
) -> Response {
    respond("simulate", run_simulate(&params, &state.defaults))
}

async fn simulate_post_handler(
    State(state): State<AppState>,
    Json(params): Json<SimulateParams>,
) -> Response {
    respond("simulate", run_simulate(&params, &state.defaults))
}

async fn goal_get_handler(
    State(state): State<AppState>,
    Query(params): Query<GoalParams>,
) -> Response {
    respond("goal", run_goal(&params, &state.defaults))
}

async fn goal_post_handler(
    State(state): State<AppState>,
    Json(params): Json<GoalParams>,
) -> Response {
    respond("goal", run_goal(&params, &state.defaults))
}

async fn sequence_get_handler(
    State(state): State<AppState>,
    Query(params): Query<SequenceParams>,
) -> Response {
    respond("sequence", run_sequence(&params, &state.defaults))
}

async fn sequence_post_handler(
    State(state): State<AppState>,
    Json(params): Json<SequenceParams>,
) -> Response {
    respond("sequence", run_sequence(&params, &state.defaults))
}

async fn survival_get_handler(
    State(state): State<AppState>,
    Query(params): Query<SurvivalParams>,
) -> Response {
    respond("survival", run_survival(&params, &state.defaults))
}

async fn survival_post_handler(
    State(state): State<AppState>,
    Json(params): Json<SurvivalParams>,
) -> Response {
    respond("survival", run_survival(&params, &state.defaults))
}

fn respond<T: Serialize>(operation: &'static str, result: Result<T, ConfigError>) -> Response {
    match result {
        Ok(body) => {
            tracing::info!(operation, "request served");
            json_response(StatusCode::OK, body)
        }
        Err(err) => {
            tracing::info!(operation, error = %err, "rejected invalid input");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PlannerDefaults {
        PlannerDefaults::default()
    }

    #[test]
    fn simulate_response_serialization_keeps_nulls_distinct_from_zero() {
        let response =
            run_simulate(&SimulateParams::default(), &defaults()).expect("defaults are valid");
        assert_eq!(response.years.len(), 30);

        let json = serde_json::to_value(&response).expect("response should serialize");
        let first = &json["years"][0];
        assert_eq!(first["year"], 1);
        assert_eq!(first["monthlyContribution"], 1000.0);
        assert!(first["monthlyWithdrawal"].is_null());
        assert!(first["annualWithdrawal"].is_null());
        assert_eq!(first["cumulativeWithdrawn"], 0.0);

        let eleventh = &json["years"][10];
        assert!(eleventh["monthlyContribution"].is_null());
        assert_eq!(eleventh["annualContribution"], 0.0);
        assert_eq!(eleventh["monthlyWithdrawal"], 10000.0);

        assert!(json["summary"]["finalBalance"].is_number());
        assert_eq!(json["config"]["rateConvention"], "nominal-monthly");
    }

    #[test]
    fn goal_response_flattens_outcome_status() {
        let params: GoalParams =
            serde_json::from_str(r#"{"target": 0, "initialContribution": 5000, "years": 10}"#)
                .expect("json should parse");
        let response = run_goal(&params, &defaults()).expect("valid inputs");
        let json = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(json["status"], "achievable");
        assert_eq!(json["stepUpPercent"], 0.0);
        assert_eq!(json["inputs"]["target"], 0.0);

        let params: GoalParams =
            serde_json::from_str(r#"{"target": 1e15}"#).expect("json should parse");
        let json = serde_json::to_value(run_goal(&params, &defaults()).expect("valid inputs"))
            .expect("response should serialize");
        assert_eq!(json["status"], "unachievable");
        assert!(json["maxFutureValue"].is_number());
    }

    #[test]
    fn sequence_response_contains_three_scenarios() {
        let response =
            run_sequence(&SequenceParams::default(), &defaults()).expect("defaults are valid");
        let json = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(json["years"].as_array().map(Vec::len), Some(31));
        for label in ["bear", "flat", "bull"] {
            assert_eq!(json[label]["label"], label);
            assert_eq!(json[label]["balances"].as_array().map(Vec::len), Some(31));
        }
    }

    #[test]
    fn survival_response_contains_grid_and_rate() {
        let response =
            run_survival(&SurvivalParams::default(), &defaults()).expect("defaults are valid");
        let json = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(json["withdrawalRates"].as_array().map(Vec::len), Some(5));
        assert_eq!(json["rows"][0][0]["durationYears"], 10);
        assert!(json["rows"][0][0]["survived"].is_boolean());
        assert!(json["survivalRate"].is_number());
    }

    #[test]
    fn config_errors_surface_as_messages() {
        let params: SimulateParams =
            serde_json::from_str(r#"{"contributionYears": 0, "withdrawalYears": 0}"#)
                .expect("json should parse");
        let err = run_simulate(&params, &defaults()).expect_err("empty horizon");
        assert_eq!(err, ConfigError::EmptyHorizon);
        assert!(err.to_string().contains("at least 1"));

        let params: SequenceParams =
            serde_json::from_str(r#"{"years": -1}"#).expect("json should parse");
        let err = run_sequence(&params, &defaults()).expect_err("negative years");
        assert!(err.to_string().contains("years must be >= 0"));
    }
}
