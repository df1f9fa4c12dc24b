//! HTTP surface: the form page plus a JSON API over the same pipeline.

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::artifacts::Artifacts;
use crate::config::AppConfig;
use crate::error::{PredictionAssemblyFailure, PredictorError, Result};
use crate::form::FormSchema;
use crate::pipeline::{PredictionReport, Predictor};
use crate::record::CarSpec;
use crate::view::{self, Outcome};

#[derive(Clone)]
pub struct AppState {
    predictor: Predictor,
    schema: Arc<FormSchema>,
}

impl AppState {
    pub fn new(artifacts: &Artifacts, config: &AppConfig) -> Result<Self> {
        let schema = FormSchema::new(&artifacts.encoders, config.reference_year)?;
        Ok(AppState {
            predictor: Predictor::from_artifacts(artifacts).with_logging(config.log_pred),
            schema: Arc::new(schema),
        })
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }
}

enum SubmitError {
    Rejected(PredictorError),
    Failed(PredictionAssemblyFailure),
}

fn submit(state: &AppState, spec: &CarSpec) -> std::result::Result<PredictionReport, SubmitError> {
    let record = state.schema.collect(spec).map_err(SubmitError::Rejected)?;
    match state.predictor.predict(&record) {
        Ok(report) => {
            tracing::debug!("predicted {:.2} for {:?}", report.price, report.input.columns());
            Ok(report)
        }
        Err(failure) => {
            tracing::warn!(
                "{}; input={:?} expected={:?} encoded={:?}",
                failure,
                failure.input_features,
                failure.model_features,
                failure.encoded_features
            );
            Err(SubmitError::Failed(failure))
        }
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let spec = state.schema.default_spec();
    Html(view::render_page(&state.schema, &spec, None))
}

async fn predict_form(State(state): State<AppState>, Form(spec): Form<CarSpec>) -> Html<String> {
    let page = match submit(&state, &spec) {
        Ok(report) => view::render_page(&state.schema, &spec, Some(Outcome::Success(&report))),
        Err(SubmitError::Failed(failure)) => {
            view::render_page(&state.schema, &spec, Some(Outcome::Failure(&failure)))
        }
        Err(SubmitError::Rejected(e)) => {
            view::render_page(&state.schema, &spec, Some(Outcome::Rejected(e.to_string())))
        }
    };
    Html(page)
}

async fn predict_json(
    State(state): State<AppState>,
    Json(spec): Json<CarSpec>,
) -> std::result::Result<Json<PredictionReport>, (StatusCode, Json<serde_json::Value>)> {
    submit(&state, &spec).map(Json).map_err(|e| match e {
        SubmitError::Rejected(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(json!({ "error": e.to_string() })))
        }
        SubmitError::Failed(failure) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!(failure.diagnostics())),
        ),
    })
}

async fn schema(State(state): State<AppState>) -> Json<FormSchema> {
    Json(state.schema.as_ref().clone())
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "features": state.predictor.features().len(),
        "encoders": state.predictor.encoders().len(),
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/api/schema", get(schema))
        .route("/health", get(health))
        .with_state(state)
}
