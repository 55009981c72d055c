use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::export::EXPORT_FILENAME;
use super::repository::EvaluationStore;
use super::service::{EvaluationService, GenerationError};

/// Router builder exposing the generation and export endpoints.
pub fn evaluation_router<S>(service: Arc<EvaluationService<S>>) -> Router
where
    S: EvaluationStore + 'static,
{
    Router::new()
        .route("/api/generate/:project_code", get(generate_handler::<S>))
        .route("/api/export", get(export_handler::<S>))
        .with_state(service)
}

/// HTTP status for a failed generation run. The original system returned 500
/// for every failure; here configuration and state problems are client-visible
/// 4xx responses, with 500 reserved for store faults.
pub(crate) fn generation_status(error: &GenerationError) -> StatusCode {
    match error {
        GenerationError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
        GenerationError::InactiveProject(_)
        | GenerationError::NoMembers(_)
        | GenerationError::NoActiveVendors(_) => StatusCode::CONFLICT,
        GenerationError::MissingRoster(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GenerationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) async fn generate_handler<S>(
    State(service): State<Arc<EvaluationService<S>>>,
    Path(project_code): Path<String>,
) -> Response
where
    S: EvaluationStore + 'static,
{
    match service.generate(&project_code) {
        Ok(report) => (StatusCode::OK, report.text()).into_response(),
        Err(error) => (generation_status(&error), error.to_string()).into_response(),
    }
}

pub(crate) async fn export_handler<S>(
    State(service): State<Arc<EvaluationService<S>>>,
) -> Response
where
    S: EvaluationStore + 'static,
{
    match service.export_csv() {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{EXPORT_FILENAME}\""),
                ),
            ],
            body,
        )
            .into_response(),
        Err(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response(),
    }
}
