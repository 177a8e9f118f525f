//! HTTP API of the enrollment backend.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use super::model::EnrollmentRequest;
use super::repository::EnrollmentRepository;

pub const MSG_REGISTERED: &str = "Matrícula registrada com sucesso!";
pub const ERR_REQUIRED_FIELDS: &str = "Campos 'nome', 'email' e 'curso' são obrigatórios.";
pub const ERR_INVALID_JSON: &str = "Requisição inválida. JSON esperado.";
pub const ERR_NOT_FOUND: &str = "Matrícula não encontrada.";
pub const ERR_INTERNAL: &str = "Erro interno ao acessar as matrículas.";
pub const HOME_TEXT: &str = "Backend de Matrículas em execução!";

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn EnrollmentRepository>,
}

/// Build the backend router.
pub fn enrollment_routes(repository: Arc<dyn EnrollmentRepository>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/matriculas", get(list_enrollments).post(create_enrollment))
        .route("/api/matriculas/{id}", get(get_enrollment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { repository })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "erro": message }))).into_response()
}

async fn home() -> &'static str {
    HOME_TEXT
}

async fn create_enrollment(
    State(state): State<AppState>,
    payload: Result<Json<EnrollmentRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, ERR_INVALID_JSON);
    };
    let Some(new_enrollment) = request.validate() else {
        return error_response(StatusCode::BAD_REQUEST, ERR_REQUIRED_FIELDS);
    };

    match state.repository.insert(&new_enrollment).await {
        Ok(enrollment) => {
            info!(id = enrollment.id, "Enrollment registered");
            debug!(?enrollment, "Enrollment data");
            (
                StatusCode::CREATED,
                Json(json!({
                    "mensagem": MSG_REGISTERED,
                    "matricula_id": enrollment.id,
                    "dados": enrollment,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to store enrollment");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ERR_INTERNAL)
        }
    }
}

async fn list_enrollments(State(state): State<AppState>) -> Response {
    match state.repository.list().await {
        Ok(enrollments) => Json(enrollments).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list enrollments");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ERR_INTERNAL)
        }
    }
}

async fn get_enrollment(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.repository.get(id).await {
        Ok(Some(enrollment)) => Json(enrollment).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, ERR_NOT_FOUND),
        Err(e) => {
            error!(id, error = %e, "Failed to load enrollment");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ERR_INTERNAL)
        }
    }
}
