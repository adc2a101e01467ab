// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        catalog::{Catalog, CatalogRequest},
        quiz_set::{PublicQuizSet, SampledQuizSet},
    },
    quiz::sampler::generate_quiz_set_from_request,
    state::AppState,
};

/// Samples the server catalog. Failure here means the bundled catalog is
/// unfit, so it is reported as a server error rather than a bad request.
pub(crate) fn sample_server_catalog(
    catalog: &Catalog,
    config: &Config,
) -> Result<SampledQuizSet, AppError> {
    catalog
        .sample(config.quiz_shape, &mut rand::rng())
        .map_err(|e| {
            tracing::error!("Failed to sample server catalog: {}", e);
            AppError::InternalServerError(e.to_string())
        })
}

/// Generates a quiz from the loaded catalog.
///
/// Returns the lesson material and questions without the answer key.
pub async fn generate_quiz(
    State(catalog): State<Arc<Catalog>>,
    State(config): State<Config>,
) -> Result<impl IntoResponse, AppError> {
    let set = sample_server_catalog(&catalog, &config)?;
    Ok(Json(PublicQuizSet::from(&set)))
}

/// Generates a quiz from a client-supplied catalog.
///
/// * Fails with 400 when `concepts` is missing or the catalog is too small.
pub async fn generate_quiz_from_catalog(
    State(config): State<Config>,
    Json(payload): Json<CatalogRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let set = generate_quiz_set_from_request(&payload, config.quiz_shape, &mut rand::rng())?;
    Ok(Json(PublicQuizSet::from(&set)))
}

/// Retrieves the top completed sessions, best score first.
pub async fn get_results(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.outcomes.top()))
}
