use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use super::handlers::resolve_predicate;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::QueryParams;
use crate::core::state::AppState;
use crate::core::time::current_year;
use crate::repositories;
use crate::schemas::question::{QuestionExportQuery, QuestionResponse};
use crate::services::access_policy::Actor;
use crate::services::export::{self, ExportFormat};
use crate::services::question_query;

/// Admin-only download of every matching question, approved or not.
pub(super) async fn export_questions(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<QuestionExportQuery>,
) -> Result<Response, ApiError> {
    let format = ExportFormat::parse(query.format.as_deref())?;
    let filter = question_query::parse_export_filter(&query, current_year())?;

    let questions = match resolve_predicate(&state, &filter, &Actor::from(&admin)).await? {
        Some(predicate) => repositories::questions::list_expanded(state.db(), &predicate, 0, None)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to export questions"))?
            .into_iter()
            .map(QuestionResponse::from_row)
            .collect(),
        None => Vec::new(),
    };

    let body = match format {
        ExportFormat::Csv => export::to_csv(&questions),
        ExportFormat::Json => export::to_json(&questions)
            .map_err(|e| ApiError::internal(e, "Failed to serialize export"))?,
    };

    tracing::info!(
        admin_id = %admin.id,
        count = questions.len(),
        format = format.filename(),
        "Questions exported"
    );

    let disposition = format!("attachment; filename=\"{}\"", format.filename());
    let mut response = (StatusCode::OK, body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::internal(e, "Failed to build export headers"))?,
    );
    Ok(response)
}
