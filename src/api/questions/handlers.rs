use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser, MaybeUser};
use crate::api::validation::{validate_course_id, QueryParams, ValidatedJson};
use crate::core::state::AppState;
use crate::core::time::{current_year, primitive_now_utc};
use crate::repositories;
use crate::schemas::pagination::Pagination;
use crate::schemas::question::{
    QuestionCreate, QuestionListQuery, QuestionListResponse, QuestionResponse, QuestionUpdate,
};
use crate::schemas::{normalize_tags, MessageResponse};
use crate::services::access_policy::{self, Actor, QuestionAccess, QuestionAction};
use crate::services::question_query::{self, QuestionFilter, QuestionPredicate};

pub(super) async fn create_question(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    validate_course_id(&payload.course_id)?;
    question_query::validate_year(payload.year, current_year())?;
    ensure_course_exists(&state, &payload.course_id).await?;

    let tags = normalize_tags(payload.tags);
    let images = non_blank_entries(payload.images);
    let attachments = non_blank_entries(payload.attachments);

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            body: &payload.body,
            course_id: &payload.course_id,
            year: payload.year,
            exam_type: payload.exam_type,
            question_type: payload.question_type,
            difficulty: payload.difficulty,
            images: &images,
            attachments: &attachments,
            tags: &tags,
            uploaded_by: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    metrics::counter!("questions_created_total").increment(1);
    tracing::info!(
        question_id = %question.id,
        course_id = %question.course_id,
        user_id = %user.id,
        "Question submitted for review"
    );

    let response = load_expanded(&state, &question.id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub(super) async fn list_questions(
    maybe_user: MaybeUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<QuestionListQuery>,
) -> Result<Json<QuestionListResponse>, ApiError> {
    let filter = question_query::parse_list_query(&query, current_year())?;
    let page = filter.page;

    let Some(predicate) = resolve_predicate(&state, &filter, &maybe_user.actor()).await? else {
        return Ok(Json(QuestionListResponse {
            questions: Vec::new(),
            pagination: Pagination::empty(page),
        }));
    };

    let total = repositories::questions::count(state.db(), &predicate)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
    let rows = repositories::questions::list_expanded(
        state.db(),
        &predicate,
        page.offset(),
        Some(page.limit),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(QuestionListResponse {
        questions: rows.into_iter().map(QuestionResponse::from_row).collect(),
        pagination: Pagination::new(page, total),
    }))
}

pub(super) async fn get_question(
    Path(question_id): Path<String>,
    maybe_user: MaybeUser,
    State(state): State<AppState>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let row = repositories::questions::find_expanded(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or(ApiError::NotFound("Question not found"))?;

    access_policy::authorize_question(
        &maybe_user.actor(),
        QuestionAccess::from(&row.question),
        QuestionAction::Read,
    )?;

    Ok(Json(QuestionResponse::from_row(row)))
}

pub(super) async fn update_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or(ApiError::NotFound("Question not found"))?;

    let actor = Actor::from(&user);
    access_policy::authorize_question(
        &actor,
        QuestionAccess::from(&question),
        QuestionAction::Update,
    )?;

    if let Some(course_id) = payload.course_id.as_deref() {
        validate_course_id(course_id)?;
        ensure_course_exists(&state, course_id).await?;
    }
    if let Some(year) = payload.year {
        question_query::validate_year(year, current_year())?;
    }

    let updated = repositories::questions::update(
        state.db(),
        &question_id,
        repositories::questions::UpdateQuestion {
            title: payload.title,
            body: payload.body,
            course_id: payload.course_id,
            year: payload.year,
            exam_type: payload.exam_type,
            question_type: payload.question_type,
            difficulty: payload.difficulty,
            images: payload.images.map(non_blank_entries),
            attachments: payload.attachments.map(non_blank_entries),
            tags: payload.tags.map(normalize_tags),
            updated_at: primitive_now_utc(),
        },
        !actor.is_admin(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?;
    if !updated {
        return Err(write_skipped(&state, &actor, &question_id, QuestionAction::Update).await);
    }

    Ok(Json(load_expanded(&state, &question_id).await?))
}

pub(super) async fn delete_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or(ApiError::NotFound("Question not found"))?;

    let actor = Actor::from(&user);
    access_policy::authorize_question(
        &actor,
        QuestionAccess::from(&question),
        QuestionAction::Delete,
    )?;

    let deleted = repositories::questions::delete(state.db(), &question_id, !actor.is_admin())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(write_skipped(&state, &actor, &question_id, QuestionAction::Delete).await);
    }

    tracing::info!(question_id = %question_id, user_id = %user.id, "Question deleted");

    Ok(Json(MessageResponse::new("Question deleted successfully")))
}

pub(super) async fn approve_question(
    Path(question_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or(ApiError::NotFound("Question not found"))?;

    access_policy::authorize_question(
        &Actor::from(&admin),
        QuestionAccess::from(&question),
        QuestionAction::Approve,
    )?;

    let approved = repositories::questions::approve(state.db(), &question_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to approve question"))?;
    if !approved {
        return Err(ApiError::NotFound("Question not found"));
    }

    if !question.approved {
        metrics::counter!("questions_approved_total").increment(1);
        tracing::info!(question_id = %question_id, admin_id = %admin.id, "Question approved");
    }

    Ok(Json(load_expanded(&state, &question_id).await?))
}

pub(super) async fn bulk_import(CurrentAdmin(_admin): CurrentAdmin) -> ApiError {
    ApiError::NotImplemented("Bulk import not implemented yet")
}

pub(super) async fn find_duplicates(CurrentAdmin(_admin): CurrentAdmin) -> ApiError {
    ApiError::NotImplemented("Duplicate detection not implemented yet")
}

/// Resolves the course match and builds the store predicate. `None` means
/// the course match selected nothing.
pub(super) async fn resolve_predicate(
    state: &AppState,
    filter: &QuestionFilter,
    actor: &Actor,
) -> Result<Option<QuestionPredicate>, ApiError> {
    let course_ids = match filter.course.as_deref() {
        Some(fragment) => Some(
            repositories::courses::find_ids_matching(state.db(), fragment)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to resolve course filter"))?,
        ),
        None => None,
    };

    Ok(question_query::build_predicate(filter, actor, course_ids))
}

/// Explains a guarded write that touched no row: the question is gone, or it
/// changed under the caller (approved in between).
pub(super) async fn write_skipped(
    state: &AppState,
    actor: &Actor,
    question_id: &str,
    action: QuestionAction,
) -> ApiError {
    let current = match repositories::questions::find_by_id(state.db(), question_id).await {
        Ok(current) => current,
        Err(e) => return ApiError::internal(e, "Failed to fetch question"),
    };

    match current {
        None => ApiError::NotFound("Question not found"),
        Some(question) => {
            match access_policy::authorize_question(actor, QuestionAccess::from(&question), action) {
                Err(denial) => denial.into(),
                Ok(()) => ApiError::Conflict("Question changed during the request".to_string()),
            }
        }
    }
}

async fn ensure_course_exists(state: &AppState, course_id: &str) -> Result<(), ApiError> {
    let exists = repositories::courses::exists(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to validate course"))?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Invalid course ID".to_string()))
    }
}

async fn load_expanded(state: &AppState, question_id: &str) -> Result<QuestionResponse, ApiError> {
    repositories::questions::find_expanded(state.db(), question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .map(QuestionResponse::from_row)
        .ok_or(ApiError::NotFound("Question not found"))
}

fn non_blank_entries(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()
}
