use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{QueryParams, ValidatedJson};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::course::{
    CourseCreate, CourseListQuery, CourseListResponse, CourseResponse, CourseUpdate,
};
use crate::schemas::pagination::{PageRequest, Pagination};
use crate::schemas::{normalize_tags, MessageResponse};
use crate::services::access_policy::{self, Actor, CourseAction};

const CODE_TAKEN: &str = "Course code already exists";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:course_id", get(get_course).put(update_course).delete(delete_course))
}

async fn create_course(
    CurrentUser(admin): CurrentUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    access_policy::authorize_course(&Actor::from(&admin), CourseAction::Create)?;

    let taken = repositories::courses::code_taken(state.db(), &payload.code, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check course code"))?;
    if taken {
        return Err(ApiError::BadRequest(CODE_TAKEN.to_string()));
    }

    let now = primitive_now_utc();
    let tags = normalize_tags(payload.tags);
    let description = non_blank(payload.description);
    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            code: &payload.code,
            description: description.as_deref(),
            tags: &tags,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| map_code_conflict(e, "Failed to create course"))?;

    tracing::info!(
        course_id = %course.id,
        code = %course.code,
        admin_id = %admin.id,
        "Course created"
    );

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn list_courses(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CourseListQuery>,
) -> Result<Json<CourseListResponse>, ApiError> {
    let page = PageRequest::parse(query.page.as_deref(), query.limit.as_deref())?;
    let search = non_blank(query.q);

    let total = repositories::courses::count(state.db(), search.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count courses"))?;
    let courses =
        repositories::courses::list(state.db(), search.as_deref(), page.offset(), page.limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(CourseResponse::from_db).collect(),
        pagination: Pagination::new(page, total),
    }))
}

async fn get_course(
    Path(course_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or(ApiError::NotFound("Course not found"))?;

    Ok(Json(CourseResponse::from_db(course)))
}

async fn update_course(
    Path(course_id): Path<String>,
    CurrentUser(admin): CurrentUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    access_policy::authorize_course(&Actor::from(&admin), CourseAction::Update)?;

    let exists = repositories::courses::exists(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?;
    if !exists {
        return Err(ApiError::NotFound("Course not found"));
    }

    if let Some(code) = payload.code.as_deref() {
        let taken = repositories::courses::code_taken(state.db(), code, Some(&course_id))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check course code"))?;
        if taken {
            return Err(ApiError::BadRequest(CODE_TAKEN.to_string()));
        }
    }

    let updated = repositories::courses::update(
        state.db(),
        &course_id,
        repositories::courses::UpdateCourse {
            name: payload.name,
            code: payload.code,
            description: payload.description.map(|d| non_blank(Some(d))),
            tags: payload.tags.map(normalize_tags),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| map_code_conflict(e, "Failed to update course"))?
    .ok_or(ApiError::NotFound("Course not found"))?;

    tracing::info!(course_id = %updated.id, admin_id = %admin.id, "Course updated");

    Ok(Json(CourseResponse::from_db(updated)))
}

/// Questions referencing the course are left in place.
async fn delete_course(
    Path(course_id): Path<String>,
    CurrentUser(admin): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    access_policy::authorize_course(&Actor::from(&admin), CourseAction::Delete)?;

    let deleted = repositories::courses::delete(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;
    if !deleted {
        return Err(ApiError::NotFound("Course not found"));
    }

    tracing::info!(course_id = %course_id, admin_id = %admin.id, "Course deleted");

    Ok(Json(MessageResponse::new("Course deleted successfully")))
}

fn map_code_conflict(err: sqlx::Error, context: &str) -> ApiError {
    if repositories::is_unique_violation(&err) {
        ApiError::BadRequest(CODE_TAKEN.to_string())
    } else {
        ApiError::internal(err, context)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
