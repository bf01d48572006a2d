use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Course;
use crate::services::question_query::like_pattern;

const COURSE_COLUMNS: &str = "id, name, code, description, tags, created_at, updated_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) code: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) tags: &'a [String],
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateCourse {
    pub(crate) name: Option<String>,
    pub(crate) code: Option<String>,
    /// `Some(None)` clears the description.
    pub(crate) description: Option<Option<String>>,
    pub(crate) tags: Option<Vec<String>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (id, name, code, description, tags, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.code)
    .bind(params.description)
    .bind(params.tags)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists(pool: &PgPool, course_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

/// Whether `code` is taken by a course other than `exclude_id`.
pub(crate) async fn code_taken(
    pool: &PgPool,
    code: &str,
    exclude_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM courses WHERE code = $1 AND ($2::text IS NULL OR id <> $2)
         )",
    )
    .bind(code)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
}

/// Ids of courses whose name or code contains `fragment`, case-insensitively.
pub(crate) async fn find_ids_matching(
    pool: &PgPool,
    fragment: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM courses WHERE name ILIKE $1 OR code ILIKE $1 ORDER BY id",
    )
    .bind(like_pattern(fragment))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM courses");
    push_search(&mut builder, search);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn list(
    pool: &PgPool,
    search: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COURSE_COLUMNS} FROM courses"));
    push_search(&mut builder, search);
    builder.push(" ORDER BY name ASC, id ASC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.build_query_as::<Course>().fetch_all(pool).await
}

pub(crate) async fn update(
    pool: &PgPool,
    course_id: &str,
    params: UpdateCourse,
) -> Result<Option<Course>, sqlx::Error> {
    let touch_description = params.description.is_some();
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            name = COALESCE($1, name),
            code = COALESCE($2, code),
            description = CASE WHEN $7 THEN $3 ELSE description END,
            tags = COALESCE($4, tags),
            updated_at = $5
         WHERE id = $6
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.code)
    .bind(params.description.flatten())
    .bind(params.tags)
    .bind(params.updated_at)
    .bind(course_id)
    .bind(touch_description)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, course_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = $1").bind(course_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

fn push_search(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(search) = search {
        let pattern = like_pattern(search);
        builder.push(" WHERE (name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR code ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}
