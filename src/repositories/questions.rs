use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{Question, QuestionExpandedRow};
use crate::db::types::{Difficulty, ExamType, QuestionType};
use crate::services::question_query::{QuestionOrder, QuestionPredicate};

const QUESTION_COLUMNS: &str = "id, title, body, course_id, year, exam_type, question_type, \
     difficulty, images, attachments, tags, uploaded_by, approved, created_at, updated_at";

const EXPANDED_SELECT: &str = "SELECT q.id, q.title, q.body, q.course_id, q.year, q.exam_type, \
            q.question_type, q.difficulty, q.images, q.attachments, q.tags, q.uploaded_by, \
            q.approved, q.created_at, q.updated_at, \
            c.name AS course_name, c.code AS course_code, \
            u.name AS uploader_name, u.email AS uploader_email \
     FROM questions q \
     LEFT JOIN courses c ON c.id = q.course_id \
     LEFT JOIN users u ON u.id = q.uploaded_by";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) body: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) year: i32,
    pub(crate) exam_type: ExamType,
    pub(crate) question_type: QuestionType,
    pub(crate) difficulty: Difficulty,
    pub(crate) images: &'a [String],
    pub(crate) attachments: &'a [String],
    pub(crate) tags: &'a [String],
    pub(crate) uploaded_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateQuestion {
    pub(crate) title: Option<String>,
    pub(crate) body: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) year: Option<i32>,
    pub(crate) exam_type: Option<ExamType>,
    pub(crate) question_type: Option<QuestionType>,
    pub(crate) difficulty: Option<Difficulty>,
    pub(crate) images: Option<Vec<String>>,
    pub(crate) attachments: Option<Vec<String>>,
    pub(crate) tags: Option<Vec<String>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

/// New questions always start unapproved.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, title, body, course_id, year, exam_type, question_type, difficulty,
            images, attachments, tags, uploaded_by, approved, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,FALSE,$13,$13)
         RETURNING {QUESTION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.body)
    .bind(params.course_id)
    .bind(params.year)
    .bind(params.exam_type)
    .bind(params.question_type)
    .bind(params.difficulty)
    .bind(params.images)
    .bind(params.attachments)
    .bind(params.tags)
    .bind(params.uploaded_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    question_id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
    ))
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_expanded(
    pool: &PgPool,
    question_id: &str,
) -> Result<Option<QuestionExpandedRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionExpandedRow>(&format!("{EXPANDED_SELECT} WHERE q.id = $1"))
        .bind(question_id)
        .fetch_optional(pool)
        .await
}

/// `pending_only` makes the write skip a question that was approved after the
/// caller's policy check.
pub(crate) async fn update(
    pool: &PgPool,
    question_id: &str,
    params: UpdateQuestion,
    pending_only: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE questions SET
            title = COALESCE($1, title),
            body = COALESCE($2, body),
            course_id = COALESCE($3, course_id),
            year = COALESCE($4, year),
            exam_type = COALESCE($5, exam_type),
            question_type = COALESCE($6, question_type),
            difficulty = COALESCE($7, difficulty),
            images = COALESCE($8, images),
            attachments = COALESCE($9, attachments),
            tags = COALESCE($10, tags),
            updated_at = $11
         WHERE id = $12 AND (NOT $13 OR approved = FALSE)",
    )
    .bind(params.title)
    .bind(params.body)
    .bind(params.course_id)
    .bind(params.year)
    .bind(params.exam_type)
    .bind(params.question_type)
    .bind(params.difficulty)
    .bind(params.images)
    .bind(params.attachments)
    .bind(params.tags)
    .bind(params.updated_at)
    .bind(question_id)
    .bind(pending_only)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// One-way: there is no statement that clears `approved`.
pub(crate) async fn approve(
    pool: &PgPool,
    question_id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE questions
         SET approved = TRUE,
             updated_at = CASE WHEN approved THEN updated_at ELSE $1 END
         WHERE id = $2",
    )
    .bind(updated_at)
    .bind(question_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(
    pool: &PgPool,
    question_id: &str,
    pending_only: bool,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM questions WHERE id = $1 AND (NOT $2 OR approved = FALSE)")
            .bind(question_id)
            .bind(pending_only)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count(pool: &PgPool, predicate: &QuestionPredicate) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM questions q WHERE TRUE");
    push_predicate(&mut builder, predicate);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// One page of expanded rows in predicate order. `limit = None` returns every match.
pub(crate) async fn list_expanded(
    pool: &PgPool,
    predicate: &QuestionPredicate,
    skip: i64,
    limit: Option<i64>,
) -> Result<Vec<QuestionExpandedRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(EXPANDED_SELECT);
    builder.push(" WHERE TRUE");
    push_predicate(&mut builder, predicate);

    match (predicate.order(), predicate.free_text.as_deref()) {
        (QuestionOrder::Relevance, Some(text)) => {
            builder.push(" ORDER BY ts_rank(q.search_vector, websearch_to_tsquery('english', ");
            builder.push_bind(text.to_string());
            builder.push(")) DESC, q.created_at DESC, q.id DESC");
        }
        _ => {
            builder.push(" ORDER BY q.created_at DESC, q.id DESC");
        }
    }

    builder.push(" OFFSET ");
    builder.push_bind(skip.max(0));
    if let Some(limit) = limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    builder.build_query_as::<QuestionExpandedRow>().fetch_all(pool).await
}

fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &QuestionPredicate) {
    if predicate.approved_only {
        builder.push(" AND q.approved = TRUE");
    }
    if let Some(course_ids) = &predicate.course_ids {
        builder.push(" AND q.course_id = ANY(");
        builder.push_bind(course_ids.clone());
        builder.push(")");
    }
    if let Some(year) = predicate.year {
        builder.push(" AND q.year = ");
        builder.push_bind(year);
    }
    if let Some(exam_type) = predicate.exam_type {
        builder.push(" AND q.exam_type = ");
        builder.push_bind(exam_type);
    }
    if let Some(question_type) = predicate.question_type {
        builder.push(" AND q.question_type = ");
        builder.push_bind(question_type);
    }
    if !predicate.tags.is_empty() {
        builder.push(" AND q.tags && ");
        builder.push_bind(predicate.tags.clone());
        builder.push("::text[]");
    }
    if let Some(text) = &predicate.free_text {
        builder.push(" AND q.search_vector @@ websearch_to_tsquery('english', ");
        builder.push_bind(text.clone());
        builder.push(")");
    }
}
