use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{Difficulty, ExamType, QuestionType, UserRole};

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) description: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) identity_id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) blood_group: Option<String>,
    pub(crate) phone_number: Option<String>,
    pub(crate) university_reg_no: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) course_id: String,
    pub(crate) year: i32,
    pub(crate) exam_type: ExamType,
    pub(crate) question_type: QuestionType,
    pub(crate) difficulty: Difficulty,
    pub(crate) images: Vec<String>,
    pub(crate) attachments: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) uploaded_by: String,
    pub(crate) approved: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Question joined with its course and uploader. Either side may be gone.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuestionExpandedRow {
    #[sqlx(flatten)]
    pub(crate) question: Question,
    pub(crate) course_name: Option<String>,
    pub(crate) course_code: Option<String>,
    pub(crate) uploader_name: Option<String>,
    pub(crate) uploader_email: Option<String>,
}
