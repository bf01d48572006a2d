use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::pagination::Pagination;
use crate::core::time::format_primitive;
use crate::db::models::QuestionExpandedRow;
use crate::db::types::{Difficulty, ExamType, QuestionType};
use crate::schemas::{trimmed, trimmed_opt};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Title is required"))]
    pub(crate) title: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Question body is required"))]
    pub(crate) body: String,
    #[serde(deserialize_with = "trimmed")]
    pub(crate) course_id: String,
    pub(crate) year: i32,
    pub(crate) exam_type: ExamType,
    pub(crate) question_type: QuestionType,
    pub(crate) difficulty: Difficulty,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 images per question"))]
    pub(crate) images: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 attachments per question"))]
    pub(crate) attachments: Vec<String>,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
}

/// Partial update. `approved` and `uploaded_by` are not accepted here.
#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "Question body cannot be empty"))]
    pub(crate) body: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    pub(crate) year: Option<i32>,
    #[serde(default)]
    pub(crate) exam_type: Option<ExamType>,
    #[serde(default)]
    pub(crate) question_type: Option<QuestionType>,
    #[serde(default)]
    pub(crate) difficulty: Option<Difficulty>,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 images per question"))]
    pub(crate) images: Option<Vec<String>>,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 attachments per question"))]
    pub(crate) attachments: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) tags: Option<Vec<String>>,
}

/// Raw listing parameters; typed parsing happens in the query engine so
/// malformed values surface as JSON 400s.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuestionListQuery {
    pub(crate) course: Option<String>,
    pub(crate) year: Option<String>,
    pub(crate) exam_type: Option<String>,
    pub(crate) question_type: Option<String>,
    pub(crate) tags: Option<String>,
    pub(crate) q: Option<String>,
    pub(crate) page: Option<String>,
    pub(crate) limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuestionExportQuery {
    pub(crate) course: Option<String>,
    pub(crate) year: Option<String>,
    pub(crate) format: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CourseSummary {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UploaderSummary {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) course_id: String,
    pub(crate) course: Option<CourseSummary>,
    pub(crate) year: i32,
    pub(crate) exam_type: ExamType,
    pub(crate) question_type: QuestionType,
    pub(crate) difficulty: Difficulty,
    pub(crate) images: Vec<String>,
    pub(crate) attachments: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) uploaded_by: String,
    pub(crate) uploader: Option<UploaderSummary>,
    pub(crate) approved: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_row(row: QuestionExpandedRow) -> Self {
        let question = row.question;
        let course = match (row.course_name, row.course_code) {
            (Some(name), Some(code)) => {
                Some(CourseSummary { id: question.course_id.clone(), name, code })
            }
            _ => None,
        };
        let uploader = match (row.uploader_name, row.uploader_email) {
            (Some(name), Some(email)) => {
                Some(UploaderSummary { id: question.uploaded_by.clone(), name, email })
            }
            _ => None,
        };

        Self {
            id: question.id,
            title: question.title,
            body: question.body,
            course_id: question.course_id,
            course,
            year: question.year,
            exam_type: question.exam_type,
            question_type: question.question_type,
            difficulty: question.difficulty,
            images: question.images,
            attachments: question.attachments,
            tags: question.tags,
            uploaded_by: question.uploaded_by,
            uploader,
            approved: question.approved,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionListResponse {
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) pagination: Pagination,
}
