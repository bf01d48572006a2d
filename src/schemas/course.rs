use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::pagination::Pagination;
use crate::core::time::format_primitive;
use crate::schemas::{trimmed, trimmed_opt};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Course name is required"))]
    pub(crate) name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Course code is required"))]
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "Course name cannot be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "Course code cannot be empty"))]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CourseListQuery {
    pub(crate) q: Option<String>,
    pub(crate) page: Option<String>,
    pub(crate) limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) description: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: crate::db::models::Course) -> Self {
        Self {
            id: course.id,
            name: course.name,
            code: course.code,
            description: course.description,
            tags: course.tags,
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseListResponse {
    pub(crate) courses: Vec<CourseResponse>,
    pub(crate) pagination: Pagination,
}
