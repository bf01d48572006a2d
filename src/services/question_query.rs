//! Translates listing parameters into a store predicate.
//!
//! Parsing is strict: malformed values are reported, never coerced. The
//! approval gate is derived from the actor and cannot be switched off by
//! any parameter.

use thiserror::Error;

use crate::schemas::pagination::PageRequest;
use crate::db::types::{ExamType, QuestionType};
use crate::schemas::question::{QuestionExportQuery, QuestionListQuery};
use crate::services::access_policy::Actor;

pub(crate) const MIN_YEAR: i32 = 1900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum FilterError {
    #[error("Page must be a positive integer")]
    Page,
    #[error("Limit must be between 1 and 100")]
    Limit,
    #[error("Valid year is required")]
    Year,
    #[error("Invalid exam type")]
    ExamType,
    #[error("Invalid question type")]
    QuestionType,
    #[error("Format must be csv or json")]
    Format,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct QuestionFilter {
    pub(crate) course: Option<String>,
    pub(crate) year: Option<i32>,
    pub(crate) exam_type: Option<ExamType>,
    pub(crate) question_type: Option<QuestionType>,
    pub(crate) tags: Vec<String>,
    pub(crate) free_text: Option<String>,
    pub(crate) page: PageRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuestionOrder {
    Newest,
    Relevance,
}

/// Conjunction of conditions applied to `questions`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct QuestionPredicate {
    pub(crate) approved_only: bool,
    pub(crate) course_ids: Option<Vec<String>>,
    pub(crate) year: Option<i32>,
    pub(crate) exam_type: Option<ExamType>,
    pub(crate) question_type: Option<QuestionType>,
    pub(crate) tags: Vec<String>,
    pub(crate) free_text: Option<String>,
}

impl QuestionPredicate {
    pub(crate) fn order(&self) -> QuestionOrder {
        if self.free_text.is_some() {
            QuestionOrder::Relevance
        } else {
            QuestionOrder::Newest
        }
    }
}

pub(crate) fn parse_list_query(
    query: &QuestionListQuery,
    current_year: i32,
) -> Result<QuestionFilter, FilterError> {
    let page = PageRequest::parse(query.page.as_deref(), query.limit.as_deref())?;

    let exam_type = query
        .exam_type
        .as_deref()
        .map(|raw| ExamType::parse(raw.trim()).ok_or(FilterError::ExamType))
        .transpose()?;
    let question_type = query
        .question_type
        .as_deref()
        .map(|raw| QuestionType::parse(raw.trim()).ok_or(FilterError::QuestionType))
        .transpose()?;

    Ok(QuestionFilter {
        course: non_blank(query.course.as_deref()),
        year: parse_year(query.year.as_deref(), current_year)?,
        exam_type,
        question_type,
        tags: query.tags.as_deref().map(parse_tags).unwrap_or_default(),
        free_text: non_blank(query.q.as_deref()),
        page,
    })
}

/// Course and year are the only filters export honours.
pub(crate) fn parse_export_filter(
    query: &QuestionExportQuery,
    current_year: i32,
) -> Result<QuestionFilter, FilterError> {
    Ok(QuestionFilter {
        course: non_blank(query.course.as_deref()),
        year: parse_year(query.year.as_deref(), current_year)?,
        ..QuestionFilter::default()
    })
}

pub(crate) fn parse_year(raw: Option<&str>, current_year: i32) -> Result<Option<i32>, FilterError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let year = raw.trim().parse::<i32>().map_err(|_| FilterError::Year)?;
    validate_year(year, current_year)?;
    Ok(Some(year))
}

pub(crate) fn validate_year(year: i32, current_year: i32) -> Result<(), FilterError> {
    if (MIN_YEAR..=current_year).contains(&year) {
        Ok(())
    } else {
        Err(FilterError::Year)
    }
}

/// Comma-separated list; segments are trimmed and blanks dropped.
pub(crate) fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()).map(str::to_string).collect()
}

/// Builds the predicate for `actor`. `course_ids` is the resolution of the
/// course match, when one was requested; an empty resolution yields `None`,
/// meaning nothing can match and the store need not be queried.
pub(crate) fn build_predicate(
    filter: &QuestionFilter,
    actor: &Actor,
    course_ids: Option<Vec<String>>,
) -> Option<QuestionPredicate> {
    if course_ids.as_ref().is_some_and(Vec::is_empty) {
        return None;
    }

    Some(QuestionPredicate {
        approved_only: !actor.is_admin(),
        course_ids,
        year: filter.year,
        exam_type: filter.exam_type,
        question_type: filter.question_type,
        tags: filter.tags.clone(),
        free_text: filter.free_text.clone(),
    })
}

/// Escapes `%`, `_` and `\` so user input matches literally under ILIKE.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}
