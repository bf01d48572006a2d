use crate::schemas::question::QuestionResponse;
use crate::services::question_query::FilterError;

const CSV_HEADER: [&str; 13] = [
    "id",
    "title",
    "body",
    "course_name",
    "course_code",
    "year",
    "exam_type",
    "question_type",
    "difficulty",
    "tags",
    "uploaded_by",
    "approved",
    "created_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub(crate) fn parse(value: Option<&str>) -> Result<Self, FilterError> {
        match value.map(str::trim) {
            None | Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            Some(_) => Err(FilterError::Format),
        }
    }

    pub(crate) fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    pub(crate) fn filename(self) -> &'static str {
        match self {
            Self::Csv => "questions.csv",
            Self::Json => "questions.json",
        }
    }
}

/// RFC 4180 document with CRLF line endings. Missing course or uploader
/// render as empty cells.
pub(crate) fn to_csv(questions: &[QuestionResponse]) -> String {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER.iter().copied());

    for question in questions {
        let course_name = question.course.as_ref().map(|c| c.name.as_str()).unwrap_or("");
        let course_code = question.course.as_ref().map(|c| c.code.as_str()).unwrap_or("");
        let uploader = question.uploader.as_ref().map(|u| u.name.as_str()).unwrap_or("");
        let year = question.year.to_string();
        let tags = question.tags.join(";");
        let approved = if question.approved { "true" } else { "false" };

        push_record(
            &mut out,
            [
                question.id.as_str(),
                question.title.as_str(),
                question.body.as_str(),
                course_name,
                course_code,
                year.as_str(),
                question.exam_type.as_str(),
                question.question_type.as_str(),
                question.difficulty.as_str(),
                tags.as_str(),
                uploader,
                approved,
                question.created_at.as_str(),
            ],
        );
    }

    out
}

pub(crate) fn to_json(questions: &[QuestionResponse]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(questions)
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (index, field) in fields.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

fn push_field(out: &mut String, field: &str) {
    let needs_quotes = field.contains([',', '"', '\r', '\n']);
    if !needs_quotes {
        out.push_str(field);
        return;
    }

    out.push('"');
    for ch in field.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}
