use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub(crate) enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "exam_type", rename_all = "lowercase")]
pub(crate) enum ExamType {
    Midterm,
    Final,
    Viva,
    Assignment,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "question_type")]
pub(crate) enum QuestionType {
    #[serde(rename = "MCQ")]
    #[sqlx(rename = "MCQ")]
    Mcq,
    #[serde(rename = "short")]
    #[sqlx(rename = "short")]
    Short,
    #[serde(rename = "long")]
    #[sqlx(rename = "long")]
    Long,
    #[serde(rename = "problem")]
    #[sqlx(rename = "problem")]
    Problem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "difficulty", rename_all = "lowercase")]
pub(crate) enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl ExamType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Midterm => "midterm",
            Self::Final => "final",
            Self::Viva => "viva",
            Self::Assignment => "assignment",
            Self::Quiz => "quiz",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "midterm" => Some(Self::Midterm),
            "final" => Some(Self::Final),
            "viva" => Some(Self::Viva),
            "assignment" => Some(Self::Assignment),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }
}

impl QuestionType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Mcq => "MCQ",
            Self::Short => "short",
            Self::Long => "long",
            Self::Problem => "problem",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "MCQ" => Some(Self::Mcq),
            "short" => Some(Self::Short),
            "long" => Some(Self::Long),
            "problem" => Some(Self::Problem),
            _ => None,
        }
    }
}

impl Difficulty {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}
