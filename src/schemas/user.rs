use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::types::UserRole;
use crate::schemas::trimmed_opt;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 120, message = "Name must be between 1 and 120 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 8, message = "Blood group is too long"))]
    pub(crate) blood_group: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub(crate) phone_number: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 64, message = "University registration number is too long"))]
    pub(crate) university_reg_no: Option<String>,
}

/// Self profile. The external identity id never leaves the service.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) blood_group: Option<String>,
    pub(crate) phone_number: Option<String>,
    pub(crate) university_reg_no: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ProfileResponse {
    pub(crate) fn from_db(user: crate::db::models::User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            blood_group: user.blood_group,
            phone_number: user.phone_number,
            university_reg_no: user.university_reg_no,
            created_at: format_primitive(user.created_at),
            updated_at: format_primitive(user.updated_at),
        }
    }
}
