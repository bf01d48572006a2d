use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::identity::IdentityError;
use crate::core::{state::AppState, time::primitive_now_utc};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::access_policy::{self, Actor};

/// Authenticated caller; the local record is created on first sight.
pub(crate) struct CurrentUser(pub(crate) User);

/// Caller on optional-auth routes. No header means anonymous, a bad token is
/// still a 401.
pub(crate) struct MaybeUser(pub(crate) Option<User>);

pub(crate) struct CurrentAdmin(pub(crate) User);

impl MaybeUser {
    pub(crate) fn actor(&self) -> Actor {
        Actor::from(self.0.as_ref())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(CurrentUser(user)),
            MaybeUser(None) => Err(ApiError::Unauthorized("Authorization token required")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(MaybeUser(None));
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized("Authorization token required"))?;

        let user = resolve_user(state, token).await?;
        Ok(MaybeUser(Some(user)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        access_policy::require_admin(&Actor::from(&user))?;
        Ok(CurrentAdmin(user))
    }
}

async fn resolve_user(state: &AppState, token: &str) -> Result<User, ApiError> {
    let identity = state.identity().resolve(token).await.map_err(|err| match err {
        IdentityError::InvalidToken(reason) => {
            tracing::debug!(reason = %reason, "Rejected identity token");
            ApiError::Unauthorized("Invalid or expired token")
        }
        IdentityError::Unavailable(reason) => {
            ApiError::internal(reason, "Failed to verify identity token")
        }
    })?;

    let existing = repositories::users::find_by_identity_id(state.db(), &identity.subject)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;
    if let Some(user) = existing {
        return Ok(user);
    }

    let Some(email) = identity.email.as_deref() else {
        return Err(ApiError::Unauthorized("Token does not carry an email address"));
    };

    tracing::info!(identity_id = %identity.subject, "Provisioning user on first sign-in");
    repositories::users::get_or_create(
        state.db(),
        repositories::users::NewUser {
            id: &Uuid::new_v4().to_string(),
            identity_id: &identity.subject,
            name: identity.name.as_deref().unwrap_or(""),
            email,
            role: UserRole::User,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict("Email is already linked to another account".to_string())
        } else {
            ApiError::internal(e, "Failed to provision user")
        }
    })
}
