use axum::extract::State;
use axum::{routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::ValidatedJson;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::user::{ProfileResponse, ProfileUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(me).put(update_me))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse::from_db(user))
}

/// Blank optional fields are stored as given; `name` must stay non-empty.
async fn update_me(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let updated = repositories::users::update_profile(
        state.db(),
        &user.id,
        repositories::users::UpdateProfile {
            name: payload.name,
            blood_group: payload.blood_group,
            phone_number: payload.phone_number,
            university_reg_no: payload.university_reg_no,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update profile"))?
    .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(ProfileResponse::from_db(updated)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn me_provisions_user_on_first_request() {
        let ctx = test_support::setup_test_context().await;
        let token = test_support::bearer_token_for(
            "fresh-uid",
            "fresh@example.com",
            "Fresh User",
            ctx.state.settings(),
        );

        for _ in 0..2 {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(Method::GET, "/api/auth/me", Some(&token), None))
                .await
                .expect("me");

            let status = response.status();
            let body = test_support::read_json(response).await;
            assert_eq!(status, StatusCode::OK, "response: {body}");
            assert_eq!(body["email"], "fresh@example.com");
            assert_eq!(body["name"], "Fresh User");
            assert_eq!(body["role"], "user");
            assert!(body.get("identity_id").is_none());
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE identity_id = $1")
            .bind("fresh-uid")
            .fetch_one(ctx.state.db())
            .await
            .expect("count users");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn me_requires_token() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .oneshot(test_support::json_request(Method::GET, "/api/auth/me", None, None))
            .await
            .expect("me");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authorization token required");
    }

    #[tokio::test]
    async fn update_profile_changes_only_given_fields() {
        let ctx = test_support::setup_test_context().await;
        let user =
            test_support::insert_user(ctx.state.db(), "user-uid", "Student", "student@example.com")
                .await;
        let token = test_support::bearer_token(&user, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                "/api/auth/me",
                Some(&token),
                Some(json!({ "blood_group": "O+", "phone_number": " 555-0100 ", "role": "admin" })),
            ))
            .await
            .expect("update profile");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["name"], "Student");
        assert_eq!(body["blood_group"], "O+");
        assert_eq!(body["phone_number"], "555-0100");
        assert_eq!(body["role"], "user");

        let stored = repositories::users::find_by_id(ctx.state.db(), &user.id)
            .await
            .expect("find user")
            .expect("user exists");
        assert_eq!(stored.blood_group.as_deref(), Some("O+"));

        let response = ctx
            .app
            .oneshot(test_support::json_request(
                Method::PUT,
                "/api/auth/me",
                Some(&token),
                Some(json!({ "name": "" })),
            ))
            .await
            .expect("blank name");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
