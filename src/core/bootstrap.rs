use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdminSeed {
    NotConfigured,
    AlreadyAdmin,
    Promoted,
    Created,
    /// `ADMIN_EMAIL` matches nobody and there is no identity id to create from.
    Pending,
}

/// Makes the configured account an admin. Safe to run on every start.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<AdminSeed> {
    let admin = state.settings().admin();
    let Some(email) = admin.email.as_deref() else {
        tracing::debug!("ADMIN_EMAIL not configured; skipping admin seeding");
        return Ok(AdminSeed::NotConfigured);
    };

    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_email(state.db(), email).await? {
        if user.role == UserRole::Admin {
            tracing::info!(user_id = %user.id, "Configured admin already has admin role");
            return Ok(AdminSeed::AlreadyAdmin);
        }

        repositories::users::set_role(state.db(), &user.id, UserRole::Admin, now).await?;
        tracing::info!(user_id = %user.id, email = %email, "Promoted existing user to admin");
        return Ok(AdminSeed::Promoted);
    }

    let Some(identity_id) = admin.identity_id.as_deref() else {
        tracing::warn!(
            email = %email,
            "No user with ADMIN_EMAIL yet and ADMIN_IDENTITY_ID unset; admin will be seeded after first sign-in"
        );
        return Ok(AdminSeed::Pending);
    };

    let user = repositories::users::get_or_create(
        state.db(),
        repositories::users::NewUser {
            id: &Uuid::new_v4().to_string(),
            identity_id,
            name: &admin.name,
            email,
            role: UserRole::Admin,
            created_at: now,
        },
    )
    .await?;

    // The identity id may already belong to a user under another email.
    if user.role != UserRole::Admin {
        repositories::users::set_role(state.db(), &user.id, UserRole::Admin, now).await?;
        tracing::info!(user_id = %user.id, "Promoted user matching ADMIN_IDENTITY_ID to admin");
        return Ok(AdminSeed::Promoted);
    }

    tracing::info!(user_id = %user.id, email = %email, "Created admin user");
    Ok(AdminSeed::Created)
}
