use sqlx::PgPool;

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, identity_id, name, email, role, blood_group, phone_number, university_reg_no, \
    created_at, updated_at";

pub(crate) struct NewUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) identity_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) role: UserRole,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateProfile {
    pub(crate) name: Option<String>,
    pub(crate) blood_group: Option<String>,
    pub(crate) phone_number: Option<String>,
    pub(crate) university_reg_no: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[cfg(test)]
pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_identity_id(
    pool: &PgPool,
    identity_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE identity_id = $1"))
        .bind(identity_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Idempotent on `identity_id`: concurrent first requests for the same
/// identity converge on one row. The role of an existing row is never touched.
pub(crate) async fn get_or_create(pool: &PgPool, params: NewUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, identity_id, name, email, role, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         ON CONFLICT (identity_id) DO NOTHING",
    )
    .bind(params.id)
    .bind(params.identity_id)
    .bind(params.name)
    .bind(params.email)
    .bind(params.role)
    .bind(params.created_at)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE identity_id = $1"))
        .bind(params.identity_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn update_profile(
    pool: &PgPool,
    id: &str,
    params: UpdateProfile,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            name = COALESCE($1, name),
            blood_group = COALESCE($2, blood_group),
            phone_number = COALESCE($3, phone_number),
            university_reg_no = COALESCE($4, university_reg_no),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.blood_group)
    .bind(params.phone_number)
    .bind(params.university_reg_no)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_role(
    pool: &PgPool,
    id: &str,
    role: UserRole,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role = $1, updated_at = $2 WHERE id = $3")
        .bind(role)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
