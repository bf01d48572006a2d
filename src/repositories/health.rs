use sqlx::PgPool;

/// Round trip to the database that also confirms migrations have created
/// the question store.
pub(crate) async fn question_store_ready(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT to_regclass('public.questions') IS NOT NULL")
        .fetch_one(pool)
        .await
}
