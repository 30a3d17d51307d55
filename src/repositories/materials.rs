use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Material;

pub(crate) const COLUMNS: &str = "\
    id, class_name, round_number, title, page_count, file_ref, is_active, regions_revision, \
    uploaded_at, superseded_at";

pub(crate) struct CreateMaterial<'a> {
    pub(crate) id: &'a str,
    pub(crate) class_name: &'a str,
    pub(crate) round_number: i32,
    pub(crate) title: Option<&'a str>,
    pub(crate) page_count: i32,
    pub(crate) file_ref: &'a str,
    pub(crate) uploaded_at: PrimitiveDateTime,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!(
        "SELECT {COLUMNS}
         FROM materials
         WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_active_for_round(
    pool: &PgPool,
    class_name: &str,
    round_number: i32,
) -> Result<Option<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!(
        "SELECT {COLUMNS}
         FROM materials
         WHERE class_name = $1 AND round_number = $2 AND is_active"
    ))
    .bind(class_name)
    .bind(round_number)
    .fetch_optional(pool)
    .await
}

/// Locks the material row for the rest of the transaction and returns its page count.
pub(crate) async fn lock_page_count(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT page_count
         FROM materials
         WHERE id = $1
         FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn supersede_active_for_round(
    executor: impl sqlx::PgExecutor<'_>,
    class_name: &str,
    round_number: i32,
    now: PrimitiveDateTime,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "UPDATE materials
         SET is_active = FALSE,
             superseded_at = $3
         WHERE class_name = $1 AND round_number = $2 AND is_active
         RETURNING id",
    )
    .bind(class_name)
    .bind(round_number)
    .bind(now)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert_active(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateMaterial<'_>,
) -> Result<Material, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!(
        "INSERT INTO materials (
            id, class_name, round_number, title, page_count, file_ref, is_active,
            regions_revision, uploaded_at
         ) VALUES ($1,$2,$3,$4,$5,$6,TRUE,0,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.class_name)
    .bind(params.round_number)
    .bind(params.title)
    .bind(params.page_count)
    .bind(params.file_ref)
    .bind(params.uploaded_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn bump_regions_revision(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "UPDATE materials
         SET regions_revision = regions_revision + 1
         WHERE id = $1
         RETURNING regions_revision",
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM materials WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
