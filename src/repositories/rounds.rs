use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::{Round, RoundSummary};

pub(crate) const COLUMNS: &str =
    "id, class_name, round_number, round_name, held_on, created_at, updated_at";

pub(crate) struct UpsertRound<'a> {
    pub(crate) id: &'a str,
    pub(crate) class_name: &'a str,
    pub(crate) round_number: i32,
    pub(crate) round_name: Option<&'a str>,
    pub(crate) held_on: Option<Date>,
    pub(crate) now: PrimitiveDateTime,
}

/// Creates the round or refreshes its label and date when new values are given.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertRound<'_>,
) -> Result<Round, sqlx::Error> {
    sqlx::query_as::<_, Round>(&format!(
        "INSERT INTO rounds (id, class_name, round_number, round_name, held_on, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         ON CONFLICT (class_name, round_number) DO UPDATE
         SET round_name = COALESCE(EXCLUDED.round_name, rounds.round_name),
             held_on = COALESCE(EXCLUDED.held_on, rounds.held_on),
             updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.class_name)
    .bind(params.round_number)
    .bind(params.round_name)
    .bind(params.held_on)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find(
    pool: &PgPool,
    class_name: &str,
    round_number: i32,
) -> Result<Option<Round>, sqlx::Error> {
    sqlx::query_as::<_, Round>(&format!(
        "SELECT {COLUMNS}
         FROM rounds
         WHERE class_name = $1 AND round_number = $2"
    ))
    .bind(class_name)
    .bind(round_number)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_summaries(
    pool: &PgPool,
    class_name: &str,
) -> Result<Vec<RoundSummary>, sqlx::Error> {
    sqlx::query_as::<_, RoundSummary>(
        "SELECT r.round_number,
                r.round_name,
                r.held_on,
                m.id AS active_material_id,
                (SELECT COUNT(*)
                   FROM score_records s
                  WHERE s.class_name = r.class_name AND s.round_number = r.round_number
                ) AS score_count
         FROM rounds r
         LEFT JOIN materials m
           ON m.class_name = r.class_name AND m.round_number = r.round_number AND m.is_active
         WHERE r.class_name = $1
         ORDER BY r.round_number",
    )
    .bind(class_name)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_class_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT class_name
         FROM rounds
         ORDER BY class_name",
    )
    .fetch_all(pool)
    .await
}
