use sqlx::PgPool;

use crate::db::models::ScoreRecord;

pub(crate) const COLUMNS: &str = "\
    class_name, round_number, student_id, student_name, test_score, total_questions, \
    wrong_questions, assignment1, assignment2, memo, created_at, updated_at";

/// Inserts or replaces the record for `(class, round, student)`, keeping the
/// original creation time.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    record: &ScoreRecord,
) -> Result<ScoreRecord, sqlx::Error> {
    sqlx::query_as::<_, ScoreRecord>(&format!(
        "INSERT INTO score_records ({COLUMNS})
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
         ON CONFLICT (class_name, round_number, student_id) DO UPDATE
         SET student_name = EXCLUDED.student_name,
             test_score = EXCLUDED.test_score,
             total_questions = EXCLUDED.total_questions,
             wrong_questions = EXCLUDED.wrong_questions,
             assignment1 = EXCLUDED.assignment1,
             assignment2 = EXCLUDED.assignment2,
             memo = EXCLUDED.memo,
             updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(&record.class_name)
    .bind(record.round_number)
    .bind(&record.student_id)
    .bind(&record.student_name)
    .bind(record.test_score)
    .bind(record.total_questions)
    .bind(&record.wrong_questions)
    .bind(record.assignment1)
    .bind(record.assignment2)
    .bind(&record.memo)
    .bind(record.created_at)
    .bind(record.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_for_round(
    pool: &PgPool,
    class_name: &str,
    round_number: i32,
) -> Result<Vec<ScoreRecord>, sqlx::Error> {
    sqlx::query_as::<_, ScoreRecord>(&format!(
        "SELECT {COLUMNS}
         FROM score_records
         WHERE class_name = $1 AND round_number = $2
         ORDER BY student_id"
    ))
    .bind(class_name)
    .bind(round_number)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find(
    pool: &PgPool,
    class_name: &str,
    round_number: i32,
    student_id: &str,
) -> Result<Option<ScoreRecord>, sqlx::Error> {
    sqlx::query_as::<_, ScoreRecord>(&format!(
        "SELECT {COLUMNS}
         FROM score_records
         WHERE class_name = $1 AND round_number = $2 AND student_id = $3"
    ))
    .bind(class_name)
    .bind(round_number)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}
