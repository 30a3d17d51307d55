use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::AssignmentGrade;

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Round {
    pub(crate) id: String,
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) round_name: Option<String>,
    pub(crate) held_on: Option<Date>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One round of a class as shown in selection lists.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct RoundSummary {
    pub(crate) round_number: i32,
    pub(crate) round_name: Option<String>,
    pub(crate) held_on: Option<Date>,
    pub(crate) active_material_id: Option<String>,
    pub(crate) score_count: i64,
}

/// An uploaded paginated document for one class round.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct Material {
    pub(crate) id: String,
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) title: Option<String>,
    pub(crate) page_count: i32,
    pub(crate) file_ref: String,
    pub(crate) is_active: bool,
    pub(crate) regions_revision: i64,
    pub(crate) uploaded_at: PrimitiveDateTime,
    pub(crate) superseded_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct RegionRow {
    pub(crate) question_number: i32,
    pub(crate) page_number: i32,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct ScoreRecord {
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) student_id: String,
    pub(crate) student_name: Option<String>,
    pub(crate) test_score: Option<i32>,
    pub(crate) total_questions: Option<i32>,
    pub(crate) wrong_questions: String,
    pub(crate) assignment1: AssignmentGrade,
    pub(crate) assignment2: AssignmentGrade,
    pub(crate) memo: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
