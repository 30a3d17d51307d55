use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::{Round, RoundSummary};
use crate::services::aggregate::ScoreSummary;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RoundCreate {
    #[serde(alias = "roundNumber")]
    #[validate(range(min = 1, message = "round_number must be positive"))]
    pub(crate) round_number: i32,
    #[serde(default, alias = "roundName")]
    #[validate(length(max = 200, message = "round_name is too long"))]
    pub(crate) round_name: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default, alias = "heldOn")]
    pub(crate) held_on: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RoundResponse {
    pub(crate) id: String,
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) round_name: Option<String>,
    pub(crate) held_on: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl RoundResponse {
    pub(crate) fn from_db(round: Round) -> Self {
        Self {
            id: round.id,
            class_name: round.class_name,
            round_number: round.round_number,
            round_name: round.round_name,
            held_on: round.held_on.map(format_date),
            created_at: format_primitive(round.created_at),
            updated_at: format_primitive(round.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RoundSummaryResponse {
    pub(crate) round_number: i32,
    pub(crate) round_name: Option<String>,
    pub(crate) held_on: Option<String>,
    pub(crate) active_material_id: Option<String>,
    pub(crate) score_count: i64,
}

impl RoundSummaryResponse {
    pub(crate) fn from_db(summary: RoundSummary) -> Self {
        Self {
            round_number: summary.round_number,
            round_name: summary.round_name,
            held_on: summary.held_on.map(format_date),
            active_material_id: summary.active_material_id,
            score_count: summary.score_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassesResponse {
    pub(crate) classes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryQuery {
    #[serde(default, alias = "rememberedTotalQuestions")]
    pub(crate) remembered_total_questions: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreSummaryResponse {
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) round_name: Option<String>,
    pub(crate) average: Option<f64>,
    pub(crate) total_questions: Option<i32>,
    pub(crate) headcount: usize,
    pub(crate) record_count: usize,
}

impl ScoreSummaryResponse {
    pub(crate) fn new(round: Round, summary: ScoreSummary) -> Self {
        Self {
            class_name: round.class_name,
            round_number: round.round_number,
            round_name: round.round_name,
            average: summary.average,
            total_questions: summary.total_questions,
            headcount: summary.headcount,
            record_count: summary.record_count,
        }
    }
}
