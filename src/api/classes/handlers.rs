use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::{map_engine_error, ApiError};
use crate::api::validation::{parse_held_on, parse_round_number, validate_class_name};
use crate::core::state::AppState;
use crate::schemas::material::MaterialResponse;
use crate::schemas::round::{
    ClassesResponse, RoundCreate, RoundResponse, RoundSummaryResponse, ScoreSummaryResponse,
    SummaryQuery,
};
use crate::schemas::score::{ScoreRecordResponse, ScoreSave};
use crate::services::aggregate::EntrySession;
use crate::services::notes::{self, ScoreInput};
use crate::services::store::NewRound;

pub(super) async fn list_classes(
    State(state): State<AppState>,
) -> Result<Json<ClassesResponse>, ApiError> {
    let classes = state
        .store()
        .class_names()
        .await
        .map_err(|e| map_engine_error(e, "Failed to list classes"))?;
    Ok(Json(ClassesResponse { classes }))
}

pub(super) async fn list_rounds(
    Path(class_name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoundSummaryResponse>>, ApiError> {
    let class_name = validate_class_name(&class_name)?;
    let rounds = state
        .store()
        .rounds_for_class(&class_name)
        .await
        .map_err(|e| map_engine_error(e, "Failed to list rounds"))?;
    Ok(Json(rounds.into_iter().map(RoundSummaryResponse::from_db).collect()))
}

pub(super) async fn create_round(
    Path(class_name): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<RoundCreate>,
) -> Result<(StatusCode, Json<RoundResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let class_name = validate_class_name(&class_name)?;
    let held_on = parse_held_on(payload.held_on.as_deref())?;

    let round = state
        .store()
        .upsert_round(NewRound {
            class_name,
            round_number: payload.round_number,
            round_name: payload.round_name.filter(|name| !name.trim().is_empty()),
            held_on,
        })
        .await
        .map_err(|e| map_engine_error(e, "Failed to save round"))?;

    Ok((StatusCode::CREATED, Json(RoundResponse::from_db(round))))
}

pub(super) async fn round_material(
    Path((class_name, round)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<MaterialResponse>, ApiError> {
    let class_name = validate_class_name(&class_name)?;
    let round_number = parse_round_number(&round)?;
    let material = notes::resolve_material(state.store(), &class_name, round_number)
        .await
        .map_err(|e| map_engine_error(e, "Failed to resolve material"))?;
    Ok(Json(MaterialResponse::from_db(material)))
}

pub(super) async fn list_scores(
    Path((class_name, round)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ScoreRecordResponse>>, ApiError> {
    let class_name = validate_class_name(&class_name)?;
    let round_number = parse_round_number(&round)?;
    let records = state
        .store()
        .scores_for_round(&class_name, round_number)
        .await
        .map_err(|e| map_engine_error(e, "Failed to list scores"))?;
    Ok(Json(records.into_iter().map(ScoreRecordResponse::from_db).collect()))
}

pub(super) async fn save_score(
    Path((class_name, round)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(payload): Json<ScoreSave>,
) -> Result<Json<ScoreRecordResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let class_name = validate_class_name(&class_name)?;
    let round_number = parse_round_number(&round)?;
    let student_id = payload.student_id.trim().to_string();
    if student_id.is_empty() {
        return Err(ApiError::BadRequest("student_id must not be empty".to_string()));
    }

    let mode = state.settings().scores().consistency;
    let saved = notes::save_score(
        state.store(),
        mode,
        ScoreInput {
            class_name,
            round_number,
            student_id,
            student_name: payload.student_name,
            test_score: payload.test_score,
            total_questions: payload.total_questions,
            wrong_questions: payload.wrong_questions,
            assignment1: payload.assignment1,
            assignment2: payload.assignment2,
            memo: payload.memo,
        },
    )
    .await
    .map_err(|e| map_engine_error(e, "Failed to save score"))?;

    Ok(Json(ScoreRecordResponse::from_db(saved)))
}

pub(super) async fn round_summary(
    Path((class_name, round)): Path<(String, String)>,
    Query(query): Query<SummaryQuery>,
    State(state): State<AppState>,
) -> Result<Json<ScoreSummaryResponse>, ApiError> {
    let class_name = validate_class_name(&class_name)?;
    let round_number = parse_round_number(&round)?;
    let session = EntrySession::with_total_questions(query.remembered_total_questions);

    let report = notes::summarize_round(state.store(), &class_name, round_number, &session)
        .await
        .map_err(|e| map_engine_error(e, "Failed to summarize round"))?;
    Ok(Json(ScoreSummaryResponse::new(report.round, report.summary)))
}
