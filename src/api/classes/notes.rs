use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use validator::Validate;

use crate::api::caching::{matches_if_none_match, not_modified, put_cache_headers, quoted_etag};
use crate::api::errors::{map_engine_error, ApiError};
use crate::api::validation::{parse_round_number, validate_class_name};
use crate::core::state::AppState;
use crate::schemas::note::{CompiledNoteResponse, ExtractRequest, NoteImage, NoteImagesResponse};
use crate::services::notes::{self, known_total, CompiledNote};
use crate::services::rendering::render_extracts;

fn note_response(headers: &HeaderMap, note: &CompiledNote) -> Response {
    let etag = quoted_etag(&note.etag);
    if matches_if_none_match(headers, &etag) {
        return not_modified(&etag);
    }

    let mut response = Json(CompiledNoteResponse::from_note(note)).into_response();
    put_cache_headers(response.headers_mut(), &etag);
    response
}

pub(super) async fn compile_extracts(
    Path((class_name, round)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ExtractRequest>,
) -> Result<Response, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let class_name = validate_class_name(&class_name)?;
    let round_number = parse_round_number(&round)?;

    let note = notes::compile_extracts(
        state.store(),
        &class_name,
        round_number,
        &payload.wrong_questions,
        known_total(payload.total_questions),
    )
    .await
    .map_err(|e| map_engine_error(e, "Failed to compile extracts"))?;

    Ok(note_response(&headers, &note))
}

pub(super) async fn student_extracts(
    Path((class_name, round, student_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let class_name = validate_class_name(&class_name)?;
    let round_number = parse_round_number(&round)?;
    let student_id = student_id.trim();

    let note =
        notes::compile_extracts_for_student(state.store(), &class_name, round_number, student_id)
            .await
            .map_err(|e| map_engine_error(e, "Failed to compile extracts"))?;

    Ok(note_response(&headers, &note))
}

pub(super) async fn student_note_images(
    Path((class_name, round, student_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<NoteImagesResponse>, ApiError> {
    let class_name = validate_class_name(&class_name)?;
    let round_number = parse_round_number(&round)?;
    let student_id = student_id.trim().to_string();
    let renderer = state.renderer().ok_or_else(|| {
        ApiError::ServiceUnavailable("Page rendering is not configured".to_string())
    })?;

    let note =
        notes::compile_extracts_for_student(state.store(), &class_name, round_number, &student_id)
            .await
            .map_err(|e| map_engine_error(e, "Failed to compile extracts"))?;
    let (rendered, skipped_questions) =
        render_extracts(renderer, &note.material, &note.extracts).await;

    Ok(Json(NoteImagesResponse {
        material_id: note.material.id.clone(),
        student_id,
        images: rendered.iter().map(NoteImage::from_rendered).collect(),
        skipped_questions,
    }))
}
