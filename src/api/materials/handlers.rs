use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::{map_engine_error, ApiError};
use crate::api::validation::{parse_question_number, validate_class_name};
use crate::core::state::AppState;
use crate::schemas::material::{
    MaterialCreate, MaterialDetailResponse, MaterialResponse, RegionPayload, RegionSetResponse,
    RegionsReplace,
};
use crate::services::notes;
use crate::services::store::NewMaterial;

pub(super) async fn register_material(
    State(state): State<AppState>,
    Json(payload): Json<MaterialCreate>,
) -> Result<(StatusCode, Json<MaterialResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let class_name = validate_class_name(&payload.class_name)?;

    let material = state
        .store()
        .register_material(NewMaterial {
            class_name,
            round_number: payload.round_number,
            title: payload.title.filter(|title| !title.trim().is_empty()),
            page_count: payload.page_count,
            file_ref: payload.file_ref.trim().to_string(),
        })
        .await
        .map_err(|e| map_engine_error(e, "Failed to register material"))?;

    tracing::info!(
        material_id = %material.id,
        class_name = %material.class_name,
        round_number = material.round_number,
        page_count = material.page_count,
        "Material registered"
    );

    Ok((StatusCode::CREATED, Json(MaterialResponse::from_db(material))))
}

pub(super) async fn get_material(
    Path(material_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MaterialDetailResponse>, ApiError> {
    let store = state.store();
    let material = store
        .material(&material_id)
        .await
        .map_err(|e| map_engine_error(e, "Failed to fetch material"))?;
    let set = store
        .regions(&material_id)
        .await
        .map_err(|e| map_engine_error(e, "Failed to fetch regions"))?;

    let mut material = MaterialResponse::from_db(material);
    material.regions_revision = set.revision;
    Ok(Json(MaterialDetailResponse {
        material,
        regions: set.regions.iter().map(RegionPayload::from_region).collect(),
    }))
}

pub(super) async fn delete_material(
    Path(material_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .store()
        .delete_material(&material_id)
        .await
        .map_err(|e| map_engine_error(e, "Failed to delete material"))?;

    tracing::info!(material_id = %material_id, "Material deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn get_regions(
    Path(material_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RegionSetResponse>, ApiError> {
    let set = state
        .store()
        .regions(&material_id)
        .await
        .map_err(|e| map_engine_error(e, "Failed to fetch regions"))?;
    Ok(Json(RegionSetResponse::from_set(&material_id, &set)))
}

pub(super) async fn save_regions(
    Path(material_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<RegionsReplace>,
) -> Result<Json<RegionSetResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let regions = payload.regions.into_iter().map(RegionPayload::into_region).collect();
    let set = notes::save_regions(state.store(), &material_id, regions)
        .await
        .map_err(|e| map_engine_error(e, "Failed to save regions"))?;
    Ok(Json(RegionSetResponse::from_set(&material_id, &set)))
}

pub(super) async fn remove_region(
    Path((material_id, question_number)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<RegionSetResponse>, ApiError> {
    let question_number = parse_question_number(&question_number)?;
    let set = state
        .store()
        .remove_region(&material_id, question_number)
        .await
        .map_err(|e| map_engine_error(e, "Failed to remove region"))?;

    tracing::info!(
        material_id = %material_id,
        question_number,
        revision = set.revision,
        "Region removed"
    );
    Ok(Json(RegionSetResponse::from_set(&material_id, &set)))
}
