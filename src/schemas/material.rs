use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Material;
use crate::services::regions::{Rect, Region, RegionSet};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MaterialCreate {
    #[serde(alias = "className")]
    #[validate(length(min = 1, max = 100, message = "class_name must not be empty"))]
    pub(crate) class_name: String,
    #[serde(alias = "roundNumber")]
    #[validate(range(min = 1, message = "round_number must be positive"))]
    pub(crate) round_number: i32,
    #[serde(default)]
    #[validate(length(max = 300, message = "title is too long"))]
    pub(crate) title: Option<String>,
    #[serde(alias = "pageCount")]
    #[validate(range(min = 1, message = "page_count must be positive"))]
    pub(crate) page_count: i32,
    #[serde(alias = "fileRef")]
    #[validate(length(min = 1, max = 500, message = "file_ref must not be empty"))]
    pub(crate) file_ref: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MaterialResponse {
    pub(crate) id: String,
    pub(crate) class_name: String,
    pub(crate) round_number: i32,
    pub(crate) title: Option<String>,
    pub(crate) page_count: i32,
    pub(crate) file_ref: String,
    pub(crate) is_active: bool,
    pub(crate) regions_revision: i64,
    pub(crate) uploaded_at: String,
    pub(crate) superseded_at: Option<String>,
}

impl MaterialResponse {
    pub(crate) fn from_db(material: Material) -> Self {
        Self {
            id: material.id,
            class_name: material.class_name,
            round_number: material.round_number,
            title: material.title,
            page_count: material.page_count,
            file_ref: material.file_ref,
            is_active: material.is_active,
            regions_revision: material.regions_revision,
            uploaded_at: format_primitive(material.uploaded_at),
            superseded_at: material.superseded_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub(crate) struct RegionPayload {
    #[serde(alias = "questionNumber")]
    #[validate(range(
        min = 1,
        max = 2_147_483_647,
        message = "question_number must be between 1 and 2147483647"
    ))]
    pub(crate) question_number: u32,
    #[serde(alias = "pageNumber")]
    #[validate(range(min = 1, message = "page_number must be positive"))]
    pub(crate) page_number: u32,
    pub(crate) x: f64,
    pub(crate) y: f64,
    #[validate(range(exclusive_min = 0.0, message = "width must be positive"))]
    pub(crate) width: f64,
    #[validate(range(exclusive_min = 0.0, message = "height must be positive"))]
    pub(crate) height: f64,
}

impl RegionPayload {
    pub(crate) fn from_region(region: &Region) -> Self {
        Self {
            question_number: region.question_number,
            page_number: region.page_number,
            x: region.rect.x,
            y: region.rect.y,
            width: region.rect.width,
            height: region.rect.height,
        }
    }

    pub(crate) fn into_region(self) -> Region {
        Region {
            question_number: self.question_number,
            page_number: self.page_number,
            rect: Rect { x: self.x, y: self.y, width: self.width, height: self.height },
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RegionsReplace {
    #[validate(nested)]
    pub(crate) regions: Vec<RegionPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegionSetResponse {
    pub(crate) material_id: String,
    pub(crate) revision: i64,
    pub(crate) regions: Vec<RegionPayload>,
}

impl RegionSetResponse {
    pub(crate) fn from_set(material_id: &str, set: &RegionSet) -> Self {
        Self {
            material_id: material_id.to_string(),
            revision: set.revision,
            regions: set.regions.iter().map(RegionPayload::from_region).collect(),
        }
    }
}

/// Material plus its regions, as the region editor loads them.
#[derive(Debug, Serialize)]
pub(crate) struct MaterialDetailResponse {
    #[serde(flatten)]
    pub(crate) material: MaterialResponse,
    pub(crate) regions: Vec<RegionPayload>,
}
