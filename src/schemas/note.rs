use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::compiler::ExtractDescriptor;
use crate::services::notes::CompiledNote;
use crate::services::rendering::{png_data_url, RenderedExtract};
use crate::services::wrong_list::AnswerSheet;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExtractRequest {
    #[serde(default, alias = "wrongQuestions")]
    pub(crate) wrong_questions: String,
    #[serde(default, alias = "totalQuestions")]
    #[validate(range(min = 0, message = "total_questions must be non-negative"))]
    pub(crate) total_questions: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExtractResponse {
    pub(crate) question_number: u32,
    pub(crate) material_id: String,
    pub(crate) page_number: u32,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl ExtractResponse {
    fn from_descriptor(extract: &ExtractDescriptor) -> Self {
        Self {
            question_number: extract.question_number,
            material_id: extract.material_id.clone(),
            page_number: extract.page_number,
            x: extract.rect.x,
            y: extract.rect.y,
            width: extract.rect.width,
            height: extract.rect.height,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CompiledNoteResponse {
    pub(crate) material_id: String,
    pub(crate) file_ref: String,
    pub(crate) regions_revision: i64,
    pub(crate) wrong_questions: String,
    pub(crate) wrong_count: usize,
    pub(crate) extracts: Vec<ExtractResponse>,
}

impl CompiledNoteResponse {
    pub(crate) fn from_note(note: &CompiledNote) -> Self {
        Self {
            material_id: note.material.id.clone(),
            file_ref: note.material.file_ref.clone(),
            regions_revision: note.revision,
            wrong_questions: note.wrong.to_free_text(),
            wrong_count: note.wrong.len(),
            extracts: note.extracts.iter().map(ExtractResponse::from_descriptor).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NoteImage {
    pub(crate) question_number: u32,
    pub(crate) page_number: u32,
    pub(crate) image_data: String,
}

impl NoteImage {
    pub(crate) fn from_rendered(rendered: &RenderedExtract) -> Self {
        Self {
            question_number: rendered.question_number,
            page_number: rendered.page_number,
            image_data: png_data_url(&rendered.png),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NoteImagesResponse {
    pub(crate) material_id: String,
    pub(crate) student_id: String,
    pub(crate) images: Vec<NoteImage>,
    pub(crate) skipped_questions: Vec<u32>,
}

/// Either the text or the checklist view of a wrong list.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NormalizeRequest {
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default, alias = "checkState")]
    #[validate(length(max = 1000, message = "check_state is too long"))]
    pub(crate) check_state: Option<Vec<bool>>,
    #[serde(default, alias = "totalQuestions")]
    #[validate(range(min = 0, max = 1000, message = "total_questions must be between 0 and 1000"))]
    pub(crate) total_questions: Option<u32>,
    /// Resizes the checklist; numbers past the new total are dropped.
    #[serde(default, alias = "newTotalQuestions")]
    #[validate(range(max = 1000, message = "new_total_questions must be at most 1000"))]
    pub(crate) new_total_questions: Option<u32>,
    /// Applied before `toggle`.
    #[serde(default, alias = "checkAll")]
    pub(crate) check_all: Option<bool>,
    #[serde(default)]
    pub(crate) toggle: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NormalizeResponse {
    pub(crate) wrong_questions: Vec<u32>,
    pub(crate) text: String,
    pub(crate) check_state: Vec<bool>,
    pub(crate) wrong_count: usize,
    pub(crate) derived_score: Option<u32>,
}

impl NormalizeResponse {
    pub(crate) fn from_sheet(sheet: &AnswerSheet) -> Self {
        Self {
            wrong_questions: sheet.wrong().iter().collect(),
            text: sheet.text(),
            check_state: sheet.check_state(),
            wrong_count: sheet.wrong().len(),
            derived_score: sheet.derived_score(),
        }
    }
}
