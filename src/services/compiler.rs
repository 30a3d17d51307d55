use sha2::{Digest, Sha256};

use crate::services::regions::{Rect, Region};
use crate::services::wrong_list::WrongQuestionSet;

/// A question's location, resolved and ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtractDescriptor {
    pub(crate) question_number: u32,
    pub(crate) material_id: String,
    pub(crate) page_number: u32,
    pub(crate) rect: Rect,
}

/// Joins a material's regions with a student's wrong questions.
///
/// Output is ordered by question number, not page. Wrong questions without a
/// drawn region are left out; empty inputs yield an empty list.
pub(crate) fn compile(
    material_id: &str,
    regions: &[Region],
    wrong: &WrongQuestionSet,
) -> Vec<ExtractDescriptor> {
    if wrong.is_empty() {
        return Vec::new();
    }

    let mut extracts: Vec<ExtractDescriptor> = regions
        .iter()
        .filter(|region| wrong.contains(region.question_number))
        .map(|region| ExtractDescriptor {
            question_number: region.question_number,
            material_id: material_id.to_string(),
            page_number: region.page_number,
            rect: region.rect,
        })
        .collect();
    extracts.sort_by_key(|extract| extract.question_number);
    extracts.dedup_by_key(|extract| extract.question_number);
    extracts
}

/// Stable cache key for one compile result.
///
/// The region revision changes on every save, so a key is never reused for a
/// different region set.
pub(crate) fn extract_etag(material_id: &str, revision: i64, wrong: &WrongQuestionSet) -> String {
    let mut hasher = Sha256::new();
    hasher.update(material_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(revision.to_be_bytes());
    hasher.update(b"\n");
    hasher.update(wrong.to_free_text().as_bytes());
    hex::encode(hasher.finalize())
}
