use std::collections::BTreeMap;

use thiserror::Error;

/// Largest question number the storage column can hold.
pub(crate) const MAX_QUESTION_NUMBER: u32 = i32::MAX as u32;

/// Axis-aligned rectangle in the coordinate space of a rendered page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rect {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Where a numbered question sits inside a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Region {
    pub(crate) question_number: u32,
    pub(crate) page_number: u32,
    pub(crate) rect: Rect,
}

/// Snapshot of a material's regions, ordered by question number.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RegionSet {
    pub(crate) revision: i64,
    pub(crate) regions: Vec<Region>,
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum RegionValidationError {
    #[error("question number must be positive")]
    NonPositiveQuestion,
    #[error("question {question_number} exceeds the largest allowed number {max}")]
    QuestionTooLarge { question_number: u32, max: u32 },
    #[error("question {question_number} appears more than once")]
    DuplicateQuestion { question_number: u32 },
    #[error("question {question_number}: page {page_number} is outside 1..={page_count}")]
    PageOutOfRange { question_number: u32, page_number: u32, page_count: u32 },
    #[error("question {question_number}: width and height must be positive")]
    NonPositiveSize { question_number: u32 },
    #[error("question {question_number}: coordinates must be finite and non-negative")]
    InvalidOrigin { question_number: u32 },
    #[error("too many regions: {count} exceeds the limit of {limit}")]
    TooMany { count: usize, limit: usize },
}

impl Rect {
    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl Region {
    fn validate(&self, page_count: u32) -> Result<(), RegionValidationError> {
        let question_number = self.question_number;
        if question_number == 0 {
            return Err(RegionValidationError::NonPositiveQuestion);
        }
        if question_number > MAX_QUESTION_NUMBER {
            return Err(RegionValidationError::QuestionTooLarge {
                question_number,
                max: MAX_QUESTION_NUMBER,
            });
        }
        if self.page_number == 0 || self.page_number > page_count {
            return Err(RegionValidationError::PageOutOfRange {
                question_number,
                page_number: self.page_number,
                page_count,
            });
        }
        if !self.rect.is_finite() || self.rect.x < 0.0 || self.rect.y < 0.0 {
            return Err(RegionValidationError::InvalidOrigin { question_number });
        }
        if self.rect.width <= 0.0 || self.rect.height <= 0.0 {
            return Err(RegionValidationError::NonPositiveSize { question_number });
        }
        Ok(())
    }
}

/// Checks a full replacement set and returns it ordered by question number.
///
/// Duplicates are rejected instead of letting the later entry win, so a save
/// never silently drops a rectangle the operator drew.
pub(crate) fn validate_replacement(
    regions: Vec<Region>,
    page_count: u32,
    limit: usize,
) -> Result<Vec<Region>, RegionValidationError> {
    if regions.len() > limit {
        return Err(RegionValidationError::TooMany { count: regions.len(), limit });
    }

    let mut ordered = BTreeMap::new();
    for region in regions {
        region.validate(page_count)?;
        if ordered.insert(region.question_number, region).is_some() {
            return Err(RegionValidationError::DuplicateQuestion {
                question_number: region.question_number,
            });
        }
    }

    Ok(ordered.into_values().collect())
}
