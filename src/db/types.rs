use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Qualitative grade for a homework assignment attached to a score record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "assignmentgrade", rename_all = "snake_case")]
pub(crate) enum AssignmentGrade {
    A,
    B,
    C,
    D,
    F,
    /// Failing because nothing was handed in.
    #[serde(alias = "F(미제출)")]
    FMissing,
}
