use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::ScoreRecord;
use crate::db::types::AssignmentGrade;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ScoreSave {
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, max = 100, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[serde(default, alias = "studentName")]
    #[validate(length(max = 200, message = "student_name is too long"))]
    pub(crate) student_name: Option<String>,
    #[serde(default, alias = "testScore")]
    #[validate(range(min = 0, message = "test_score must be non-negative"))]
    pub(crate) test_score: Option<i32>,
    #[serde(default, alias = "totalQuestions", alias = "total_question")]
    #[validate(range(min = 0, message = "total_questions must be non-negative"))]
    pub(crate) total_questions: Option<i32>,
    #[serde(default, alias = "wrongQuestions")]
    pub(crate) wrong_questions: String,
    pub(crate) assignment1: AssignmentGrade,
    pub(crate) assignment2: AssignmentGrade,
    #[serde(default)]
    pub(crate) memo: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreRecordResponse {
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
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ScoreRecordResponse {
    pub(crate) fn from_db(record: ScoreRecord) -> Self {
        Self {
            class_name: record.class_name,
            round_number: record.round_number,
            student_id: record.student_id,
            student_name: record.student_name,
            test_score: record.test_score,
            total_questions: record.total_questions,
            wrong_questions: record.wrong_questions,
            assignment1: record.assignment1,
            assignment2: record.assignment2,
            memo: record.memo,
            created_at: format_primitive(record.created_at),
            updated_at: format_primitive(record.updated_at),
        }
    }
}
