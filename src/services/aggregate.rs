use crate::db::models::ScoreRecord;

/// Values an operator carries from one score entry to the next.
///
/// The only remembered value is the last total question count, which fills in
/// the round summary when no stored record specifies one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EntrySession {
    last_total_questions: Option<i32>,
}

impl EntrySession {
    pub(crate) fn with_total_questions(total_questions: Option<i32>) -> Self {
        let mut session = Self::default();
        session.remember(total_questions);
        session
    }

    /// Keeps the latest positive total; other values leave the memory as is.
    pub(crate) fn remember(&mut self, total_questions: Option<i32>) {
        if let Some(total) = total_questions.filter(|total| *total > 0) {
            self.last_total_questions = Some(total);
        }
    }

    pub(crate) fn remembered_total(&self) -> Option<i32> {
        self.last_total_questions
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreSummary {
    pub(crate) average: Option<f64>,
    pub(crate) total_questions: Option<i32>,
    /// Records that carry a score and therefore count toward the average.
    pub(crate) headcount: usize,
    pub(crate) record_count: usize,
}

pub(crate) fn summarize(records: &[ScoreRecord], session: &EntrySession) -> ScoreSummary {
    let scores: Vec<f64> =
        records.iter().filter_map(|record| record.test_score).map(f64::from).collect();
    let average = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    let total_questions = records
        .iter()
        .find_map(|record| record.total_questions)
        .or_else(|| session.remembered_total());

    ScoreSummary { average, total_questions, headcount: scores.len(), record_count: records.len() }
}
