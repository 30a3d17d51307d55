use thiserror::Error;

use crate::services::wrong_list::WrongQuestionSet;

/// How a saved test score relates to the wrong-question count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScoreConsistency {
    /// Store whatever the grader entered.
    Permissive,
    /// Reject a score that disagrees with `total - wrong`.
    Strict,
    /// Overwrite the score with `total - wrong` whenever the total is known.
    Derive,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("test score {score} does not match {total} questions minus {wrong} wrong answers")]
pub(crate) struct ScoreMismatch {
    pub(crate) score: i32,
    pub(crate) total: i32,
    pub(crate) wrong: usize,
}

impl ScoreConsistency {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            "derive" | "derived" => Some(Self::Derive),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Strict => "strict",
            Self::Derive => "derive",
        }
    }

    /// Returns the score to persist.
    pub(crate) fn apply(
        self,
        score: Option<i32>,
        total_questions: Option<i32>,
        wrong: &WrongQuestionSet,
    ) -> Result<Option<i32>, ScoreMismatch> {
        let expected = total_questions.map(|total| expected_score(total, wrong));
        match (self, score, expected) {
            (Self::Permissive, _, _) => Ok(score),
            (Self::Strict, Some(score), Some(expected)) if score != expected => {
                Err(ScoreMismatch {
                    score,
                    total: total_questions.unwrap_or_default(),
                    wrong: wrong.len(),
                })
            }
            (Self::Strict, _, _) => Ok(score),
            (Self::Derive, _, Some(expected)) => Ok(Some(expected)),
            (Self::Derive, _, None) => Ok(score),
        }
    }
}

fn expected_score(total: i32, wrong: &WrongQuestionSet) -> i32 {
    let wrong = i32::try_from(wrong.len()).unwrap_or(i32::MAX);
    total.saturating_sub(wrong).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrong(numbers: &[u32]) -> WrongQuestionSet {
        WrongQuestionSet::from_numbers(numbers.iter().copied(), None)
    }

    #[test]
    fn permissive_keeps_inconsistent_scores() {
        let result = ScoreConsistency::Permissive.apply(Some(95), Some(20), &wrong(&[1, 2]));
        assert_eq!(result, Ok(Some(95)));
    }

    #[test]
    fn strict_rejects_mismatch_and_accepts_match() {
        let err = ScoreConsistency::Strict.apply(Some(19), Some(20), &wrong(&[1, 2])).unwrap_err();
        assert_eq!(err, ScoreMismatch { score: 19, total: 20, wrong: 2 });

        assert_eq!(ScoreConsistency::Strict.apply(Some(18), Some(20), &wrong(&[1, 2])), Ok(Some(18)));
        assert_eq!(ScoreConsistency::Strict.apply(Some(7), None, &wrong(&[1])), Ok(Some(7)));
        assert_eq!(ScoreConsistency::Strict.apply(None, Some(20), &wrong(&[1])), Ok(None));
    }

    #[test]
    fn derive_recomputes_and_floors_at_zero() {
        assert_eq!(ScoreConsistency::Derive.apply(None, Some(10), &wrong(&[2, 4, 6])), Ok(Some(7)));
        assert_eq!(ScoreConsistency::Derive.apply(Some(99), Some(2), &wrong(&[1, 2, 3])), Ok(Some(0)));
        assert_eq!(ScoreConsistency::Derive.apply(Some(5), None, &wrong(&[1])), Ok(Some(5)));
    }

    #[test]
    fn parse_accepts_known_modes() {
        assert_eq!(ScoreConsistency::parse(" Strict "), Some(ScoreConsistency::Strict));
        assert_eq!(ScoreConsistency::parse("derived"), Some(ScoreConsistency::Derive));
        assert_eq!(ScoreConsistency::parse("other"), None);
        assert_eq!(ScoreConsistency::Derive.as_str(), "derive");
    }
}
