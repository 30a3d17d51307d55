//! Canonical wrong-question sets and the two views operators edit them through:
//! comma separated free text and an OMR-style checklist.

use std::collections::BTreeSet;

/// Checklist length used when the total question count is not known yet.
pub(crate) const DEFAULT_CHECKLIST_LEN: u32 = 50;

/// Deduplicated, ascending set of question numbers a student got wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct WrongQuestionSet(BTreeSet<u32>);

impl WrongQuestionSet {
    /// Parses operator input such as `"3, 7, 12"`.
    ///
    /// Tokens that are not positive integers, or exceed `total_questions` when
    /// it is known, are dropped. A total of zero counts as unknown.
    pub(crate) fn parse_free_text(text: &str, total_questions: Option<u32>) -> Self {
        let numbers = text
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter_map(|token| token.parse::<u32>().ok());
        Self::from_numbers(numbers, total_questions)
    }

    /// Builds a set from arbitrary numbers, applying the same bounds as parsing.
    pub(crate) fn from_numbers(
        numbers: impl IntoIterator<Item = u32>,
        total_questions: Option<u32>,
    ) -> Self {
        let upper = known_total(total_questions).unwrap_or(u32::MAX);
        Self(numbers.into_iter().filter(|number| (1..=upper).contains(number)).collect())
    }

    /// Index `i` of the checklist maps to question `i + 1`.
    pub(crate) fn from_check_state(bits: &[bool]) -> Self {
        Self(
            bits.iter()
                .enumerate()
                .filter(|(_, checked)| **checked)
                .filter_map(|(index, _)| u32::try_from(index + 1).ok())
                .collect(),
        )
    }

    pub(crate) fn to_free_text(&self) -> String {
        self.0.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
    }

    pub(crate) fn to_check_state(&self, total_questions: Option<u32>) -> Vec<bool> {
        (1..=checklist_len(total_questions)).map(|number| self.0.contains(&number)).collect()
    }

    pub(crate) fn contains(&self, question_number: u32) -> bool {
        self.0.contains(&question_number)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    fn restrict_to(&mut self, total_questions: Option<u32>) {
        if let Some(total) = known_total(total_questions) {
            self.0.retain(|number| *number <= total);
        }
    }
}

/// Number of checklist cells to show.
///
/// With an unknown total the sheet stays at the default length; numbers past
/// it remain visible in the text view only.
pub(crate) fn checklist_len(total_questions: Option<u32>) -> u32 {
    known_total(total_questions).unwrap_or(DEFAULT_CHECKLIST_LEN)
}

fn known_total(total_questions: Option<u32>) -> Option<u32> {
    total_questions.filter(|total| *total > 0)
}

/// Editing session over a single wrong-question set.
///
/// Text and checklist are both derived from the one canonical set, so edits
/// through either view can never leave the other stale.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnswerSheet {
    total_questions: Option<u32>,
    wrong: WrongQuestionSet,
}

impl AnswerSheet {
    pub(crate) fn new(total_questions: Option<u32>) -> Self {
        Self { total_questions: known_total(total_questions), wrong: WrongQuestionSet::default() }
    }

    pub(crate) fn from_text(text: &str, total_questions: Option<u32>) -> Self {
        let mut sheet = Self::new(total_questions);
        sheet.set_text(text);
        sheet
    }

    pub(crate) fn from_check_state(bits: &[bool], total_questions: Option<u32>) -> Self {
        let mut sheet = Self::new(total_questions);
        sheet.wrong = WrongQuestionSet::from_check_state(bits);
        sheet.wrong.restrict_to(sheet.total_questions);
        sheet
    }

    pub(crate) fn set_text(&mut self, text: &str) {
        self.wrong = WrongQuestionSet::parse_free_text(text, self.total_questions);
    }

    /// Flips one checklist cell and returns its new state. Numbers outside
    /// the sheet are ignored.
    pub(crate) fn toggle(&mut self, question_number: u32) -> bool {
        let len = checklist_len(self.total_questions);
        if question_number == 0 || question_number > len {
            return false;
        }
        if !self.wrong.0.remove(&question_number) {
            self.wrong.0.insert(question_number);
            return true;
        }
        false
    }

    pub(crate) fn check_all(&mut self, checked: bool) {
        if checked {
            let len = checklist_len(self.total_questions);
            self.wrong = WrongQuestionSet((1..=len).collect());
        } else {
            self.wrong = WrongQuestionSet::default();
        }
    }

    pub(crate) fn set_total_questions(&mut self, total_questions: Option<u32>) {
        self.total_questions = known_total(total_questions);
        self.wrong.restrict_to(self.total_questions);
    }

    pub(crate) fn total_questions(&self) -> Option<u32> {
        self.total_questions
    }

    pub(crate) fn text(&self) -> String {
        self.wrong.to_free_text()
    }

    pub(crate) fn check_state(&self) -> Vec<bool> {
        self.wrong.to_check_state(self.total_questions)
    }

    pub(crate) fn wrong(&self) -> &WrongQuestionSet {
        &self.wrong
    }

    /// Score implied by an objectively graded test, floored at zero.
    pub(crate) fn derived_score(&self) -> Option<u32> {
        let wrong = u32::try_from(self.wrong.len()).unwrap_or(u32::MAX);
        self.total_questions.map(|total| total.saturating_sub(wrong))
    }
}
