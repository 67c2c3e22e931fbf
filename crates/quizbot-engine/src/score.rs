//! Answer outcomes and score tracking.

use serde::{Deserialize, Serialize};

use crate::item::Label;

/// Default fraction of correct answers needed for the celebratory reaction.
pub const DEFAULT_SUCCESS_BAR: f64 = 0.5;

/// The result of a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    /// The label the question was about.
    pub expected_label: Label,
    /// The label the answer resolved to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_label: Option<Label>,
    /// Whether the answer named the expected label.
    pub is_correct: bool,
}

impl AnswerOutcome {
    /// Builds an outcome, deriving correctness from the two labels.
    #[must_use]
    pub fn new(expected_label: Label, matched_label: Option<Label>) -> Self {
        let is_correct = matched_label.as_ref() == Some(&expected_label);
        Self {
            expected_label,
            matched_label,
            is_correct,
        }
    }
}

/// Snapshot of the running score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    /// Number of correct answers.
    pub correct: u32,
    /// Number of questions answered.
    pub total: u32,
}

/// Accumulates outcomes across one or more rounds.
#[derive(Debug, Clone, Default)]
pub struct ScoreTracker {
    state: ScoreState,
}

impl ScoreTracker {
    /// Creates a tracker with both counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one outcome.
    pub fn record(&mut self, outcome: &AnswerOutcome) {
        self.state.total = self.state.total.saturating_add(1);
        if outcome.is_correct {
            self.state.correct = self.state.correct.saturating_add(1);
        }
    }

    /// Returns the number of correct answers.
    #[must_use]
    pub const fn correct_count(&self) -> u32 {
        self.state.correct
    }

    /// Returns the number of recorded answers.
    #[must_use]
    pub const fn total_count(&self) -> u32 {
        self.state.total
    }

    /// Returns the fraction of correct answers in `[0, 1]`, or `0` before any answer.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizbot_engine::ScoreTracker;
    ///
    /// let tracker = ScoreTracker::new();
    /// assert_eq!(tracker.percentage(), 0.0);
    /// ```
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.state.total == 0 {
            return 0.0;
        }
        f64::from(self.state.correct) / f64::from(self.state.total)
    }

    /// Returns `true` if the correct fraction reaches `ratio`.
    #[must_use]
    pub fn meets_bar(&self, ratio: f64) -> bool {
        self.percentage() >= ratio
    }

    /// Clears both counters.
    pub fn reset(&mut self) {
        self.state = ScoreState::default();
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub const fn state(&self) -> ScoreState {
        self.state
    }
}
