//! Answer matching.
//!
//! Speech recognition returns free-form text that may differ from the
//! canonical label in case, padding, or accent-driven spelling. The matcher
//! maps that text back to a label using the accepted synonym sets.

use crate::item::{normalize, Label, QuizItem, Vocabulary};

/// Resolves captured answers to canonical labels.
///
/// Stateless: every method is a pure function of its inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerMatcher;

impl AnswerMatcher {
    /// Creates a matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Matches captured text against a single item.
    ///
    /// Returns the item's label when the normalized text equals the label or
    /// one of its accepted synonyms, `None` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizbot_engine::{AnswerMatcher, QuizItem};
    ///
    /// let item = QuizItem::new("D", "d.mp3", ["dee"]);
    /// let matcher = AnswerMatcher::new();
    ///
    /// assert_eq!(matcher.match_answer(" DEE ", &item).map(|l| l.to_string()), Some("D".into()));
    /// assert_eq!(matcher.match_answer("see", &item), None);
    /// ```
    #[must_use]
    pub fn match_answer(&self, captured: &str, item: &QuizItem) -> Option<Label> {
        let normalized = normalize(captured);
        item.accepts(&normalized).then(|| item.label().clone())
    }

    /// Resolves captured text against every label of a vocabulary.
    ///
    /// Labels are tried in label order, so when two labels share a synonym
    /// the first one wins.
    #[must_use]
    pub fn resolve(&self, captured: &str, vocabulary: &Vocabulary) -> Option<Label> {
        let normalized = normalize(captured);
        if normalized.is_empty() {
            return None;
        }
        vocabulary
            .iter()
            .find(|(_, synonyms)| synonyms.contains(&normalized))
            .map(|(label, _)| label.clone())
    }
}
