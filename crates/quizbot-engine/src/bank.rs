//! Question bank and round plans.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::error::{QuizError, Result};
use crate::item::{normalize, Label, QuizItem, Vocabulary};

/// The pool of quiz items for a session.
///
/// Items keep their configured order, which is the order used when the
/// content is showcased.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    items: Vec<QuizItem>,
    vocabulary: Vocabulary,
    markers: BTreeMap<u32, Label>,
}

impl QuestionBank {
    /// Creates a bank from a list of items.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ConfigValidationError` if `items` is empty and
    /// `QuizError::DuplicateLabel` if two items share a label (ignoring case).
    /// Two items sharing a marker ID is a `QuizError::ConfigValidationError`.
    pub fn new(items: Vec<QuizItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(QuizError::config_validation(
                "the question bank has no items",
                "Add at least one entry to 'items' in your quizbot.json",
            ));
        }

        let mut seen = HashSet::new();
        let mut markers = BTreeMap::new();
        for item in &items {
            if !seen.insert(normalize(item.label().as_str())) {
                return Err(QuizError::duplicate_label(item.label().as_str()));
            }
            if let Some(marker) = item.marker() {
                if let Some(other) = markers.insert(marker, item.label().clone()) {
                    return Err(QuizError::config_validation(
                        format!(
                            "marker {marker} is used by both '{other}' and '{}'",
                            item.label()
                        ),
                        "Give every answer card its own marker ID",
                    ));
                }
            }
        }

        let vocabulary = Vocabulary::from_items(&items);
        Ok(Self {
            items,
            vocabulary,
            markers,
        })
    }

    /// Returns the items in configured order.
    #[must_use]
    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    /// Returns the number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the bank holds no items. Never true for a bank built with [`QuestionBank::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the vocabulary covering every item.
    #[must_use]
    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Returns the labels in configured order.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.items.iter().map(QuizItem::label)
    }

    /// Draws `n` distinct items in uniformly random order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InsufficientItems` if `n` exceeds the number of
    /// items. Items are never repeated to make up the difference.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizbot_engine::{QuestionBank, QuizItem};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let bank = QuestionBank::new(vec![
    ///     QuizItem::new("A", "a.mp3", ["ay"]),
    ///     QuizItem::new("C", "c.mp3", ["see"]),
    /// ])
    /// .unwrap();
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// assert_eq!(bank.draw(2, &mut rng).unwrap().len(), 2);
    /// assert!(bank.draw(3, &mut rng).is_err());
    /// ```
    pub fn draw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<RoundPlan> {
        if n > self.items.len() {
            return Err(QuizError::insufficient_items(n, self.items.len()));
        }

        let mut order: Vec<&QuizItem> = self.items.iter().collect();
        order.shuffle(rng);
        order.truncate(n);

        tracing::debug!(
            drawn = ?order.iter().map(|item| item.label().as_str()).collect::<Vec<_>>(),
            "Drew round plan"
        );

        Ok(RoundPlan {
            items: order.into_iter().cloned().collect(),
            vocabulary: self.vocabulary.clone(),
            markers: self.markers.clone(),
        })
    }
}

/// The ordered questions for one round.
///
/// Carries the bank vocabulary and marker table so any valid label can be
/// heard or seen, which lets a wrong answer be told apart from an
/// unrecognized one.
#[derive(Debug, Clone, Serialize)]
pub struct RoundPlan {
    items: Vec<QuizItem>,
    vocabulary: Vocabulary,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    markers: BTreeMap<u32, Label>,
}

impl RoundPlan {
    /// Returns the items in question order.
    #[must_use]
    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    /// Returns the recognition vocabulary for the round.
    #[must_use]
    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Returns the label whose answer card carries `marker`.
    #[must_use]
    pub fn marker_label(&self, marker: u32) -> Option<&Label> {
        self.markers.get(&marker)
    }

    /// Returns the number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the plan has no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
