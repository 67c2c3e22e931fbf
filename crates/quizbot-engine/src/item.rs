//! Quiz content types: labels, items, and answer vocabularies.
//!
//! A [`Label`] is the canonical identity of an answer. A [`QuizItem`] pairs a
//! label with the media that prompts it and the spoken variants that count
//! as that label. A [`Vocabulary`] is the label-to-synonyms mapping handed to
//! the actor as a recognition hint set.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalizes captured or configured text for comparison.
///
/// Trims surrounding whitespace and lowercases.
///
/// # Examples
///
/// ```
/// use quizbot_engine::item::normalize;
///
/// assert_eq!(normalize("  Yes "), "yes");
/// assert_eq!(normalize(""), "");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

// ============================================================================
// Label
// ============================================================================

/// Canonical label of a quiz answer (for example the note `"A"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Creates a label from its canonical text. Surrounding whitespace is removed.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self(text.trim().to_string())
    }

    /// Returns the canonical text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

// ============================================================================
// QuizItem
// ============================================================================

/// A single question in the bank.
///
/// Immutable once built. The accepted synonyms are stored normalized and
/// always contain the normalized label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizItem {
    label: Label,
    prompt_media: String,
    accepted_synonyms: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<u32>,
}

impl QuizItem {
    /// Creates a new item.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizbot_engine::item::QuizItem;
    ///
    /// let item = QuizItem::new("C", "https://example.com/c.mp3", ["see", "Sea "]);
    /// assert!(item.accepts("c"));
    /// assert!(item.accepts("sea"));
    /// assert_eq!(item.accepted_synonyms().len(), 3);
    /// ```
    #[must_use]
    pub fn new<I, S>(label: impl Into<Label>, prompt_media: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let label = label.into();
        let accepted_synonyms = normalized_set(&label, synonyms);
        Self {
            label,
            prompt_media: prompt_media.into(),
            accepted_synonyms,
            marker: None,
        }
    }

    /// Sets the ID of the answer card that names this item.
    #[must_use]
    pub const fn with_marker(mut self, marker: u32) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Returns the canonical label.
    #[must_use]
    pub const fn label(&self) -> &Label {
        &self.label
    }

    /// Returns the media reference that prompts this item.
    #[must_use]
    pub fn prompt_media(&self) -> &str {
        &self.prompt_media
    }

    /// Returns the normalized accepted synonyms, including the label.
    #[must_use]
    pub const fn accepted_synonyms(&self) -> &BTreeSet<String> {
        &self.accepted_synonyms
    }

    /// Returns the answer card marker ID, if the item has one.
    #[must_use]
    pub const fn marker(&self) -> Option<u32> {
        self.marker
    }

    /// Returns `true` if the already-normalized text names this item.
    #[must_use]
    pub fn accepts(&self, normalized: &str) -> bool {
        self.accepted_synonyms.contains(normalized)
    }
}

fn normalized_set<I, S>(label: &Label, synonyms: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set: BTreeSet<String> = synonyms
        .into_iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();
    set.insert(normalize(label.as_str()));
    set
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Mapping of label to the set of accepted synonyms.
///
/// Passed through to the actor unchanged so its recognizer can constrain
/// what it listens for. Iteration is in label order. Deserializing goes
/// through [`Vocabulary::with_entry`], so loaded synonyms are normalized too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Vocabulary {
    entries: BTreeMap<Label, BTreeSet<String>>,
}

impl Vocabulary {
    /// Creates an empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the vocabulary covering every given item.
    #[must_use]
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a QuizItem>) -> Self {
        let entries = items
            .into_iter()
            .map(|item| (item.label.clone(), item.accepted_synonyms.clone()))
            .collect();
        Self { entries }
    }

    /// Adds (or replaces) a label and its synonyms.
    ///
    /// Synonyms are normalized and the label itself is always accepted.
    #[must_use]
    pub fn with_entry<I, S>(mut self, label: impl Into<Label>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let label = label.into();
        let set = normalized_set(&label, synonyms);
        self.entries.insert(label, set);
        self
    }

    /// Returns the synonyms accepted for a label.
    #[must_use]
    pub fn get(&self, label: &Label) -> Option<&BTreeSet<String>> {
        self.entries.get(label)
    }

    /// Iterates over `(label, synonyms)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&Label, &BTreeSet<String>)> {
        self.entries.iter()
    }

    /// Iterates over the labels in label order.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.entries.keys()
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no labels are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for Vocabulary {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Vec<String>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .fold(Self::new(), |vocabulary, (label, synonyms)| {
                vocabulary.with_entry(Label::new(label), synonyms)
            }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::matcher::AnswerMatcher;

    #[test]
    fn test_label_trims_and_displays() {
        let label = Label::new("  G ");
        assert_eq!(label.as_str(), "G");
        assert_eq!(label.to_string(), "G");
    }

    #[test]
    fn test_item_always_accepts_own_label() {
        let item = QuizItem::new("E", "e.mp3", Vec::<String>::new());
        assert_eq!(item.accepted_synonyms().len(), 1);
        assert!(item.accepts("e"));
        assert!(!item.accepts("E"), "accepts() expects normalized input");
    }

    #[test]
    fn test_item_drops_blank_synonyms() {
        let item = QuizItem::new("D", "d.mp3", ["", "   ", "Dee"]);
        let synonyms: Vec<&str> = item.accepted_synonyms().iter().map(String::as_str).collect();
        assert_eq!(synonyms, vec!["d", "dee"]);
    }

    #[test]
    fn test_vocabulary_from_items_is_label_ordered() {
        let items = [
            QuizItem::new("G", "g.mp3", ["gee"]),
            QuizItem::new("A", "a.mp3", ["ay"]),
        ];
        let vocabulary = Vocabulary::from_items(&items);
        let labels: Vec<&str> = vocabulary.labels().map(Label::as_str).collect();
        assert_eq!(labels, vec!["A", "G"]);
        assert!(vocabulary.get(&Label::new("G")).unwrap().contains("gee"));
    }

    #[test]
    fn test_vocabulary_serializes_as_map() {
        let vocabulary = Vocabulary::new()
            .with_entry("Yes", ["ja"])
            .with_entry("No", ["nee"]);
        let json = serde_json::to_string(&vocabulary).unwrap();
        assert_eq!(json, r#"{"No":["nee","no"],"Yes":["ja","yes"]}"#);
    }

    #[test]
    fn test_vocabulary_deserialize_normalizes_synonyms() {
        let vocabulary: Vocabulary =
            serde_json::from_str(r#"{" Yes ":["YES", " Ja", ""],"No":[]}"#).unwrap();

        let yes = vocabulary.get(&Label::new("Yes")).unwrap();
        let synonyms: Vec<&str> = yes.iter().map(String::as_str).collect();
        assert_eq!(synonyms, vec!["ja", "yes"]);
        assert!(vocabulary.get(&Label::new("No")).unwrap().contains("no"));
        assert_eq!(
            AnswerMatcher::new().resolve("yes", &vocabulary),
            Some(Label::new("Yes"))
        );
        assert_eq!(
            vocabulary,
            Vocabulary::new()
                .with_entry("Yes", ["ja"])
                .with_entry("No", Vec::<String>::new())
        );
    }
}
