//! Configuration types for the Quizbot engine.
//!
//! This module provides all configuration structures used to control a
//! quiz session: round count, replay scoring policy, the success bar,
//! choreography timing and behavior names, every spoken phrase, and the
//! quiz content itself.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bank::QuestionBank;
use crate::error::{QuizError, Result};
use crate::item::{normalize, Label, QuizItem, Vocabulary};
use crate::score::DEFAULT_SUCCESS_BAR;

/// The default config file name.
const CONFIG_FILE_NAME: &str = "quizbot.json";

/// Label of the affirmative answer at the consent and replay gates.
pub const YES_LABEL: &str = "Yes";

/// Label of the negative answer at the consent and replay gates.
pub const NO_LABEL: &str = "No";

/// Default number of questions per round.
const fn default_rounds() -> usize {
    5
}

const fn default_success_bar() -> f64 {
    DEFAULT_SUCCESS_BAR
}

/// Default value for boolean options that default to true.
const fn default_true() -> bool {
    true
}

fn default_yes_answers() -> Vec<String> {
    to_strings(&["yes", "jes", "yus", "ja"])
}

fn default_no_answers() -> Vec<String> {
    to_strings(&["no", "nee", "nay"])
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Main configuration for a quiz session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    /// Number of questions per round.
    #[serde(default = "default_rounds")]
    pub rounds: usize,

    /// Whether the score carries over into a replay.
    #[serde(default)]
    pub score_policy: ScorePolicy,

    /// Fraction of correct answers that earns the celebratory reaction.
    #[serde(default = "default_success_bar")]
    pub success_bar: f64,

    /// Whether every item is played once before the first round.
    #[serde(default = "default_true")]
    pub showcase: bool,

    /// Maximum number of replays offered. Unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replays: Option<u32>,

    /// Choreography pauses.
    #[serde(default)]
    pub timing: Timing,

    /// Symbolic behavior names.
    #[serde(default)]
    pub behaviors: Behaviors,

    /// Feedback audio cues.
    #[serde(default)]
    pub cues: Cues,

    /// Spoken lines.
    #[serde(default)]
    pub phrases: Phrases,

    /// Accepted variants of "yes" at the consent and replay gates.
    #[serde(default = "default_yes_answers")]
    pub yes_answers: Vec<String>,

    /// Accepted variants of "no" at the consent and replay gates.
    #[serde(default = "default_no_answers")]
    pub no_answers: Vec<String>,

    /// The quiz content.
    #[serde(default = "ItemConfig::guitar_notes")]
    pub items: Vec<ItemConfig>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            score_policy: ScorePolicy::default(),
            success_bar: default_success_bar(),
            showcase: default_true(),
            max_replays: None,
            timing: Timing::default(),
            behaviors: Behaviors::default(),
            cues: Cues::default(),
            phrases: Phrases::default(),
            yes_answers: default_yes_answers(),
            no_answers: default_no_answers(),
            items: ItemConfig::guitar_notes(),
        }
    }
}

impl QuizConfig {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `quizbot.json` in the current directory. If found, loads and
    /// validates the configuration. If not found, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            QuizError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ConfigParseError` if the file exists but contains
    /// invalid JSON or invalid enum values, and any error from [`QuizConfig::validate`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(QuizError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| QuizError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ConfigValidationError` for out-of-range values,
    /// `QuizError::DuplicateLabel` for repeated labels, and
    /// `QuizError::InsufficientItems` when `rounds` exceeds the item count.
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(QuizError::config_validation(
                "rounds must be greater than 0",
                "Set rounds to at least 1 in your quizbot.json",
            ));
        }

        if !(0.0..=1.0).contains(&self.success_bar) {
            return Err(QuizError::config_validation(
                format!("successBar must be between 0 and 1, got {}", self.success_bar),
                "Set successBar to a fraction such as 0.5 in your quizbot.json",
            ));
        }

        self.timing.validate()?;

        if self.yes_answers.iter().all(|s| s.trim().is_empty())
            || self.no_answers.iter().all(|s| s.trim().is_empty())
        {
            return Err(QuizError::config_validation(
                "yesAnswers and noAnswers must each contain at least one answer",
                "List the spoken variants of yes and no in your quizbot.json",
            ));
        }

        // The gate labels are accepted answers too.
        let yes: HashSet<String> = self
            .yes_answers
            .iter()
            .map(String::as_str)
            .chain([YES_LABEL])
            .map(normalize)
            .collect();
        if let Some(word) = self
            .no_answers
            .iter()
            .map(String::as_str)
            .chain([NO_LABEL])
            .map(normalize)
            .find(|word| !word.is_empty() && yes.contains(word))
        {
            return Err(QuizError::config_validation(
                format!("'{word}' is listed in both yesAnswers and noAnswers"),
                "Keep each spoken answer in only one of yesAnswers and noAnswers",
            ));
        }

        if self.items.is_empty() {
            return Err(QuizError::config_validation(
                "items must not be empty",
                "Add at least one quiz item to your quizbot.json",
            ));
        }

        let mut seen = HashSet::new();
        let mut markers = HashSet::new();
        for item in &self.items {
            if item.label.trim().is_empty() {
                return Err(QuizError::config_validation(
                    "item label must not be empty",
                    "Give every entry in 'items' a label",
                ));
            }
            if item.media.trim().is_empty() {
                return Err(QuizError::config_validation(
                    format!("item '{}' has no media", item.label),
                    "Set 'media' to the audio reference that prompts the item",
                ));
            }
            if !seen.insert(normalize(&item.label)) {
                return Err(QuizError::duplicate_label(item.label.trim()));
            }
            if let Some(marker) = item.marker.filter(|marker| !markers.insert(*marker)) {
                return Err(QuizError::config_validation(
                    format!("marker {marker} is used by more than one item"),
                    "Give every answer card its own marker ID",
                ));
            }
        }

        if self.rounds > self.items.len() {
            return Err(QuizError::insufficient_items(self.rounds, self.items.len()));
        }

        Ok(())
    }

    /// Builds the question bank from the configured items.
    ///
    /// # Errors
    ///
    /// Returns an error if the items are empty or share a label.
    pub fn question_bank(&self) -> Result<QuestionBank> {
        QuestionBank::new(self.items.iter().map(ItemConfig::to_item).collect())
    }

    /// Builds the yes/no vocabulary used at the consent and replay gates.
    #[must_use]
    pub fn consent_vocabulary(&self) -> Vocabulary {
        Vocabulary::new()
            .with_entry(YES_LABEL, &self.yes_answers)
            .with_entry(NO_LABEL, &self.no_answers)
    }
}

/// What happens to the score when the player chooses to play again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScorePolicy {
    /// Keep counting across replays (default).
    #[default]
    Cumulative,
    /// Start each replay from zero.
    Reset,
}

impl ScorePolicy {
    /// Parses a string into a `ScorePolicy`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cumulative" => Some(Self::Cumulative),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ScorePolicy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid score policy '{s}': expected one of 'cumulative', 'reset'"
            ))
        })
    }
}

impl Serialize for ScorePolicy {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::Cumulative => "cumulative",
            Self::Reset => "reset",
        };
        serializer.serialize_str(s)
    }
}

/// Pauses between actor intents, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    /// Pause around each item during the showcase.
    #[serde(default = "Timing::default_showcase_pause")]
    pub showcase_pause_secs: f64,

    /// Pause after playing an item so the player can listen.
    #[serde(default = "Timing::default_listen_pause")]
    pub listen_pause_secs: f64,

    /// Pause before revealing the correct answer.
    #[serde(default = "Timing::default_reveal_pause")]
    pub reveal_pause_secs: f64,
}

impl Timing {
    const fn default_showcase_pause() -> f64 {
        1.0
    }

    const fn default_listen_pause() -> f64 {
        2.0
    }

    const fn default_reveal_pause() -> f64 {
        1.0
    }

    /// Returns a timing with every pause set to zero.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            showcase_pause_secs: 0.0,
            listen_pause_secs: 0.0,
            reveal_pause_secs: 0.0,
        }
    }

    /// Pause around each showcased item.
    #[must_use]
    pub fn showcase_pause(&self) -> Duration {
        seconds(self.showcase_pause_secs)
    }

    /// Pause after an item is played.
    #[must_use]
    pub fn listen_pause(&self) -> Duration {
        seconds(self.listen_pause_secs)
    }

    /// Pause before the answer is revealed.
    #[must_use]
    pub fn reveal_pause(&self) -> Duration {
        seconds(self.reveal_pause_secs)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("showcasePauseSecs", self.showcase_pause_secs),
            ("listenPauseSecs", self.listen_pause_secs),
            ("revealPauseSecs", self.reveal_pause_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(QuizError::config_validation(
                    format!("timing.{name} must be a non-negative number, got {value}"),
                    format!("Set timing.{name} to 0 or more seconds in your quizbot.json"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            showcase_pause_secs: Self::default_showcase_pause(),
            listen_pause_secs: Self::default_listen_pause(),
            reveal_pause_secs: Self::default_reveal_pause(),
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

/// Symbolic behavior names played by the actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Behaviors {
    /// Played around the introduction.
    pub wave: String,
    /// Played while each item is showcased.
    pub showcase: String,
    /// Played after a correct answer.
    pub applause: String,
    /// Played after an incorrect answer.
    pub shrug: String,
    /// Played when the score meets the success bar.
    pub celebrate: String,
    /// Played when the score falls short of the success bar.
    pub encourage: String,
}

impl Default for Behaviors {
    fn default() -> Self {
        Self {
            wave: "BlocklyWaveRightArm".to_string(),
            showcase: "BlocklyArmsForward".to_string(),
            applause: "BlocklyApplause".to_string(),
            shrug: "BlocklyShrug".to_string(),
            celebrate: "BlocklyRobotDance".to_string(),
            encourage: "BlocklyShrug".to_string(),
        }
    }
}

/// Audio cues streamed as answer feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cues {
    /// Streamed after a correct answer.
    pub success: Option<String>,
    /// Streamed after an incorrect answer.
    pub fail: Option<String>,
}

impl Default for Cues {
    fn default() -> Self {
        Self {
            success: Some(
                "https://audio.jukehost.co.uk/ExEdJnj8yolYaIX3SdjwX8asJukJ55gx".to_string(),
            ),
            fail: Some("https://audio.jukehost.co.uk/XNSKFJNIaJnHDvtssNsx9EjYDApqfHfD".to_string()),
        }
    }
}

/// Spoken lines. Placeholders in braces are filled by [`fill`].
///
/// Available placeholders: `{labels}`, `{count}`, `{rounds}` in the
/// introduction lines, `{label}` in the per-item lines, and `{score}`,
/// `{total}` in the reaction and replay lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Phrases {
    /// First line of the session.
    pub greeting: String,
    /// Introduces the game and the labels.
    pub introduction: String,
    /// Explains the round format.
    pub rules: String,
    /// The consent question.
    pub consent_question: String,
    /// Said when the player declines.
    pub farewell: String,
    /// Said when a gate answer was not understood.
    pub not_heard: String,
    /// Opens the showcase.
    pub showcase_intro: String,
    /// Announces each showcased item.
    pub showcase_item: String,
    /// Said before each question's media plays.
    pub round_prompt: String,
    /// The per-question answer question.
    pub answer_question: String,
    /// Said after a correct answer.
    pub correct: String,
    /// Said after an incorrect answer, naming the right label.
    pub incorrect: String,
    /// Reaction when the score meets the bar.
    pub celebrate: String,
    /// Reaction when the score falls short.
    pub encourage: String,
    /// The replay question.
    pub replay_question: String,
}

impl Default for Phrases {
    fn default() -> Self {
        Self {
            greeting: "What a beautiful day to learn some guitar notes.".to_string(),
            introduction: "Hi there! It is really nice to see you. My name is Guitary and today I am going to teach you to recognize the {count} most important guitar notes. Namely the notes {labels}. For this game, I will randomly play one of those notes and you have to guess which one it is. Each time you guess correctly you will score a point.".to_string(),
            rules: "You will only need to recognize one note at a time for {rounds} rounds.".to_string(),
            consent_question: "Are you ready?".to_string(),
            farewell: "Oh, well maybe some other time.".to_string(),
            not_heard: "Sorry, but I didn't hear you properly.".to_string(),
            showcase_intro: "All right, let me play all the notes for you to start with, try to memorize them as well as you can.".to_string(),
            showcase_item: "Let me play the following note for you. {label}.".to_string(),
            round_prompt: "Alright, let me play one of the notes, please try to recognize it.".to_string(),
            answer_question: "Could you please tell me what note I just played?".to_string(),
            correct: "Good job you guessed the note! You get one point.".to_string(),
            incorrect: "Sorry, but I don't think that was the answer. I played the {label} note. Here is what the {label} note sounds like, please remember it for next time.".to_string(),
            celebrate: "{score} is a really good score by the way, you're getting the hang of this! Let's celebrate!".to_string(),
            encourage: "{score} is not a bad start, you will get there next time. Let's aim for a better score next time!".to_string(),
            replay_question: "You scored {score} out of {total}, would you like to play again?".to_string(),
        }
    }
}

/// Fills `{name}` placeholders in a phrase template.
///
/// # Examples
///
/// ```
/// use quizbot_engine::config::fill;
///
/// assert_eq!(fill("I played the {label} note", &[("label", "G")]), "I played the G note");
/// assert_eq!(fill("no placeholders", &[("label", "G")]), "no placeholders");
/// ```
#[must_use]
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
}

/// Joins labels for speech: `"A, C and D"`.
#[must_use]
pub fn spoken_list<'a>(labels: impl IntoIterator<Item = &'a Label>) -> String {
    let labels: Vec<&str> = labels.into_iter().map(Label::as_str).collect();
    match labels.split_last() {
        None => String::new(),
        Some((last, [])) => (*last).to_string(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}

/// One quiz entry as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemConfig {
    /// Canonical label.
    pub label: String,
    /// Accepted spoken variants besides the label.
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Audio reference that prompts the item.
    pub media: String,
    /// ID of the answer card that names the item, when cards are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<u32>,
}

impl ItemConfig {
    /// Creates an item entry.
    #[must_use]
    pub fn new(label: &str, media: &str, synonyms: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            synonyms: to_strings(synonyms),
            media: media.to_string(),
            marker: None,
        }
    }

    /// Sets the answer card marker ID.
    #[must_use]
    pub const fn with_marker(mut self, marker: u32) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Converts the entry into a bank item.
    #[must_use]
    pub fn to_item(&self) -> QuizItem {
        let item = QuizItem::new(self.label.as_str(), self.media.clone(), &self.synonyms);
        match self.marker {
            Some(marker) => item.with_marker(marker),
            None => item,
        }
    }

    /// The default content: five open-position guitar notes.
    #[must_use]
    pub fn guitar_notes() -> Vec<Self> {
        vec![
            Self::new(
                "A",
                "https://audio.jukehost.co.uk/dNQshEWsKaC9CBTyaicXGXKNYMR1OO0H",
                &["ay", "aa"],
            ),
            Self::new(
                "C",
                "https://audio.jukehost.co.uk/0Ty2zDs2ieXrsGqao2jC24WffTT1ZC0i",
                &["see", "sea"],
            ),
            Self::new(
                "D",
                "https://audio.jukehost.co.uk/7E8kkTF3ZbaLZFuCU4cdL6ZqCRlbImum",
                &["dee"],
            ),
            Self::new(
                "E",
                "https://audio.jukehost.co.uk/ZTjEP8GRbS98YPmshr2IPkF2UtJYUR6S",
                &["ee"],
            ),
            Self::new(
                "G",
                "https://audio.jukehost.co.uk/0C2dTo0xpBEnPWV2rMSJorYQUnB7izU9",
                &["gee"],
            ),
        ]
    }
}
