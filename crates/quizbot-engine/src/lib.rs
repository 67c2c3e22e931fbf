//! Quizbot Engine
//!
//! Runs interactive quiz sessions through a robot or simulated actor: the
//! question bank, answer matching, scoring, round execution, and the session
//! state machine.

pub mod actor;
pub mod bank;
pub mod config;
pub mod error;
pub mod events;
pub mod item;
pub mod matcher;
pub mod round;
pub mod score;
pub mod session;

pub use actor::{Actor, Intent, Reply, ScriptedActor};
pub use bank::{QuestionBank, RoundPlan};
pub use config::{
    Behaviors, Cues, ItemConfig, Phrases, QuizConfig, ScorePolicy, Timing, NO_LABEL, YES_LABEL,
};
pub use error::{QuizError, Result};
pub use events::{EventBroadcaster, SessionEvent};
pub use item::{normalize, Label, QuizItem, Vocabulary};
pub use matcher::AnswerMatcher;
pub use round::{RoundRunner, RoundSummary};
pub use score::{AnswerOutcome, ScoreState, ScoreTracker, DEFAULT_SUCCESS_BAR};
pub use session::{
    EndReason, Reaction, RoundRecord, SessionOrchestrator, SessionReport, SessionState,
};
