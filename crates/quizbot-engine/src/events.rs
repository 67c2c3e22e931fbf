//! Session event types and broadcasting for real-time observation.
//!
//! The orchestrator reports its progress as [`SessionEvent`]s. Any number of
//! observers (a console logger, a dashboard, a test) can subscribe through an
//! [`EventBroadcaster`]. Events are not persisted for late subscribers.
//!
//! # Event Types
//!
//! - `state_changed` - The session moved to a new state
//! - `question_presented` - A question was played to the player
//! - `answer_scored` - An answer was matched and scored
//! - `round_complete` - A round finished
//! - `session_ended` - The session reached its terminal state
//!
//! # Example
//!
//! ```
//! use quizbot_engine::events::{EventBroadcaster, SessionEvent};
//! use quizbot_engine::SessionState;
//!
//! # tokio_test::block_on(async {
//! let broadcaster = EventBroadcaster::new(16);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(SessionEvent::state_changed(SessionState::Intro, SessionState::Consent));
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_name(), "state_changed");
//! # });
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::item::Label;
use crate::round::RoundSummary;
use crate::score::{AnswerOutcome, ScoreState};
use crate::session::{EndReason, SessionState};

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `state_changed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangedPayload {
    /// The state that was left.
    pub from: SessionState,
    /// The state that was entered.
    pub to: SessionState,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `question_presented` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPresentedPayload {
    /// Round number (1-indexed).
    pub round: u32,
    /// Question number within the round (1-indexed).
    pub question: u32,
    /// The label being asked about.
    pub label: Label,
}

/// Payload for the `round_complete` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundCompletePayload {
    /// Round number (1-indexed).
    pub round: u32,
    /// Result of this round alone.
    pub summary: RoundSummary,
    /// The session score after the round.
    pub score: ScoreState,
}

/// Payload for the `session_ended` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndedPayload {
    /// Why the session ended.
    pub reason: EndReason,
    /// The final score.
    pub score: ScoreState,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Events emitted while a session runs.
///
/// All events are serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session moved between states.
    StateChanged(StateChangedPayload),
    /// A question was presented.
    QuestionPresented(QuestionPresentedPayload),
    /// An answer was scored.
    AnswerScored(AnswerOutcome),
    /// A round finished.
    RoundComplete(RoundCompletePayload),
    /// The session ended.
    SessionEnded(SessionEndedPayload),
}

impl SessionEvent {
    /// Creates a `StateChanged` event stamped with the current time.
    #[must_use]
    pub fn state_changed(from: SessionState, to: SessionState) -> Self {
        Self::StateChanged(StateChangedPayload {
            from,
            to,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `QuestionPresented` event.
    #[must_use]
    pub const fn question_presented(round: u32, question: u32, label: Label) -> Self {
        Self::QuestionPresented(QuestionPresentedPayload {
            round,
            question,
            label,
        })
    }

    /// Creates an `AnswerScored` event.
    #[must_use]
    pub const fn answer_scored(outcome: AnswerOutcome) -> Self {
        Self::AnswerScored(outcome)
    }

    /// Creates a `RoundComplete` event.
    #[must_use]
    pub const fn round_complete(round: u32, summary: RoundSummary, score: ScoreState) -> Self {
        Self::RoundComplete(RoundCompletePayload {
            round,
            summary,
            score,
        })
    }

    /// Creates a `SessionEnded` event.
    #[must_use]
    pub const fn session_ended(reason: EndReason, score: ScoreState) -> Self {
        Self::SessionEnded(SessionEndedPayload { reason, score })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::StateChanged(_) => "state_changed",
            Self::QuestionPresented(_) => "question_presented",
            Self::AnswerScored(_) => "answer_scored",
            Self::RoundComplete(_) => "round_complete",
            Self::SessionEnded(_) => "session_ended",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to all subscribers.
///
/// Uses a tokio broadcast channel for pub-sub event distribution.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a new `EventBroadcaster` with the specified buffer capacity.
    ///
    /// The buffer determines how many events can be queued per subscriber
    /// before old events are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber for receiving events.
    ///
    /// If a subscriber falls behind it receives a `Lagged` error and misses
    /// some events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event to all subscribers.
    ///
    /// Returns the number of receivers that will see the event; 0 means
    /// nobody is listening.
    pub fn send(&self, event: SessionEvent) -> usize {
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
