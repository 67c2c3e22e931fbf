//! The actor capability surface.
//!
//! The engine never talks to a robot directly. It drives an [`Actor`], which
//! may be a physical robot behind a network session, a console, or the
//! in-memory [`ScriptedActor`]. Every call resolves before the engine emits
//! its next intent.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{QuizError, Result};
use crate::item::Vocabulary;

/// What the actor perceived in response to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reply {
    /// The recognizer produced this text (usually one of the offered labels).
    Heard(String),
    /// The camera saw an answer card carrying this marker ID.
    Marker(u32),
    /// Nothing usable was heard or seen, including timeouts.
    Unrecognized,
}

impl Reply {
    /// Creates a `Heard` reply.
    #[must_use]
    pub fn heard(text: impl Into<String>) -> Self {
        Self::Heard(text.into())
    }

    /// Returns the heard text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Heard(text) => Some(text),
            Self::Marker(_) | Self::Unrecognized => None,
        }
    }

    /// Returns the seen marker ID, if any.
    #[must_use]
    pub const fn marker(&self) -> Option<u32> {
        match self {
            Self::Marker(id) => Some(*id),
            Self::Heard(_) | Self::Unrecognized => None,
        }
    }
}

/// Capabilities the engine needs from a robot or simulator.
///
/// A failure or disconnect is reported as [`QuizError::ActorUnavailable`];
/// the engine stops the session as soon as it sees one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Actor: Send {
    /// Speaks a line of text.
    async fn say(&mut self, text: &str) -> Result<()>;

    /// Asks a question and waits for one of the accepted answers, spoken or
    /// shown as a marker card.
    async fn ask(&mut self, question: &str, answers: &Vocabulary) -> Result<Reply>;

    /// Plays a named gesture or behavior.
    async fn play_behavior(&mut self, name: &str) -> Result<()>;

    /// Streams an audio resource. With `blocking` false the call returns once playback starts.
    async fn stream_audio(&mut self, resource: &str, blocking: bool) -> Result<()>;

    /// Waits for choreography to settle.
    async fn pause(&mut self, duration: Duration) -> Result<()>;

    /// Releases the session.
    async fn end_session(&mut self) -> Result<()>;
}

// ============================================================================
// Intent
// ============================================================================

/// A single request made to an actor, as recorded in a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// `say(text)`.
    Say {
        /// The spoken line.
        text: String,
    },
    /// `ask(question, answers)`.
    Ask {
        /// The question text.
        question: String,
        /// The recognition hint set.
        answers: Vocabulary,
    },
    /// `play_behavior(name)`.
    PlayBehavior {
        /// Symbolic behavior name.
        name: String,
    },
    /// `stream_audio(resource, blocking)`.
    StreamAudio {
        /// Audio reference.
        resource: String,
        /// Whether the call waited for playback to finish.
        blocking: bool,
    },
    /// `pause(duration)`.
    Pause {
        /// Pause length in seconds.
        seconds: f64,
    },
    /// `end_session()`.
    EndSession,
}

// ============================================================================
// ScriptedActor
// ============================================================================

/// A deterministic in-memory actor.
///
/// Answers questions from a queue of scripted replies (an empty queue
/// behaves like a listener that timed out) and records every intent it
/// receives. It can also be told to disconnect after a number of intents.
///
/// # Example
///
/// ```
/// use quizbot_engine::actor::{Actor, Intent, Reply, ScriptedActor};
/// use quizbot_engine::item::Vocabulary;
///
/// # tokio_test::block_on(async {
/// let mut actor = ScriptedActor::new().with_replies(["yes"]);
/// actor.say("Hello").await.unwrap();
/// let reply = actor.ask("Ready?", &Vocabulary::new()).await.unwrap();
///
/// assert_eq!(reply, Reply::heard("yes"));
/// assert_eq!(actor.intents()[0], Intent::Say { text: "Hello".into() });
/// # });
/// ```
#[derive(Debug, Default)]
pub struct ScriptedActor {
    replies: VecDeque<Reply>,
    intents: Vec<Intent>,
    fail_after: Option<usize>,
}

impl ScriptedActor {
    /// Creates an actor with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues replies heard as the given texts, in order.
    #[must_use]
    pub fn with_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies
            .extend(replies.into_iter().map(|text| Reply::Heard(text.into())));
        self
    }

    /// Queues a single reply.
    #[must_use]
    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);
        self
    }

    /// Makes every call fail once `count` intents have been recorded.
    #[must_use]
    pub const fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Returns every recorded intent in order.
    #[must_use]
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Returns the spoken lines in order.
    #[must_use]
    pub fn spoken(&self) -> Vec<&str> {
        self.intents
            .iter()
            .filter_map(|intent| match intent {
                Intent::Say { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns the asked questions in order.
    #[must_use]
    pub fn questions(&self) -> Vec<&str> {
        self.intents
            .iter()
            .filter_map(|intent| match intent {
                Intent::Ask { question, .. } => Some(question.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns the played behavior names in order.
    #[must_use]
    pub fn behaviors(&self) -> Vec<&str> {
        self.intents
            .iter()
            .filter_map(|intent| match intent {
                Intent::PlayBehavior { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of scripted replies not yet consumed.
    #[must_use]
    pub fn remaining_replies(&self) -> usize {
        self.replies.len()
    }

    fn record(&mut self, intent: Intent) -> Result<()> {
        if self.fail_after.is_some_and(|limit| self.intents.len() >= limit) {
            return Err(QuizError::actor_unavailable("scripted disconnect"));
        }
        tracing::debug!(?intent, "Scripted intent");
        self.intents.push(intent);
        Ok(())
    }
}

#[async_trait]
impl Actor for ScriptedActor {
    async fn say(&mut self, text: &str) -> Result<()> {
        self.record(Intent::Say {
            text: text.to_string(),
        })
    }

    async fn ask(&mut self, question: &str, answers: &Vocabulary) -> Result<Reply> {
        self.record(Intent::Ask {
            question: question.to_string(),
            answers: answers.clone(),
        })?;
        Ok(self.replies.pop_front().unwrap_or(Reply::Unrecognized))
    }

    async fn play_behavior(&mut self, name: &str) -> Result<()> {
        self.record(Intent::PlayBehavior {
            name: name.to_string(),
        })
    }

    async fn stream_audio(&mut self, resource: &str, blocking: bool) -> Result<()> {
        self.record(Intent::StreamAudio {
            resource: resource.to_string(),
            blocking,
        })
    }

    async fn pause(&mut self, duration: Duration) -> Result<()> {
        self.record(Intent::Pause {
            seconds: duration.as_secs_f64(),
        })
    }

    async fn end_session(&mut self) -> Result<()> {
        self.record(Intent::EndSession)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[tokio::test]
    async fn test_scripted_actor_records_in_order() {
        let mut actor = ScriptedActor::new();
        assert_ok!(actor.say("hi").await);
        assert_ok!(actor.play_behavior("BlocklyWaveRightArm").await);
        assert_ok!(actor.stream_audio("a.mp3", false).await);
        assert_ok!(actor.pause(Duration::from_millis(1500)).await);
        assert_ok!(actor.end_session().await);

        assert_eq!(
            actor.intents(),
            &[
                Intent::Say { text: "hi".into() },
                Intent::PlayBehavior {
                    name: "BlocklyWaveRightArm".into()
                },
                Intent::StreamAudio {
                    resource: "a.mp3".into(),
                    blocking: false
                },
                Intent::Pause { seconds: 1.5 },
                Intent::EndSession,
            ]
        );
    }

    #[tokio::test]
    async fn test_scripted_actor_runs_out_of_replies() {
        let mut actor = ScriptedActor::new()
            .with_replies(["A"])
            .with_reply(Reply::Unrecognized);
        let vocabulary = Vocabulary::new();

        assert_eq!(actor.ask("q1", &vocabulary).await.unwrap(), Reply::heard("A"));
        assert_eq!(actor.ask("q2", &vocabulary).await.unwrap(), Reply::Unrecognized);
        assert_eq!(actor.ask("q3", &vocabulary).await.unwrap(), Reply::Unrecognized);
        assert_eq!(actor.questions(), vec!["q1", "q2", "q3"]);
        assert_eq!(actor.remaining_replies(), 0);
    }

    #[tokio::test]
    async fn test_scripted_actor_disconnects() {
        let mut actor = ScriptedActor::new().failing_after(1);
        assert_ok!(actor.say("one").await);
        let err = assert_err!(actor.say("two").await);
        assert!(err.is_actor_failure());
        assert_eq!(actor.spoken(), vec!["one"]);
    }

    #[test]
    fn test_reply_text() {
        assert_eq!(Reply::heard("nay").text(), Some("nay"));
        assert_eq!(Reply::Unrecognized.text(), None);
        assert_eq!(Reply::Marker(3).text(), None);
        assert_eq!(Reply::Marker(3).marker(), Some(3));
    }

    #[test]
    fn test_reply_serialization() {
        assert_eq!(
            serde_json::to_string(&Reply::Marker(0)).unwrap(),
            r#"{"kind":"marker","value":0}"#
        );
        let reply: Reply = serde_json::from_str(r#"{"kind":"heard","value":"C"}"#).unwrap();
        assert_eq!(reply, Reply::heard("C"));
    }

    #[test]
    fn test_intent_serialization() {
        let json = serde_json::to_string(&Intent::StreamAudio {
            resource: "g.mp3".into(),
            blocking: true,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"intent":"stream_audio","resource":"g.mp3","blocking":true}"#
        );
        assert_eq!(
            serde_json::to_string(&Intent::EndSession).unwrap(),
            r#"{"intent":"end_session"}"#
        );
    }
}
