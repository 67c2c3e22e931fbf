//! The session state machine.
//!
//! A session moves through these states:
//! - `Intro` -> `Consent`
//! - From `Consent`:
//!   - `Showcase` -> `Playing` (player agreed, showcase enabled)
//!   - `Playing` (player agreed, showcase disabled)
//!   - `Ended` (player declined or was not understood)
//! - `Playing` -> `ReplayPrompt`
//! - From `ReplayPrompt`: `Playing` (play again) or `Ended`
//!
//! Any non-terminal state may also jump to `Ended` when the actor goes away.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::bank::QuestionBank;
use crate::config::{fill, spoken_list, QuizConfig, ScorePolicy, NO_LABEL, YES_LABEL};
use crate::error::{QuizError, Result};
use crate::events::{EventBroadcaster, SessionEvent};
use crate::item::Vocabulary;
use crate::matcher::AnswerMatcher;
use crate::round::{RoundRunner, RoundSummary};
use crate::score::{ScoreState, ScoreTracker};

// ============================================================================
// SessionState
// ============================================================================

/// Current state of a quiz session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Greeting and explanation.
    #[default]
    Intro,
    /// Waiting for the player to agree to play.
    Consent,
    /// Playing every item once before the first round.
    Showcase,
    /// Running a round.
    Playing,
    /// Reacting to the score and offering another round.
    ReplayPrompt,
    /// The session is over.
    Ended,
}

impl SessionState {
    /// Returns `true` if this is the terminal state.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizbot_engine::SessionState;
    ///
    /// assert!(SessionState::Ended.is_terminal());
    /// assert!(!SessionState::ReplayPrompt.is_terminal());
    /// ```
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Returns `true` if the state machine allows moving to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Ended, _) => false,
            (_, Self::Ended)
            | (Self::Intro, Self::Consent)
            | (Self::Consent | Self::ReplayPrompt, Self::Playing)
            | (Self::Consent, Self::Showcase)
            | (Self::Showcase, Self::Playing)
            | (Self::Playing, Self::ReplayPrompt) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Intro => "intro",
            Self::Consent => "consent",
            Self::Showcase => "showcase",
            Self::Playing => "playing",
            Self::ReplayPrompt => "replay_prompt",
            Self::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Why a session reached [`SessionState::Ended`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The player said no at the consent gate.
    Declined,
    /// A consent or replay answer was not understood.
    NotHeard,
    /// The player stopped after playing, or no replays were left.
    Finished,
    /// The actor failed or disconnected.
    ActorUnavailable,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Declined => "declined",
            Self::NotHeard => "not_heard",
            Self::Finished => "finished",
            Self::ActorUnavailable => "actor_unavailable",
        };
        f.write_str(s)
    }
}

/// Which reaction followed a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    /// The score met the success bar.
    Celebratory,
    /// The score fell short of the success bar.
    Encouraging,
}

// ============================================================================
// History
// ============================================================================

/// Record of a completed round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    /// The round number (1-indexed).
    pub round: u32,
    /// Result of this round alone.
    pub summary: RoundSummary,
    /// The reaction given after the round, once the replay prompt ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction: Option<Reaction>,
    /// When the round started.
    pub started_at: DateTime<Utc>,
    /// When the round ended.
    pub ended_at: DateTime<Utc>,
}

/// Final account of a session, returned by [`SessionOrchestrator::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// State at the time of the report.
    pub state: SessionState,
    /// Why the session ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
    /// The session score.
    pub score: ScoreState,
    /// Every round played.
    pub rounds: Vec<RoundRecord>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the session ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionReport {
    /// Returns the reaction given after the most recent round.
    #[must_use]
    pub fn last_reaction(&self) -> Option<Reaction> {
        self.rounds.last().and_then(|record| record.reaction)
    }
}

// ============================================================================
// SessionOrchestrator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateAnswer {
    Yes,
    No,
    Unrecognized,
}

/// Drives one quiz session from greeting to goodbye.
///
/// Owns its score, state, round history, and random source; nothing is
/// shared between sessions. All actor calls are awaited one at a time.
pub struct SessionOrchestrator {
    config: QuizConfig,
    bank: QuestionBank,
    gate_vocabulary: Vocabulary,
    matcher: AnswerMatcher,
    tracker: ScoreTracker,
    state: SessionState,
    rng: Box<dyn RngCore + Send + Sync>,
    events: Option<EventBroadcaster>,
    rounds: Vec<RoundRecord>,
    replays: u32,
    end_reason: Option<EndReason>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl SessionOrchestrator {
    /// Creates a session from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InsufficientItems` when `rounds` exceeds the item
    /// count, and any other validation error of [`QuizConfig::validate`].
    /// No actor is involved yet, so nothing has been said when this fails.
    pub fn new(config: QuizConfig) -> Result<Self> {
        config.validate()?;
        let bank = config.question_bank()?;
        let gate_vocabulary = config.consent_vocabulary();

        Ok(Self {
            config,
            bank,
            gate_vocabulary,
            matcher: AnswerMatcher::new(),
            tracker: ScoreTracker::new(),
            state: SessionState::Intro,
            rng: Box::new(StdRng::from_os_rng()),
            events: None,
            rounds: Vec::new(),
            replays: 0,
            end_reason: None,
            started_at: Utc::now(),
            ended_at: None,
        })
    }

    /// Replaces the random source used to draw rounds.
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + Sync + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Reports progress to the given broadcaster.
    #[must_use]
    pub fn with_events(mut self, events: EventBroadcaster) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the session score tracker.
    #[must_use]
    pub const fn tracker(&self) -> &ScoreTracker {
        &self.tracker
    }

    /// Returns the question bank.
    #[must_use]
    pub const fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Returns why the session ended, once it has.
    #[must_use]
    pub const fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Runs the session to completion.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ActorUnavailable` if the actor fails at any point;
    /// the session is then `Ended` and no further intents are emitted.
    /// Returns `QuizError::InvalidStateTransition` if called on a session
    /// that has already ended.
    pub async fn run<A: Actor + ?Sized>(&mut self, actor: &mut A) -> Result<SessionReport> {
        if self.state.is_terminal() {
            return Err(QuizError::invalid_transition(self.state, SessionState::Intro));
        }

        self.started_at = Utc::now();
        tracing::info!(
            rounds = self.config.rounds,
            items = self.bank.len(),
            "Quiz session starting"
        );

        match self.drive(actor).await {
            Ok(()) => Ok(self.report()),
            Err(e) => {
                if e.is_actor_failure() {
                    tracing::warn!(error = %e, state = %self.state, "Actor unavailable, ending session");
                    if self.end_reason.is_none() {
                        self.end_reason = Some(EndReason::ActorUnavailable);
                    }
                    if !self.state.is_terminal() {
                        self.transition(SessionState::Ended)?;
                    }
                    self.close();
                }
                Err(e)
            }
        }
    }

    /// Returns a report of the session so far.
    #[must_use]
    pub fn report(&self) -> SessionReport {
        SessionReport {
            state: self.state,
            end_reason: self.end_reason,
            score: self.tracker.state(),
            rounds: self.rounds.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }

    async fn drive<A: Actor + ?Sized>(&mut self, actor: &mut A) -> Result<()> {
        loop {
            match self.state {
                SessionState::Intro => {
                    self.intro(actor).await?;
                    self.transition(SessionState::Consent)?;
                }
                SessionState::Consent => {
                    let next = self.consent(actor).await?;
                    self.transition(next)?;
                }
                SessionState::Showcase => {
                    self.showcase(actor).await?;
                    self.transition(SessionState::Playing)?;
                }
                SessionState::Playing => {
                    self.play_round(actor).await?;
                    self.transition(SessionState::ReplayPrompt)?;
                }
                SessionState::ReplayPrompt => {
                    let next = self.replay_prompt(actor).await?;
                    self.transition(next)?;
                }
                SessionState::Ended => {
                    actor.end_session().await?;
                    self.close();
                    return Ok(());
                }
            }
        }
    }

    async fn intro<A: Actor + ?Sized>(&self, actor: &mut A) -> Result<()> {
        let phrases = &self.config.phrases;
        let labels = spoken_list(self.bank.labels());
        let count = self.bank.len().to_string();
        let rounds = self.config.rounds.to_string();

        actor.say(&phrases.greeting).await?;
        actor.play_behavior(&self.config.behaviors.wave).await?;
        actor
            .say(&fill(
                &phrases.introduction,
                &[("labels", &labels), ("count", &count), ("rounds", &rounds)],
            ))
            .await?;
        actor
            .say(&fill(&phrases.rules, &[("rounds", &rounds), ("count", &count)]))
            .await?;
        actor.play_behavior(&self.config.behaviors.wave).await
    }

    async fn consent<A: Actor + ?Sized>(&mut self, actor: &mut A) -> Result<SessionState> {
        let question = self.config.phrases.consent_question.clone();
        let next = match self.ask_gate(actor, &question).await? {
            GateAnswer::Yes if self.config.showcase => SessionState::Showcase,
            GateAnswer::Yes => SessionState::Playing,
            GateAnswer::No => {
                actor.say(&self.config.phrases.farewell).await?;
                self.end_reason = Some(EndReason::Declined);
                SessionState::Ended
            }
            GateAnswer::Unrecognized => {
                actor.say(&self.config.phrases.not_heard).await?;
                self.end_reason = Some(EndReason::NotHeard);
                SessionState::Ended
            }
        };
        Ok(next)
    }

    async fn showcase<A: Actor + ?Sized>(&self, actor: &mut A) -> Result<()> {
        let pause = self.config.timing.showcase_pause();

        actor.play_behavior(&self.config.behaviors.wave).await?;
        actor.say(&self.config.phrases.showcase_intro).await?;
        for item in self.bank.items() {
            let line = fill(
                &self.config.phrases.showcase_item,
                &[("label", item.label().as_str())],
            );
            actor.say(&line).await?;
            actor.play_behavior(&self.config.behaviors.showcase).await?;
            actor.pause(pause).await?;
            actor.stream_audio(item.prompt_media(), false).await?;
            actor.pause(pause).await?;
        }
        Ok(())
    }

    async fn play_round<A: Actor + ?Sized>(&mut self, actor: &mut A) -> Result<()> {
        // Outcomes land in a working copy and are only kept once the round completes.
        let mut tracker = self.tracker.clone();
        if !self.rounds.is_empty() {
            self.replays += 1;
            if self.config.score_policy == ScorePolicy::Reset {
                tracing::debug!("Resetting score for replay");
                tracker.reset();
            }
        }

        let round = u32::try_from(self.rounds.len() + 1).unwrap_or(u32::MAX);
        let plan = self.bank.draw(self.config.rounds, &mut *self.rng)?;
        let started_at = Utc::now();

        let mut runner = RoundRunner::new(&self.config).with_round(round);
        if let Some(events) = &self.events {
            runner = runner.with_events(events);
        }
        let summary = runner
            .run_round(&plan, actor, &self.matcher, &mut tracker)
            .await
            .inspect_err(|e| {
                tracing::debug!(round, error = %e, "Discarding outcomes of interrupted round");
            })?;
        self.tracker = tracker;

        self.rounds.push(RoundRecord {
            round,
            summary,
            reaction: None,
            started_at,
            ended_at: Utc::now(),
        });
        self.emit(SessionEvent::round_complete(
            round,
            summary,
            self.tracker.state(),
        ));
        Ok(())
    }

    async fn replay_prompt<A: Actor + ?Sized>(&mut self, actor: &mut A) -> Result<SessionState> {
        let score = self.tracker.state();
        let correct = score.correct.to_string();
        let total = score.total.to_string();
        let values = [("score", correct.as_str()), ("total", total.as_str())];
        let phrases = &self.config.phrases;
        let behaviors = &self.config.behaviors;

        let reaction = if self.tracker.meets_bar(self.config.success_bar) {
            actor.say(&fill(&phrases.celebrate, &values)).await?;
            actor.play_behavior(&behaviors.celebrate).await?;
            Reaction::Celebratory
        } else {
            actor.say(&fill(&phrases.encourage, &values)).await?;
            actor.play_behavior(&behaviors.encourage).await?;
            Reaction::Encouraging
        };
        tracing::info!(?reaction, correct = score.correct, total = score.total, "Round reaction");
        if let Some(record) = self.rounds.last_mut() {
            record.reaction = Some(reaction);
        }

        if self
            .config
            .max_replays
            .is_some_and(|max| self.replays >= max)
        {
            actor.say(&self.config.phrases.farewell).await?;
            self.end_reason = Some(EndReason::Finished);
            return Ok(SessionState::Ended);
        }

        let question = fill(&self.config.phrases.replay_question, &values);
        let next = match self.ask_gate(actor, &question).await? {
            GateAnswer::Yes => SessionState::Playing,
            GateAnswer::No => {
                actor.say(&self.config.phrases.farewell).await?;
                self.end_reason = Some(EndReason::Finished);
                SessionState::Ended
            }
            GateAnswer::Unrecognized => {
                actor.say(&self.config.phrases.not_heard).await?;
                self.end_reason = Some(EndReason::NotHeard);
                SessionState::Ended
            }
        };
        Ok(next)
    }

    async fn ask_gate<A: Actor + ?Sized>(&self, actor: &mut A, question: &str) -> Result<GateAnswer> {
        let reply = actor.ask(question, &self.gate_vocabulary).await?;
        let resolved = reply
            .text()
            .and_then(|text| self.matcher.resolve(text, &self.gate_vocabulary));

        let answer = match resolved {
            Some(label) if label.as_str() == YES_LABEL => GateAnswer::Yes,
            Some(label) if label.as_str() == NO_LABEL => GateAnswer::No,
            _ => GateAnswer::Unrecognized,
        };
        tracing::debug!(?reply, ?answer, "Gate answer");
        Ok(answer)
    }

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(QuizError::invalid_transition(self.state, next));
        }
        tracing::info!(from = %self.state, to = %next, "Session state changed");
        self.emit(SessionEvent::state_changed(self.state, next));
        self.state = next;
        Ok(())
    }

    fn close(&mut self) {
        self.ended_at = Some(Utc::now());
        let reason = self.end_reason.unwrap_or(EndReason::Finished);
        tracing::info!(
            %reason,
            correct = self.tracker.correct_count(),
            total = self.tracker.total_count(),
            "Quiz session ended"
        );
        self.emit(SessionEvent::session_ended(reason, self.tracker.state()));
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }
}
