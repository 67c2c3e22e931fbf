//! Execution of a single quiz round.

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Reply};
use crate::bank::RoundPlan;
use crate::config::{fill, QuizConfig};
use crate::error::Result;
use crate::events::{EventBroadcaster, SessionEvent};
use crate::item::QuizItem;
use crate::matcher::AnswerMatcher;
use crate::score::{AnswerOutcome, ScoreTracker};

/// Result of one round on its own, independent of the session score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Correct answers in this round.
    pub correct_this_round: u32,
    /// Questions asked in this round.
    pub total_this_round: u32,
}

/// Runs the questions of a [`RoundPlan`] against an actor.
///
/// Each question is presented, answered, matched, scored, and followed by
/// feedback before the next one starts. Unrecognized and wrong answers both
/// score as incorrect; nothing is retried.
#[derive(Debug, Clone, Copy)]
pub struct RoundRunner<'a> {
    config: &'a QuizConfig,
    events: Option<&'a EventBroadcaster>,
    round: u32,
}

impl<'a> RoundRunner<'a> {
    /// Creates a runner using the phrases, behaviors, cues, and timing of `config`.
    #[must_use]
    pub const fn new(config: &'a QuizConfig) -> Self {
        Self {
            config,
            events: None,
            round: 1,
        }
    }

    /// Reports progress to the given broadcaster.
    #[must_use]
    pub const fn with_events(mut self, events: &'a EventBroadcaster) -> Self {
        self.events = Some(events);
        self
    }

    /// Sets the 1-indexed round number used in events.
    #[must_use]
    pub const fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    /// Runs every question of the plan in order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ActorUnavailable` as soon as any actor call fails.
    /// Outcomes already recorded into `tracker` stay recorded; the round is
    /// not resumed.
    pub async fn run_round<A: Actor + ?Sized>(
        &self,
        plan: &RoundPlan,
        actor: &mut A,
        matcher: &AnswerMatcher,
        tracker: &mut ScoreTracker,
    ) -> Result<RoundSummary> {
        let mut summary = RoundSummary::default();

        for (index, item) in plan.items().iter().enumerate() {
            let question = u32::try_from(index + 1).unwrap_or(u32::MAX);
            self.present(item, actor).await?;
            self.emit(SessionEvent::question_presented(
                self.round,
                question,
                item.label().clone(),
            ));

            let reply = actor
                .ask(&self.config.phrases.answer_question, plan.vocabulary())
                .await?;

            // A marker is only meaningful for this question, so it is resolved here.
            let matched = match &reply {
                Reply::Heard(text) => matcher
                    .match_answer(text, item)
                    .or_else(|| matcher.resolve(text, plan.vocabulary())),
                Reply::Marker(marker) => plan.marker_label(*marker).cloned(),
                Reply::Unrecognized => None,
            };
            let outcome = AnswerOutcome::new(item.label().clone(), matched);
            tracing::debug!(
                round = self.round,
                question,
                expected = %outcome.expected_label,
                ?reply,
                correct = outcome.is_correct,
                "Answer scored"
            );

            tracker.record(&outcome);
            summary.total_this_round += 1;
            if outcome.is_correct {
                summary.correct_this_round += 1;
                self.praise(actor).await?;
            } else {
                self.correct_mistake(item, actor).await?;
            }
            self.emit(SessionEvent::answer_scored(outcome));
        }

        tracing::info!(
            round = self.round,
            correct = summary.correct_this_round,
            total = summary.total_this_round,
            "Round complete"
        );
        Ok(summary)
    }

    async fn present<A: Actor + ?Sized>(&self, item: &QuizItem, actor: &mut A) -> Result<()> {
        actor.say(&self.config.phrases.round_prompt).await?;
        actor.stream_audio(item.prompt_media(), false).await?;
        actor.pause(self.config.timing.listen_pause()).await
    }

    async fn praise<A: Actor + ?Sized>(&self, actor: &mut A) -> Result<()> {
        if let Some(cue) = &self.config.cues.success {
            actor.stream_audio(cue, false).await?;
        }
        actor.play_behavior(&self.config.behaviors.applause).await?;
        actor.say(&self.config.phrases.correct).await
    }

    async fn correct_mistake<A: Actor + ?Sized>(
        &self,
        item: &QuizItem,
        actor: &mut A,
    ) -> Result<()> {
        if let Some(cue) = &self.config.cues.fail {
            actor.stream_audio(cue, false).await?;
        }
        actor.play_behavior(&self.config.behaviors.shrug).await?;
        actor.pause(self.config.timing.reveal_pause()).await?;
        let reveal = fill(
            &self.config.phrases.incorrect,
            &[("label", item.label().as_str())],
        );
        actor.say(&reveal).await?;
        actor.stream_audio(item.prompt_media(), false).await?;
        actor.pause(self.config.timing.listen_pause()).await
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = self.events {
            events.send(event);
        }
    }
}
