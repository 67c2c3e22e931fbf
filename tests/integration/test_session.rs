//! End-to-end session tests for Quizbot
//!
//! These tests drive complete sessions through the orchestrator with a
//! scripted actor and a seeded question draw, then check the transcript,
//! the report, and the event stream.

use std::path::PathBuf;

use quizbot_engine::{
    EndReason, EventBroadcaster, Intent, QuizConfig, Reaction, Reply, ScoreState, ScriptedActor,
    SessionEvent, SessionOrchestrator, SessionState, Timing,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const SEED: u64 = 2024;

/// Path to the piano fixture directory.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/piano")
}

/// Default guitar-note content with pauses disabled.
fn guitar_config() -> QuizConfig {
    QuizConfig {
        timing: Timing::none(),
        ..QuizConfig::default()
    }
}

fn session(config: QuizConfig) -> SessionOrchestrator {
    SessionOrchestrator::new(config)
        .expect("Failed to create session")
        .with_rng(StdRng::seed_from_u64(SEED))
}

/// Labels the session will draw for its first round.
fn first_round_labels(config: &QuizConfig) -> Vec<String> {
    let bank = config.question_bank().expect("Failed to build bank");
    bank.draw(config.rounds, &mut StdRng::seed_from_u64(SEED))
        .expect("Failed to draw round")
        .items()
        .iter()
        .map(|item| item.label().to_string())
        .collect()
}

/// Index of the first intent after the consent question.
fn after_consent(actor: &ScriptedActor) -> usize {
    actor
        .intents()
        .iter()
        .position(|intent| matches!(intent, Intent::Ask { .. }))
        .expect("Consent question was never asked")
        + 1
}

/// Scenario A: every answer correct earns the celebratory reaction.
#[tokio::test]
async fn test_all_correct_round_celebrates() {
    let config = guitar_config();
    let answers: Vec<String> = first_round_labels(&config)
        .into_iter()
        .map(|label| format!("  {} ", label.to_lowercase()))
        .collect();
    let mut session = session(config);
    let mut actor = ScriptedActor::new()
        .with_replies(["yes"])
        .with_replies(answers)
        .with_replies(["no"]);

    let report = session.run(&mut actor).await.expect("Session failed");

    assert_eq!(report.score, ScoreState { correct: 5, total: 5 });
    assert!(session.tracker().meets_bar(0.5));
    assert_eq!(report.last_reaction(), Some(Reaction::Celebratory));
    assert_eq!(report.end_reason, Some(EndReason::Finished));
    assert!(actor.behaviors().contains(&"BlocklyRobotDance"));
    assert_eq!(
        actor
            .behaviors()
            .iter()
            .filter(|name| **name == "BlocklyApplause")
            .count(),
        5
    );
    assert!(actor
        .spoken()
        .contains(&"5 is a really good score by the way, you're getting the hang of this! Let's celebrate!"));
    assert_eq!(actor.remaining_replies(), 0);
}

/// Scenario B: two correct and three unrecognized answers fall short of the bar.
#[tokio::test]
async fn test_partial_round_encourages() {
    let config = guitar_config();
    let labels = first_round_labels(&config);
    let mut session = session(config);
    let mut actor = ScriptedActor::new()
        .with_replies(["ja"])
        .with_replies(labels[..2].iter().cloned());
    for _ in 0..3 {
        actor = actor.with_reply(Reply::Unrecognized);
    }
    actor = actor.with_replies(["nay"]);

    let report = session.run(&mut actor).await.expect("Session failed");

    assert_eq!(report.score, ScoreState { correct: 2, total: 5 });
    assert!(!session.tracker().meets_bar(0.5));
    assert_eq!(report.last_reaction(), Some(Reaction::Encouraging));
    assert!(!actor.behaviors().contains(&"BlocklyRobotDance"));
    assert!(actor.spoken().contains(
        &"2 is not a bad start, you will get there next time. Let's aim for a better score next time!"
    ));
    assert!(actor
        .questions()
        .contains(&"You scored 2 out of 5, would you like to play again?"));
}

/// Scenario C: declining at the consent gate ends the session at once.
#[tokio::test]
async fn test_declined_consent_ends_session() {
    let events = EventBroadcaster::new(32);
    let mut receiver = events.subscribe();
    let mut session = session(guitar_config()).with_events(events);
    let mut actor = ScriptedActor::new().with_replies(["Nay"]);

    let report = session.run(&mut actor).await.expect("Session failed");

    assert_eq!(report.state, SessionState::Ended);
    assert_eq!(report.end_reason, Some(EndReason::Declined));
    assert!(report.rounds.is_empty());
    assert_eq!(report.score, ScoreState::default());

    let rest = &actor.intents()[after_consent(&actor)..];
    assert_eq!(
        rest,
        &[
            Intent::Say {
                text: "Oh, well maybe some other time.".into()
            },
            Intent::EndSession,
        ]
    );

    let mut transitions = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        if let SessionEvent::StateChanged(payload) = event {
            transitions.push((payload.from, payload.to));
        }
    }
    assert_eq!(
        transitions,
        vec![
            (SessionState::Intro, SessionState::Consent),
            (SessionState::Consent, SessionState::Ended),
        ]
    );
}

/// Scenario D: an unrecognized replay answer ends with an apology.
#[tokio::test]
async fn test_unrecognized_replay_answer_ends_session() {
    let mut session = session(guitar_config());
    let mut actor = ScriptedActor::new().with_replies(["yes"]);
    for _ in 0..5 {
        actor = actor.with_reply(Reply::Unrecognized);
    }
    actor = actor.with_replies(["maybe"]);

    let report = session.run(&mut actor).await.expect("Session failed");

    assert_eq!(report.end_reason, Some(EndReason::NotHeard));
    assert_eq!(report.rounds.len(), 1);
    assert_eq!(
        actor.spoken().last(),
        Some(&"Sorry, but I didn't hear you properly.")
    );
    assert_eq!(actor.intents().last(), Some(&Intent::EndSession));
}

/// Playing again keeps counting by default.
#[tokio::test]
async fn test_replay_keeps_cumulative_score() {
    let config = guitar_config();
    let labels = first_round_labels(&config);
    let mut session = session(config);
    let mut actor = ScriptedActor::new()
        .with_replies(["yes"])
        .with_replies(labels)
        .with_replies(["yes"])
        .with_replies(["x", "x", "x", "x", "x"])
        .with_replies(["no"]);

    let report = session.run(&mut actor).await.expect("Session failed");

    assert_eq!(report.rounds.len(), 2);
    assert_eq!(report.rounds[1].round, 2);
    assert_eq!(report.rounds[1].summary.correct_this_round, 0);
    assert_eq!(report.score, ScoreState { correct: 5, total: 10 });
    // The showcase only runs before the first round.
    assert_eq!(
        actor
            .behaviors()
            .iter()
            .filter(|name| **name == "BlocklyArmsForward")
            .count(),
        5
    );
}

/// An actor that drops mid-round gets no further intents.
#[tokio::test]
async fn test_actor_disconnect_mid_round() {
    let events = EventBroadcaster::new(64);
    let mut receiver = events.subscribe();
    // intro (5) + consent (1) + showcase (2 + 5 * 5) + first question up to the reveal pause (7)
    let mut session = session(guitar_config()).with_events(events);
    let mut actor = ScriptedActor::new().with_replies(["yes"]).failing_after(40);

    let err = session
        .run(&mut actor)
        .await
        .expect_err("Session should fail when the actor disconnects");

    assert!(err.is_actor_failure());
    assert_eq!(session.state(), SessionState::Ended);
    assert_eq!(session.end_reason(), Some(EndReason::ActorUnavailable));
    // The interrupted round scored one answer, which is not kept.
    assert_eq!(session.tracker().total_count(), 0);
    assert!(session.report().rounds.is_empty());
    assert_eq!(actor.intents().len(), 40);
    assert!(matches!(actor.intents().last(), Some(Intent::Pause { .. })));
    assert!(!actor.intents().contains(&Intent::EndSession));

    let mut last = None;
    while let Ok(event) = receiver.try_recv() {
        last = Some(event);
    }
    match last {
        Some(SessionEvent::SessionEnded(payload)) => {
            assert_eq!(payload.reason, EndReason::ActorUnavailable);
            assert_eq!(payload.score, ScoreState::default());
        }
        other => panic!("Expected session_ended as the last event, got {other:?}"),
    }
}

/// The event stream follows one round question by question.
#[tokio::test]
async fn test_event_stream_for_one_round() {
    let config = QuizConfig {
        max_replays: Some(0),
        ..guitar_config()
    };
    let events = EventBroadcaster::new(128);
    let mut receiver = events.subscribe();
    let mut session = session(config).with_events(events);
    let mut actor = ScriptedActor::new().with_replies(["yes"]);

    let report = session.run(&mut actor).await.expect("Session failed");
    assert_eq!(report.end_reason, Some(EndReason::Finished));

    let mut names = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        names.push(event.event_name());
    }
    let count = |name: &str| names.iter().filter(|n| **n == name).count();
    assert_eq!(count("question_presented"), 5);
    assert_eq!(count("answer_scored"), 5);
    assert_eq!(count("round_complete"), 1);
    assert_eq!(count("state_changed"), 5);
    assert_eq!(names.last(), Some(&"session_ended"));
}

/// A custom content file drives the whole session.
#[tokio::test]
async fn test_piano_fixture_session() {
    let config = QuizConfig::load_from_dir(&fixture_path()).expect("Failed to load fixture");
    assert_eq!(config.rounds, 3);
    assert_eq!(config.max_replays, Some(1));

    let labels = first_round_labels(&config);
    let mut session = session(config);
    let mut actor = ScriptedActor::new()
        .with_replies(["YES"])
        .with_replies(labels)
        .with_replies(["jes"])
        .with_replies(["dough"]);

    let report = session.run(&mut actor).await.expect("Session failed");

    // Reset policy: only the second round counts, and the replay cap ends it.
    assert_eq!(report.rounds.len(), 2);
    assert_eq!(report.score.total, 3);
    assert_eq!(report.end_reason, Some(EndReason::Finished));
    assert_eq!(report.rounds[0].reaction, Some(Reaction::Celebratory));
    assert!(actor.behaviors().contains(&"BlocklyDab"));
    assert!(actor
        .questions()
        .contains(&"That makes 3 of 3. Another round?"));
    assert_eq!(actor.spoken()[0], "Welcome to the piano corner.");
    assert!(!actor
        .intents()
        .iter()
        .any(|intent| matches!(intent, Intent::StreamAudio { resource, .. } if resource.starts_with("https://"))));
    assert_eq!(
        actor.questions().iter().filter(|q| q.contains("Another round?")).count(),
        1
    );
}

/// Answer cards shown to the camera score like spoken answers.
#[tokio::test]
async fn test_marker_card_answers() {
    let config = QuizConfig::load_from_dir(&fixture_path()).expect("Failed to load fixture");
    let bank = config.question_bank().expect("Failed to build bank");
    let markers: Vec<u32> = bank
        .draw(config.rounds, &mut StdRng::seed_from_u64(SEED))
        .expect("Failed to draw round")
        .items()
        .iter()
        .map(|item| item.marker().expect("Fixture item has no marker"))
        .collect();

    let mut session = session(config);
    let mut actor = ScriptedActor::new()
        .with_replies(["yes"])
        .with_reply(Reply::Marker(markers[0]))
        .with_reply(Reply::Marker(markers[0]))
        .with_reply(Reply::Marker(markers[2]))
        .with_reply(Reply::Marker(markers[0]));

    let report = session.run(&mut actor).await.expect("Session failed");

    assert_eq!(report.score, ScoreState { correct: 2, total: 3 });
    assert_eq!(report.last_reaction(), Some(Reaction::Celebratory));
    // Cards are not yes or no, so a card at the replay gate is not heard.
    assert_eq!(report.end_reason, Some(EndReason::NotHeard));
    assert_eq!(actor.remaining_replies(), 0);
}

/// The session report serializes with the end reason and every round.
#[tokio::test]
async fn test_report_serialization() {
    let mut session = session(guitar_config());
    let mut actor = ScriptedActor::new().with_replies(["yes", "A", "C", "D", "E", "G", "no"]);

    let report = session.run(&mut actor).await.expect("Session failed");
    let json = serde_json::to_value(&report).expect("Failed to serialize report");

    assert_eq!(json["state"], "ended");
    assert_eq!(json["end_reason"], "finished");
    assert_eq!(json["score"]["total"], 5);
    assert_eq!(json["rounds"].as_array().map(Vec::len), Some(1));
    assert!(json["ended_at"].is_string());
}
