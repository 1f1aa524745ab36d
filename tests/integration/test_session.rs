//! End-to-end session tests.
//!
//! Every test runs on paused tokio time so the interviewer's pacing delays
//! elapse instantly and deterministically.

use std::path::PathBuf;
use std::time::Duration;

use futures::StreamExt;
use interview_orchestrator::{
    into_stream, AiStatus, Branch, BranchPolicy, Config, Difficulty, EndReason, EventBroadcaster,
    InterviewError, InterviewSession, MessageKind, Pacing, Question, QuestionBank, QuestionQueue,
    SessionPhase, SessionState, CLOSING_MESSAGE,
};
use tokio::time::sleep;
use tokio_test::{assert_err, assert_ok};

/// Opening sequence length with default pacing, plus slack.
const OPENED: Duration = Duration::from_millis(5400);

/// One full advance cycle with default pacing, plus slack.
const ADVANCE_CYCLE: Duration = Duration::from_millis(7800);

/// One follow-up or closing cycle with default pacing, plus slack.
const REPLY_CYCLE: Duration = Duration::from_millis(4600);

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn always(branch: Branch) -> impl BranchPolicy + 'static {
    move |_: &Question, _: bool| branch.clone()
}

fn start(skills: &[&str], policy: impl BranchPolicy + 'static) -> InterviewSession {
    let queue = QuestionQueue::build(skills, &QuestionBank::builtin());
    let skills = skills.iter().map(|s| (*s).to_string()).collect();
    InterviewSession::start(
        SessionState::new(queue, skills),
        Pacing::default(),
        Box::new(policy),
        EventBroadcaster::default(),
    )
}

fn ai_texts(state: &SessionState) -> Vec<String> {
    state
        .transcript()
        .iter()
        .filter(|m| matches!(m.kind, MessageKind::Question | MessageKind::FollowUp))
        .map(|m| m.text.clone())
        .collect()
}

// ============================================================================
// Queue building
// ============================================================================

#[test]
fn test_matched_skills_take_first_question_in_request_order() {
    let queue = QuestionQueue::build(&["React", "Data Structures"], &QuestionBank::builtin());

    let ids: Vec<u32> = queue.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![1, 5]);
    assert!(!queue.is_fallback());
}

#[test]
fn test_unknown_skills_are_skipped() {
    let queue = QuestionQueue::build(&["COBOL", "Python", "react"], &QuestionBank::builtin());

    let ids: Vec<u32> = queue.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![6]);
}

#[test]
fn test_empty_skills_use_default_queue() {
    let bank = QuestionBank::builtin();
    let queue = QuestionQueue::build::<&str>(&[], &bank);

    assert!(queue.is_fallback());
    assert_eq!(queue.len(), 2);
    let ids: Vec<u32> = queue.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![99, 100]);
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_two_skill_session_asks_both_in_order() {
    let session = start(&["React", "Data Structures"], always(Branch::Advance));
    sleep(OPENED).await;

    let state = session.snapshot().await;
    assert_eq!(state.current_question().map(|q| q.id), Some(1));
    assert_eq!(state.ai_status(), AiStatus::Listening);
    assert!(state.is_personalized());

    assert_ok!(session.submit_utterance("Controlled inputs keep state in React.").await);
    sleep(ADVANCE_CYCLE).await;

    let state = session.snapshot().await;
    assert_eq!(state.cursor(), 1);
    assert_eq!(state.current_question().map(|q| q.id), Some(5));
    assert_eq!(state.progress(), (2, 2));
    assert_eq!(state.ai_status(), AiStatus::Listening);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_session_opens_with_background_question() {
    let session = start(&[], always(Branch::Advance));
    sleep(OPENED).await;

    let state = session.snapshot().await;
    assert!(!state.is_personalized());
    assert_eq!(state.queue().len(), 2);
    assert_eq!(
        ai_texts(&state),
        vec!["Tell me about yourself and your most challenging technical project."]
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_question_concludes_and_stays_put() {
    let session = start(&["Python"], always(Branch::Advance));
    sleep(OPENED).await;

    assert_ok!(session.submit_utterance("Generators are lazy.").await);
    sleep(REPLY_CYCLE).await;

    let state = session.snapshot().await;
    let last = state.transcript().last().map(|m| (m.kind, m.text.clone()));
    assert_eq!(last, Some((MessageKind::Closing, CLOSING_MESSAGE.to_string())));
    assert!(state.closing_delivered());
    assert_eq!(state.phase(), SessionPhase::Active);
    assert_eq!(state.ai_status(), AiStatus::Listening);

    for answer in ["One more thing.", "And another."] {
        assert_ok!(session.submit_utterance(answer).await);
        sleep(REPLY_CYCLE).await;
        let state = session.snapshot().await;
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.questions_asked(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_terminate_mid_thinking_freezes_transcript() {
    let session = start(&["React", "Python"], always(Branch::Advance));
    sleep(OPENED).await;

    assert_ok!(session.submit_utterance("An answer.").await);
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(session.snapshot().await.ai_status(), AiStatus::Thinking);

    let before = session.snapshot().await.transcript().len();
    assert!(session.terminate(EndReason::UserEnded).await);
    sleep(Duration::from_secs(60)).await;

    let state = session.snapshot().await;
    assert_eq!(state.transcript().len(), before);
    assert_eq!(state.phase(), SessionPhase::Concluded);
    assert_eq!(state.cursor(), 0);
    assert!(state.ended_at().is_some());

    let err = assert_err!(session.submit_utterance("Too late.").await);
    assert!(matches!(err, InterviewError::SessionConcluded));
}

#[tokio::test(start_paused = true)]
async fn test_follow_up_then_advance() {
    let mut calls = 0;
    let policy = move |question: &Question, _: bool| {
        calls += 1;
        if calls == 1 {
            Branch::FollowUp(question.follow_ups[0].clone())
        } else {
            Branch::Advance
        }
    };
    let session = start(&["React", "Python"], policy);
    sleep(OPENED).await;

    assert_ok!(session.submit_utterance("First answer.").await);
    sleep(REPLY_CYCLE).await;
    let state = session.snapshot().await;
    assert_eq!(state.cursor(), 0);
    assert_eq!(state.follow_ups_asked(), 1);

    assert_ok!(session.submit_utterance("Follow-up answer.").await);
    sleep(ADVANCE_CYCLE).await;
    let state = session.snapshot().await;
    assert_eq!(state.cursor(), 1);
    assert_eq!(
        ai_texts(&state)[1],
        "How do refs relate to uncontrolled components?"
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_utterances_are_ignored() {
    let session = start(&["React"], always(Branch::Advance));
    sleep(OPENED).await;
    let before = session.snapshot().await;

    for blank in ["", "   ", "\t\n"] {
        assert!(!assert_ok!(session.submit_utterance(blank).await));
    }
    sleep(REPLY_CYCLE).await;

    let after = session.snapshot().await;
    assert_eq!(after.transcript().len(), before.transcript().len());
    assert_eq!(after.ai_status(), AiStatus::Listening);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_event_stream_mirrors_transcript() {
    let events = EventBroadcaster::default();
    let stream = into_stream(events.subscribe());
    let queue = QuestionQueue::build(&["Go"], &QuestionBank::builtin());
    let session = InterviewSession::start(
        SessionState::new(queue, vec!["Go".to_string()]),
        Pacing::default(),
        Box::new(always(Branch::Advance)),
        events,
    );
    sleep(OPENED).await;
    session.terminate(EndReason::UserEnded).await;

    let names: Vec<&str> = stream
        .take(8)
        .map(|e| e.event_name())
        .collect()
        .await;
    assert_eq!(
        names,
        vec![
            "connected",
            "message_appended",
            "ai_status_changed",
            "question_changed",
            "message_appended",
            "ai_status_changed",
            "ai_status_changed",
            "session_ended",
        ]
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_fixture_config_loads() {
    let config = Config::load_from_file(&fixture_path().join("interview.json"))
        .expect("Failed to load config");

    assert_eq!(config.skills, vec!["Rust", "Go", "Kotlin"]);
    assert_eq!(config.difficulty, Difficulty::Hard);
    assert_eq!(config.topic, "Backend");
    assert_eq!(config.duration(), Duration::from_secs(1800));
    assert_eq!(config.pacing.connect_delay_ms, 100);
    assert_eq!(config.rng_seed, Some(7));
    assert_eq!(config.event_capacity, 64);
}

#[test]
fn test_fixture_question_bank_builds_queue() {
    let bank = QuestionBank::load_from_file(&fixture_path().join("question-bank.json"))
        .expect("Failed to load question bank");

    let queue = QuestionQueue::build(&["Rust", "Go", "Kotlin"], &bank);
    let ids: Vec<u32> = queue.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(queue.get(1).map(|q| q.difficulty), Some(Difficulty::Easy));

    let fallback = QuestionQueue::build(&["Kotlin"], &bank);
    assert!(fallback.is_fallback());
    assert_eq!(fallback.get(0).map(|q| q.id), Some(90));
}

#[tokio::test(start_paused = true)]
async fn test_seeded_sessions_are_reproducible() {
    let mut config = Config::load_from_file(&fixture_path().join("interview.json"))
        .expect("Failed to load config");
    config.question_bank = Some(fixture_path().join("question-bank.json"));
    let bank = config.load_question_bank().expect("Failed to load bank");

    let mut transcripts = Vec::new();
    for _ in 0..2 {
        let session = InterviewSession::from_config(&config, &bank);
        sleep(Duration::from_secs(1)).await;
        for answer in ["one", "two", "three", "four"] {
            assert_ok!(session.submit_utterance(answer).await);
            sleep(Duration::from_secs(2)).await;
        }
        let state = session.snapshot().await;
        session.terminate(EndReason::UserEnded).await;
        transcripts.push(ai_texts(&state));
    }

    assert_eq!(transcripts[0], transcripts[1]);
    assert!(transcripts[0].len() >= 2);
}
