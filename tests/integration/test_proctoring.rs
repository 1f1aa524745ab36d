//! Proctoring tests across the monitor, the room and the session.

use std::sync::Arc;
use std::time::Duration;

use interview_orchestrator::{
    context_menu_policy, AiStatus, Branch, ContextMenuPolicy, EndReason, EnvironmentSignal,
    EventBroadcaster, InterviewError, InterviewRoom, InterviewSession, MessageKind, Pacing, ProctorEvent,
    ProctorMonitor, Question, QuestionBank, QuestionQueue, SessionPhase, SessionState,
    SimulatedEnvironment, UnavailableTranscriber, ViolationSource,
};
use tokio::time::sleep;
use tokio_test::{assert_err, assert_ok};

const OPENED: Duration = Duration::from_millis(5400);

fn open_room(skills: &[&str]) -> (InterviewRoom, Arc<SimulatedEnvironment>) {
    let queue = QuestionQueue::build(skills, &QuestionBank::builtin());
    let skills = skills.iter().map(|s| (*s).to_string()).collect();
    let session = InterviewSession::start(
        SessionState::new(queue, skills),
        Pacing::default(),
        Box::new(|_: &Question, _: bool| Branch::Advance),
        EventBroadcaster::default(),
    );
    let environment = Arc::new(SimulatedEnvironment::new());
    let room = InterviewRoom::open(
        session,
        ProctorMonitor::default(),
        environment.clone(),
        Arc::new(UnavailableTranscriber),
        Duration::from_secs(2700),
    );
    (room, environment)
}

async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

// ============================================================================
// Monitor
// ============================================================================

#[tokio::test]
async fn test_three_hidden_events_lock_out() {
    let monitor = ProctorMonitor::default();
    let mut events = monitor.subscribe();

    for expected in 1..=3 {
        let update = monitor
            .handle(EnvironmentSignal::VisibilityChanged { is_hidden: true })
            .await;
        assert_eq!(update.violation, Some(ViolationSource::VisibilityHidden));
        assert_eq!(update.locked_now, expected == 3);
    }

    let state = monitor.snapshot().await;
    assert_eq!(state.violation_count(), 3);
    assert!(state.is_locked());
    assert_eq!(state.remaining_warnings(), 0);

    let names: Vec<&str> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.event_name())
        .collect();
    assert_eq!(
        names,
        vec![
            "violation_recorded",
            "violation_recorded",
            "violation_recorded",
            "locked_out",
        ]
    );
}

#[tokio::test]
async fn test_violations_keep_counting_after_lock() {
    let monitor = ProctorMonitor::default();
    for _ in 0..5 {
        monitor
            .handle(EnvironmentSignal::VisibilityChanged { is_hidden: true })
            .await;
    }
    let state = monitor.snapshot().await;
    assert_eq!(state.violation_count(), 5);
    assert!(state.is_locked());
}

#[tokio::test]
async fn test_fullscreen_exit_counts_only_from_fullscreen() {
    let monitor = ProctorMonitor::default();

    monitor
        .handle(EnvironmentSignal::FullscreenChanged { in_fullscreen: false })
        .await;
    assert_eq!(monitor.snapshot().await.violation_count(), 0);

    monitor
        .handle(EnvironmentSignal::FullscreenChanged { in_fullscreen: true })
        .await;
    let update = monitor
        .handle(EnvironmentSignal::FullscreenChanged { in_fullscreen: false })
        .await;
    assert_eq!(update.violation, Some(ViolationSource::FullscreenExited));
    assert_eq!(monitor.snapshot().await.violation_count(), 1);
}

#[test]
fn test_context_menu_is_always_denied() {
    assert_eq!(context_menu_policy(), ContextMenuPolicy::Deny);
    let environment = SimulatedEnvironment::new();
    assert_eq!(environment.open_context_menu(), ContextMenuPolicy::Deny);
}

// ============================================================================
// Room
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_answers_gated_until_fullscreen() {
    let (room, _environment) = open_room(&["React"]);
    sleep(OPENED).await;

    let err = assert_err!(room.submit_utterance("An answer.").await);
    assert!(matches!(
        err,
        InterviewError::FullscreenRequired { remaining_warnings: 3 }
    ));
    assert!(err.is_gating());
    assert!(err.to_string().contains("Suggestion:"));

    assert_ok!(room.request_fullscreen());
    settle().await;
    assert!(room.proctor_state().await.fullscreen_active());
    assert!(assert_ok!(room.submit_utterance("An answer.").await));
}

#[tokio::test(start_paused = true)]
async fn test_lockout_mid_delay_ends_session() {
    let (room, environment) = open_room(&["React", "Python"]);
    let mut proctor_events = room.subscribe_proctor();
    environment.set_fullscreen(true);
    sleep(OPENED).await;

    assert_ok!(room.submit_utterance("An answer.").await);
    sleep(Duration::from_millis(2500)).await;
    // transition announced, next question not yet asked
    let state = room.snapshot().await;
    assert_eq!(state.ai_status(), AiStatus::Thinking);
    assert_eq!(state.transcript().last().map(|m| m.kind), Some(MessageKind::Transition));
    let before = state.transcript().len();

    for _ in 0..3 {
        environment.set_hidden(true);
        environment.set_hidden(false);
    }
    sleep(Duration::from_secs(30)).await;

    let state = room.snapshot().await;
    assert_eq!(state.phase(), SessionPhase::Concluded);
    assert_eq!(state.end_reason(), Some(EndReason::LockedOut));
    assert_eq!(state.transcript().len(), before);
    assert_eq!(state.cursor(), 0);

    let err = assert_err!(room.submit_utterance("Let me in.").await);
    assert!(matches!(err, InterviewError::LockedOut { violation_count: 3 }));

    let lockouts = std::iter::from_fn(|| proctor_events.try_recv().ok())
        .filter(|e| matches!(e, ProctorEvent::LockedOut(_)))
        .count();
    assert_eq!(lockouts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_user_end_is_not_a_lockout() {
    let (room, environment) = open_room(&[]);
    environment.set_fullscreen(true);
    sleep(OPENED).await;

    assert!(room.terminate(EndReason::UserEnded).await);
    environment.set_hidden(true);
    settle().await;

    let state = room.snapshot().await;
    assert_eq!(state.end_reason(), Some(EndReason::UserEnded));
    // watcher stops once the room is terminated
    assert_eq!(room.proctor_state().await.violation_count(), 0);
}
