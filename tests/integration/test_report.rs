//! Report generation from real sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use interview_orchestrator::{
    Config, EndReason, InterviewRoom, MessageKind, ProctorState, Sender, SessionState,
    SimulatedEnvironment, UnavailableTranscriber,
};
use interview_report::{
    json::JsonGenerator, EntryKind, MarkdownGenerator, ProctoringSummary, Report, ReportStatus,
    SessionEnd, SessionRecord, Speaker, TranscriptEntry,
};
use tokio::time::sleep;
use tokio_test::assert_ok;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn fixture_config() -> Config {
    let mut config = Config::load_from_file(&fixture_path().join("interview.json"))
        .expect("Failed to load config");
    config.question_bank = Some(fixture_path().join("question-bank.json"));
    config
}

fn record_from(state: &SessionState, proctor: &ProctorState, config: &Config) -> SessionRecord {
    SessionRecord {
        skills: state.skills().to_vec(),
        difficulty: config.difficulty.to_string(),
        topic: config.topic.clone(),
        queue_length: state.queue().len(),
        transcript: state
            .transcript()
            .iter()
            .map(|m| {
                let speaker = match m.sender {
                    Sender::Ai => Speaker::Ai,
                    Sender::User => Speaker::User,
                    Sender::System => Speaker::System,
                };
                let kind = match m.kind {
                    MessageKind::Connection => EntryKind::Connection,
                    MessageKind::Question => EntryKind::Question,
                    MessageKind::FollowUp => EntryKind::FollowUp,
                    MessageKind::Transition => EntryKind::Transition,
                    MessageKind::Closing => EntryKind::Closing,
                    MessageKind::Answer => EntryKind::Answer,
                };
                TranscriptEntry::new(speaker, kind, m.text.clone(), m.timestamp)
            })
            .collect(),
        closing_delivered: state.closing_delivered(),
        started_at: Some(state.started_at()),
        ended_at: state.ended_at(),
        end: state.end_reason().map(|reason| match reason {
            EndReason::UserEnded => SessionEnd::UserEnded,
            EndReason::LockedOut => SessionEnd::LockedOut,
        }),
        proctoring: ProctoringSummary {
            violation_count: proctor.violation_count(),
            max_violations: proctor.max_violations(),
            locked_out: proctor.is_locked(),
        },
    }
}

/// Answers until the closing message is delivered.
async fn run_to_completion(room: &InterviewRoom) {
    for i in 0..10 {
        if room.snapshot().await.closing_delivered() {
            return;
        }
        assert_ok!(room.submit_utterance(&format!("answer {i}")).await);
        sleep(Duration::from_secs(2)).await;
    }
    panic!("interview never reached its closing message");
}

#[tokio::test(start_paused = true)]
async fn test_completed_session_report() {
    let config = fixture_config();
    let bank = config.load_question_bank().expect("Failed to load bank");
    let environment = Arc::new(SimulatedEnvironment::new());
    let room = InterviewRoom::from_config(
        &config,
        &bank,
        environment.clone(),
        Arc::new(UnavailableTranscriber),
    );
    environment.set_fullscreen(true);
    sleep(Duration::from_secs(1)).await;

    run_to_completion(&room).await;
    environment.set_hidden(true);
    environment.set_hidden(false);
    sleep(Duration::from_millis(10)).await;
    assert!(room.terminate(EndReason::UserEnded).await);

    let state = room.snapshot().await;
    let proctor = room.proctor_state().await;
    let report = Report::from_session(&record_from(&state, &proctor, &config));

    assert_eq!(report.summary.status, ReportStatus::Completed);
    assert_eq!(report.summary.questions_asked, 2);
    assert_eq!(report.summary.queue_length, 2);
    assert_eq!(report.summary.violations, 1);
    assert_eq!(report.summary.difficulty, "Hard");
    assert_eq!(report.summary.topic, "Backend");
    assert!(report.summary.personalized);
    assert_eq!(report.turns[0].question, "What problem does the borrow checker solve?");
    assert_eq!(report.turns[1].question, "How do goroutines differ from OS threads?");
    assert!(!report.has_unanswered_questions());
    assert_eq!(
        report.summary.answers_given,
        report.turns.iter().map(|t| t.answers.len()).sum::<usize>()
    );

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("# Interview Report: Rust, Go, Kotlin"));
    assert!(markdown.contains("| Status | Interview completed |"));
    assert!(markdown.contains("### Q2: How do goroutines differ from OS threads?"));

    let json = JsonGenerator::new(&report).generate().expect("Failed to serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");
    assert_eq!(value["summary"]["status"], "completed");
    assert_eq!(value["proctoring"]["violation_count"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_locked_out_session_report() {
    let config = fixture_config();
    let bank = config.load_question_bank().expect("Failed to load bank");
    let environment = Arc::new(SimulatedEnvironment::new());
    let room = InterviewRoom::from_config(
        &config,
        &bank,
        environment.clone(),
        Arc::new(UnavailableTranscriber),
    );
    environment.set_fullscreen(true);
    sleep(Duration::from_secs(1)).await;
    assert_ok!(room.submit_utterance("A first answer.").await);

    environment.set_fullscreen(false);
    environment.set_hidden(true);
    environment.set_hidden(false);
    environment.set_hidden(true);
    sleep(Duration::from_secs(5)).await;

    let state = room.snapshot().await;
    let proctor = room.proctor_state().await;
    let report = Report::from_session(&record_from(&state, &proctor, &config));

    assert_eq!(report.summary.status, ReportStatus::LockedOut);
    assert_eq!(report.summary.violations, 3);
    assert!(report.proctoring.locked_out);
    assert_eq!(report.summary.answers_given, 1);

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("**Locked out** after 3 violations."));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_session_report_is_ended_early() {
    let config = fixture_config();
    let bank = config.load_question_bank().expect("Failed to load bank");
    let room = InterviewRoom::from_config(
        &config,
        &bank,
        Arc::new(SimulatedEnvironment::new()),
        Arc::new(UnavailableTranscriber),
    );
    sleep(Duration::from_secs(1)).await;
    room.terminate(EndReason::UserEnded).await;

    let state = room.snapshot().await;
    let proctor = room.proctor_state().await;
    let report = Report::from_session(&record_from(&state, &proctor, &config));

    assert_eq!(report.summary.status, ReportStatus::EndedEarly);
    assert_eq!(report.summary.answers_given, 0);
    assert!(report.has_unanswered_questions());
}
