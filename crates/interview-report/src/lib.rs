//! Interview Room Report Generation
//!
//! This crate turns the retained transcript of a finished (or abandoned)
//! interview into a post-session report. Reports can be serialized to JSON
//! for programmatic access or rendered to Markdown for the candidate.
//!
//! # Types
//!
//! - [`SessionRecord`] - Everything the report needs from a session
//! - [`Report`] - The complete report structure
//! - [`ReportSummary`] - Headline numbers for the session
//! - [`QuestionTurn`] - One queue question with its follow-ups and answers
//! - [`ProctoringSummary`] - Violation count and lockout flag
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - Generate JSON reports with compact or pretty formatting
//! - [`MarkdownGenerator`] - Generate human-readable Markdown reports
//!
//! # Example
//!
//! ```rust
//! use interview_report::{EntryKind, Report, ReportStatus, SessionRecord, Speaker, TranscriptEntry};
//! use interview_report::json::JsonGenerator;
//!
//! let record = SessionRecord {
//!     skills: vec!["React".to_string()],
//!     queue_length: 1,
//!     transcript: vec![
//!         TranscriptEntry::now(Speaker::Ai, EntryKind::Question, "What are hooks?"),
//!         TranscriptEntry::now(Speaker::User, EntryKind::Answer, "Functions for state."),
//!     ],
//!     ..SessionRecord::default()
//! };
//!
//! let report = Report::from_session(&record);
//! assert_eq!(report.summary.status, ReportStatus::InProgress);
//! assert_eq!(report.turns[0].answers, vec!["Functions for state."]);
//!
//! let json = JsonGenerator::new(&report).generate_pretty().unwrap();
//! assert!(json.contains("\"questions_asked\": 1"));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Session record (local copies to avoid cross-crate dependency)
// ============================================================================

/// Author of a transcript entry.
///
/// Local copy of the orchestrator's `Sender` so the report crate stays
/// independent of the session runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The interviewer.
    Ai,
    /// The candidate.
    User,
    /// The room itself.
    System,
}

impl Speaker {
    /// Label used in rendered transcripts.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ai => "Interviewer",
            Self::User => "Candidate",
            Self::System => "System",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Role of a transcript entry. Local copy of the orchestrator's `MessageKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Connection notice.
    Connection,
    /// A queue question.
    Question,
    /// A follow-up on the current question.
    FollowUp,
    /// Move-on announcement.
    Transition,
    /// Closing message after the last question.
    Closing,
    /// Candidate answer.
    Answer,
}

/// One line of the interview transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who said it.
    pub speaker: Speaker,
    /// Role of the entry.
    pub kind: EntryKind,
    /// The text.
    pub text: String,
    /// When it was appended.
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    /// Creates an entry with an explicit timestamp.
    #[must_use]
    pub fn new(
        speaker: Speaker,
        kind: EntryKind,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            speaker,
            kind,
            text: text.into(),
            timestamp,
        }
    }

    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn now(speaker: Speaker, kind: EntryKind, text: impl Into<String>) -> Self {
        Self::new(speaker, kind, text, Utc::now())
    }
}

/// Why a session ended. Local copy of the orchestrator's `EndReason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The candidate ended the interview.
    UserEnded,
    /// Proctoring locked the candidate out.
    LockedOut,
}

/// Everything a report is built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Requested skills; empty means the default question set was used.
    pub skills: Vec<String>,
    /// Difficulty label chosen for the session.
    pub difficulty: String,
    /// Topic label chosen for the session.
    pub topic: String,
    /// Number of questions in the queue.
    pub queue_length: usize,
    /// Full transcript in order.
    pub transcript: Vec<TranscriptEntry>,
    /// Whether the closing message was delivered.
    pub closing_delivered: bool,
    /// When the session started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the session ended, if it has.
    pub ended_at: Option<DateTime<Utc>>,
    /// How the session ended, if it has.
    pub end: Option<SessionEnd>,
    /// Proctoring outcome.
    pub proctoring: ProctoringSummary,
}

// ============================================================================
// Report Status
// ============================================================================

/// Overall outcome of the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Session still running when the report was generated.
    #[default]
    InProgress,
    /// Every queued question was covered and the closing message delivered.
    Completed,
    /// Ended by the candidate before the closing message.
    EndedEarly,
    /// Ended by a proctoring lockout.
    LockedOut,
}

impl ReportStatus {
    /// Derives the status from a session record. Lockout wins over everything.
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Self {
        if record.end == Some(SessionEnd::LockedOut) || record.proctoring.locked_out {
            Self::LockedOut
        } else if record.closing_delivered {
            Self::Completed
        } else if record.end.is_some() {
            Self::EndedEarly
        } else {
            Self::InProgress
        }
    }

    /// Returns `true` if the interview ran to its closing message.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns a human-readable description of the status.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InProgress => "Interview in progress",
            Self::Completed => "Interview completed",
            Self::EndedEarly => "Interview ended early",
            Self::LockedOut => "Locked out by proctoring",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Report
// ============================================================================

/// Complete interview report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Headline numbers.
    pub summary: ReportSummary,

    /// Queue questions in the order they were asked.
    pub turns: Vec<QuestionTurn>,

    /// Full transcript.
    pub transcript: Vec<TranscriptEntry>,

    /// Proctoring outcome.
    pub proctoring: ProctoringSummary,
}

impl Report {
    /// Builds a report from a session record.
    ///
    /// Each queue question opens a turn; follow-ups and answers attach to
    /// the most recent turn. Answers given before the first question are
    /// counted but belong to no turn.
    #[must_use]
    pub fn from_session(record: &SessionRecord) -> Self {
        let mut turns: Vec<QuestionTurn> = Vec::new();
        let mut follow_ups_asked = 0;
        let mut answers_given = 0;

        for entry in &record.transcript {
            match entry.kind {
                EntryKind::Question => {
                    let number = turns.len() + 1;
                    turns.push(QuestionTurn::new(number, entry.text.clone()));
                }
                EntryKind::FollowUp => {
                    follow_ups_asked += 1;
                    if let Some(turn) = turns.last_mut() {
                        turn.follow_ups.push(entry.text.clone());
                    }
                }
                EntryKind::Answer => {
                    answers_given += 1;
                    if let Some(turn) = turns.last_mut() {
                        turn.answers.push(entry.text.clone());
                    }
                }
                EntryKind::Connection | EntryKind::Transition | EntryKind::Closing => {}
            }
        }

        let summary = ReportSummary {
            status: ReportStatus::from_record(record),
            questions_asked: turns.len(),
            queue_length: record.queue_length,
            follow_ups_asked,
            answers_given,
            duration_seconds: duration_seconds(record.started_at, record.ended_at),
            violations: record.proctoring.violation_count,
            personalized: !record.skills.is_empty(),
            skills: record.skills.clone(),
            difficulty: record.difficulty.clone(),
            topic: record.topic.clone(),
        };

        Self {
            summary,
            turns,
            transcript: record.transcript.clone(),
            proctoring: record.proctoring,
        }
    }

    /// Serializes the report to JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Serialization` if JSON serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ReportError::from)
    }

    /// Returns `true` if any asked question got no answer.
    #[must_use]
    pub fn has_unanswered_questions(&self) -> bool {
        self.turns.iter().any(|t| t.answers.is_empty())
    }
}

fn duration_seconds(started: Option<DateTime<Utc>>, ended: Option<DateTime<Utc>>) -> u64 {
    match (started, ended) {
        (Some(start), Some(end)) => u64::try_from((end - start).num_seconds()).unwrap_or(0),
        _ => 0,
    }
}

// ============================================================================
// ReportSummary
// ============================================================================

/// Headline numbers for one interview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Overall outcome.
    pub status: ReportStatus,

    /// Queue questions actually asked.
    pub questions_asked: usize,

    /// Queue length at session start.
    pub queue_length: usize,

    /// Follow-up prompts asked.
    pub follow_ups_asked: usize,

    /// Candidate answers recorded.
    pub answers_given: usize,

    /// Wall-clock duration in seconds; zero while in progress.
    pub duration_seconds: u64,

    /// Proctoring violations recorded.
    pub violations: u32,

    /// Whether the queue came from resume skills.
    pub personalized: bool,

    /// Requested skills.
    pub skills: Vec<String>,

    /// Difficulty label.
    pub difficulty: String,

    /// Topic label.
    pub topic: String,
}

// ============================================================================
// QuestionTurn
// ============================================================================

/// One queue question and what followed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTurn {
    /// One-based position in the interview.
    pub number: usize,
    /// The question text.
    pub question: String,
    /// Follow-ups asked on this question.
    pub follow_ups: Vec<String>,
    /// Candidate answers while this question was current.
    pub answers: Vec<String>,
}

impl QuestionTurn {
    /// Creates a turn with no follow-ups or answers.
    #[must_use]
    pub fn new(number: usize, question: impl Into<String>) -> Self {
        Self {
            number,
            question: question.into(),
            follow_ups: Vec::new(),
            answers: Vec::new(),
        }
    }
}

// ============================================================================
// ProctoringSummary
// ============================================================================

/// Proctoring outcome for the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProctoringSummary {
    /// Violations recorded.
    pub violation_count: u32,
    /// Limit that triggers the lockout.
    pub max_violations: u32,
    /// Whether the lockout triggered.
    pub locked_out: bool,
}

// ============================================================================
// Tests
// ============================================================================
