//! Session state types for the interview room.
//!
//! This module defines the turn-taking state machine: connection phase,
//! interviewer status, the append-only transcript and the queue cursor.
//! Transition methods are synchronous and validate the current phase; the
//! session driver decides when they run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InterviewError, Result};
use crate::question_bank::Question;
use crate::queue::QuestionQueue;

/// System message appended when the session connects.
pub const CONNECTED_MESSAGE: &str = "Interview room connected";

/// Interviewer message announcing the move to the next question.
pub const TRANSITION_MESSAGE: &str = "Great, let's move on.";

/// Interviewer message delivered once the queue is exhausted.
pub const CLOSING_MESSAGE: &str =
    "That covers our questions for today. Well done! Click \"End Interview\" to see your report.";

// ============================================================================
// Message
// ============================================================================

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The interviewer.
    Ai,
    /// The candidate.
    User,
    /// The room itself.
    System,
}

/// What a transcript entry represents within the interview flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Connection notice from the room.
    Connection,
    /// A question from the queue.
    Question,
    /// A follow-up on the current question.
    FollowUp,
    /// "Let's move on" announcement.
    Transition,
    /// Closing message after the last question.
    Closing,
    /// Candidate answer.
    Answer,
}

/// A single transcript entry. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who said it.
    pub sender: Sender,
    /// Role of the entry in the flow.
    pub kind: MessageKind,
    /// The spoken or typed text.
    pub text: String,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the current time.
    #[must_use]
    pub fn new(sender: Sender, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            sender,
            kind,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// AiStatus and SessionPhase
// ============================================================================

/// What the interviewer is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiStatus {
    /// Preparing a response.
    Thinking,
    /// Delivering a question or reply.
    Speaking,
    /// Waiting for the candidate.
    #[default]
    Listening,
}

impl std::fmt::Display for AiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Thinking => "Thinking",
            Self::Speaking => "Speaking",
            Self::Listening => "Listening",
        };
        write!(f, "{label}")
    }
}

/// Lifecycle phase of a session.
///
/// Transitions: `Disconnected` -> `Connecting` -> `Active` -> `Concluded`.
/// `Concluded` is reachable from every phase through termination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Created but not started.
    #[default]
    Disconnected,
    /// Waiting for the connection delay.
    Connecting,
    /// Conversation in progress.
    Active,
    /// Terminated; the state is read-only from here on.
    Concluded,
}

impl SessionPhase {
    /// Returns `true` if the session has been terminated.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Concluded)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Concluded => "concluded",
        };
        write!(f, "{label}")
    }
}

/// Why a session was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The candidate or host ended the interview.
    UserEnded,
    /// Proctoring lockout.
    LockedOut,
}

// ============================================================================
// SessionState
// ============================================================================

/// Complete state of one interview session.
///
/// Mutated only through the transition methods below; once `terminate` has
/// run, every transition fails and the state is retained for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    phase: SessionPhase,
    connected: bool,
    ai_status: AiStatus,
    transcript: Vec<Message>,
    queue: QuestionQueue,
    cursor: usize,
    current_question: Option<Question>,
    skills: Vec<String>,
    closing_delivered: bool,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_reason: Option<EndReason>,
}

impl SessionState {
    /// Creates a `Disconnected` state over a built queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use interview_orchestrator::{AiStatus, QuestionBank, QuestionQueue, SessionPhase, SessionState};
    ///
    /// let queue = QuestionQueue::build(&["React"], &QuestionBank::builtin());
    /// let state = SessionState::new(queue, vec!["React".to_string()]);
    /// assert_eq!(state.phase(), SessionPhase::Disconnected);
    /// assert_eq!(state.ai_status(), AiStatus::Listening);
    /// assert!(state.transcript().is_empty());
    /// assert!(state.is_personalized());
    /// ```
    #[must_use]
    pub fn new(queue: QuestionQueue, skills: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            phase: SessionPhase::Disconnected,
            connected: false,
            ai_status: AiStatus::default(),
            transcript: Vec::new(),
            queue,
            cursor: 0,
            current_question: None,
            skills,
            closing_delivered: false,
            started_at: now,
            updated_at: now,
            ended_at: None,
            end_reason: None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the room is connected.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Current interviewer status.
    #[must_use]
    pub const fn ai_status(&self) -> AiStatus {
        self.ai_status
    }

    /// The transcript in append order.
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// The session's question queue.
    #[must_use]
    pub const fn queue(&self) -> &QuestionQueue {
        &self.queue
    }

    /// Index of the active question.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The question currently being discussed, once the first one is asked.
    #[must_use]
    pub const fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    /// The skills the session was created with.
    #[must_use]
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// `true` when the session was created with at least one skill.
    #[must_use]
    pub fn is_personalized(&self) -> bool {
        !self.skills.is_empty()
    }

    /// `true` once the closing message has been delivered.
    #[must_use]
    pub const fn closing_delivered(&self) -> bool {
        self.closing_delivered
    }

    /// When the session was created.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the state last changed.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// When the session was terminated.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Why the session was terminated.
    #[must_use]
    pub const fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Returns `true` if another question follows the current one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.queue.len()
    }

    /// Progress as `(position, total)` where position is `min(cursor + 1, total)`.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        let total = self.queue.len();
        ((self.cursor + 1).min(total), total)
    }

    /// Number of follow-ups asked so far.
    #[must_use]
    pub fn follow_ups_asked(&self) -> usize {
        self.count_kind(MessageKind::FollowUp)
    }

    /// Number of distinct questions delivered so far.
    #[must_use]
    pub fn questions_asked(&self) -> usize {
        self.count_kind(MessageKind::Question)
    }

    fn count_kind(&self, kind: MessageKind) -> usize {
        self.transcript.iter().filter(|m| m.kind == kind).count()
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// `Disconnected` -> `Connecting`.
    pub fn begin_connecting(&mut self) -> Result<()> {
        self.ensure_phase(SessionPhase::Disconnected, SessionPhase::Connecting)?;
        self.phase = SessionPhase::Connecting;
        self.touch();
        Ok(())
    }

    /// `Connecting` -> `Active`: marks the room connected, appends the
    /// connection notice and starts thinking about the first question.
    pub fn mark_connected(&mut self) -> Result<()> {
        self.ensure_phase(SessionPhase::Connecting, SessionPhase::Active)?;
        self.phase = SessionPhase::Active;
        self.connected = true;
        self.push(Sender::System, MessageKind::Connection, CONNECTED_MESSAGE);
        self.ai_status = AiStatus::Thinking;
        Ok(())
    }

    /// Asks the first question in the queue.
    pub fn deliver_first_question(&mut self) -> Result<&Question> {
        self.ensure_active("first_question")?;
        if self.current_question.is_some() {
            return Err(InterviewError::invalid_transition(
                "question_delivered",
                "first_question",
            ));
        }
        let first = self
            .queue
            .get(0)
            .cloned()
            .ok_or_else(|| InterviewError::bank_invalid("session queue is empty"))?;
        self.speak_question(0, first);
        self.current_question_or_err()
    }

    /// Records a candidate utterance.
    ///
    /// Blank or whitespace-only text is ignored and returns `Ok(false)`
    /// without touching the state. Otherwise the answer is appended, the
    /// interviewer starts thinking, and `Ok(true)` is returned.
    pub fn record_utterance(&mut self, text: &str) -> Result<bool> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.ensure_active("answer")?;
        self.push(Sender::User, MessageKind::Answer, text);
        self.ai_status = AiStatus::Thinking;
        Ok(true)
    }

    /// Speaks a follow-up on the current question; the cursor stays put.
    pub fn ask_follow_up(&mut self, text: impl Into<String>) -> Result<()> {
        self.ensure_active("follow_up")?;
        self.ai_status = AiStatus::Speaking;
        self.push(Sender::Ai, MessageKind::FollowUp, text);
        Ok(())
    }

    /// Announces the move to the next question. Status is left unchanged.
    pub fn announce_transition(&mut self) -> Result<()> {
        self.ensure_active("transition")?;
        self.push(Sender::Ai, MessageKind::Transition, TRANSITION_MESSAGE);
        Ok(())
    }

    /// Advances the cursor and speaks the next question.
    ///
    /// Returns `Ok(None)` without any mutation when the queue is exhausted.
    pub fn advance_to_next_question(&mut self) -> Result<Option<&Question>> {
        self.ensure_active("next_question")?;
        if !self.has_next() {
            return Ok(None);
        }
        let next_index = self.cursor + 1;
        let Some(next) = self.queue.get(next_index).cloned() else {
            return Ok(None);
        };
        self.speak_question(next_index, next);
        Ok(self.current_question.as_ref())
    }

    /// Delivers the closing message. The session stays `Active`.
    pub fn conclude_questions(&mut self) -> Result<()> {
        self.ensure_active("closing")?;
        self.ai_status = AiStatus::Speaking;
        self.push(Sender::Ai, MessageKind::Closing, CLOSING_MESSAGE);
        self.closing_delivered = true;
        Ok(())
    }

    /// Sets the interviewer status. Returns `true` if it changed.
    pub fn set_ai_status(&mut self, status: AiStatus) -> Result<bool> {
        self.ensure_active("ai_status")?;
        if self.ai_status == status {
            return Ok(false);
        }
        self.ai_status = status;
        self.touch();
        Ok(true)
    }

    /// Terminates the session from any phase.
    ///
    /// Returns `false` if it was already terminated; the first reason wins.
    pub fn terminate(&mut self, reason: EndReason) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = SessionPhase::Concluded;
        self.connected = false;
        self.end_reason = Some(reason);
        self.ended_at = Some(Utc::now());
        self.touch();
        true
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn speak_question(&mut self, index: usize, question: Question) {
        self.cursor = index;
        self.ai_status = AiStatus::Speaking;
        self.push(Sender::Ai, MessageKind::Question, question.text.clone());
        self.current_question = Some(question);
    }

    fn current_question_or_err(&self) -> Result<&Question> {
        self.current_question
            .as_ref()
            .ok_or_else(|| InterviewError::invalid_transition(self.phase, "first_question"))
    }

    fn push(&mut self, sender: Sender, kind: MessageKind, text: impl Into<String>) {
        self.transcript.push(Message::new(sender, kind, text));
        self.touch();
    }

    fn ensure_phase(&self, expected: SessionPhase, to: SessionPhase) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(InterviewError::SessionConcluded);
        }
        if self.phase != expected {
            return Err(InterviewError::invalid_transition(self.phase, to));
        }
        Ok(())
    }

    fn ensure_active(&self, to: &str) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(InterviewError::SessionConcluded);
        }
        if self.phase != SessionPhase::Active {
            return Err(InterviewError::invalid_transition(self.phase, to));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// Tests
// ============================================================================
