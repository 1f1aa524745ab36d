//! Event types and broadcasting for observing an interview room.
//!
//! The session and the proctoring monitor each publish their own event
//! stream. Events are serialized as JSON objects with `event` and `payload`
//! fields so a presentation layer can consume them without knowing the
//! Rust types.
//!
//! # Session events
//!
//! - `connected` - The room connected
//! - `ai_status_changed` - Interviewer status changed
//! - `message_appended` - A transcript entry was appended
//! - `question_changed` - The cursor moved to a new question
//! - `session_ended` - The session was terminated
//!
//! # Proctoring events
//!
//! - `fullscreen_changed` - Fullscreen entered or left
//! - `violation_recorded` - An integrity violation was counted
//! - `locked_out` - The violation limit was reached
//!
//! # Example
//!
//! ```
//! use interview_orchestrator::events::{EventBroadcaster, SessionEvent};
//! use interview_orchestrator::AiStatus;
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(100);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(SessionEvent::ai_status_changed(AiStatus::Thinking));
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {}", event.event_name());
//! }
//! # }
//! ```

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use crate::proctor::ViolationSource;
use crate::question_bank::Question;
use crate::session_state::{AiStatus, EndReason, Message};

// ============================================================================
// Session Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedPayload {
    /// When the room connected.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `ai_status_changed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiStatusPayload {
    /// The new status.
    pub status: AiStatus,
}

/// Payload for the `message_appended` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Position of the message in the transcript.
    pub index: usize,
    /// The appended message.
    pub message: Message,
}

/// Payload for the `question_changed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    /// Index of the new current question.
    pub cursor: usize,
    /// Total questions in the queue.
    pub queue_length: usize,
    /// The new current question.
    pub question: Question,
}

/// Payload for the `session_ended` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndedPayload {
    /// Why the session ended.
    pub reason: EndReason,
}

// ============================================================================
// Session Event Enum
// ============================================================================

/// Events published by an interview session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The room connected.
    Connected(ConnectedPayload),
    /// Interviewer status changed.
    AiStatusChanged(AiStatusPayload),
    /// A transcript entry was appended.
    MessageAppended(MessagePayload),
    /// The current question changed.
    QuestionChanged(QuestionPayload),
    /// The session was terminated.
    SessionEnded(SessionEndedPayload),
}

impl SessionEvent {
    /// Creates a `Connected` event stamped now.
    #[must_use]
    pub fn connected() -> Self {
        Self::Connected(ConnectedPayload {
            timestamp: Utc::now(),
        })
    }

    /// Creates an `AiStatusChanged` event.
    #[must_use]
    pub const fn ai_status_changed(status: AiStatus) -> Self {
        Self::AiStatusChanged(AiStatusPayload { status })
    }

    /// Creates a `MessageAppended` event.
    #[must_use]
    pub const fn message_appended(index: usize, message: Message) -> Self {
        Self::MessageAppended(MessagePayload { index, message })
    }

    /// Creates a `QuestionChanged` event.
    #[must_use]
    pub const fn question_changed(cursor: usize, queue_length: usize, question: Question) -> Self {
        Self::QuestionChanged(QuestionPayload {
            cursor,
            queue_length,
            question,
        })
    }

    /// Creates a `SessionEnded` event.
    #[must_use]
    pub const fn session_ended(reason: EndReason) -> Self {
        Self::SessionEnded(SessionEndedPayload { reason })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::AiStatusChanged(_) => "ai_status_changed",
            Self::MessageAppended(_) => "message_appended",
            Self::QuestionChanged(_) => "question_changed",
            Self::SessionEnded(_) => "session_ended",
        }
    }
}

// ============================================================================
// Proctoring Events
// ============================================================================

/// Payload for the `fullscreen_changed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullscreenPayload {
    /// Whether the room is now fullscreen.
    pub fullscreen_active: bool,
}

/// Payload for the `violation_recorded` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationPayload {
    /// Total violations so far.
    pub violation_count: u32,
    /// Violations left before lockout.
    pub remaining_warnings: u32,
    /// What caused the violation.
    pub source: ViolationSource,
}

/// Payload for the `locked_out` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedOutPayload {
    /// Violation count when the lockout happened.
    pub violation_count: u32,
}

/// Events published by the proctoring monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ProctorEvent {
    /// Fullscreen was entered or left.
    FullscreenChanged(FullscreenPayload),
    /// A violation was counted.
    ViolationRecorded(ViolationPayload),
    /// The violation limit was reached. Sent once per session.
    LockedOut(LockedOutPayload),
}

impl ProctorEvent {
    /// Creates a `FullscreenChanged` event.
    #[must_use]
    pub const fn fullscreen_changed(fullscreen_active: bool) -> Self {
        Self::FullscreenChanged(FullscreenPayload { fullscreen_active })
    }

    /// Creates a `ViolationRecorded` event.
    #[must_use]
    pub const fn violation_recorded(
        violation_count: u32,
        remaining_warnings: u32,
        source: ViolationSource,
    ) -> Self {
        Self::ViolationRecorded(ViolationPayload {
            violation_count,
            remaining_warnings,
            source,
        })
    }

    /// Creates a `LockedOut` event.
    #[must_use]
    pub const fn locked_out(violation_count: u32) -> Self {
        Self::LockedOut(LockedOutPayload { violation_count })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::FullscreenChanged(_) => "fullscreen_changed",
            Self::ViolationRecorded(_) => "violation_recorded",
            Self::LockedOut(_) => "locked_out",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts events to every subscriber.
///
/// Uses a tokio broadcast channel for pub-sub distribution. Events are not
/// retained for subscribers that join later.
#[derive(Debug, Clone)]
pub struct EventBroadcaster<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBroadcaster<E> {
    /// Creates a new `EventBroadcaster` with the specified buffer capacity.
    ///
    /// The buffer determines how many events can be queued per subscriber
    /// before old events are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a new subscriber for receiving events.
    ///
    /// If a subscriber falls behind it receives a `Lagged` error and misses
    /// some events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Broadcasts an event to all current subscribers.
    ///
    /// Returns the number of receivers. Zero means nobody is listening.
    pub fn send(&self, event: E) -> usize {
        // send() only fails when there are no receivers
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone> Default for EventBroadcaster<E> {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Adapts a broadcast receiver into a `Stream`.
///
/// Lagged receivers log a warning and keep going; the stream ends when the
/// broadcaster is dropped.
pub fn into_stream<E>(receiver: broadcast::Receiver<E>) -> impl Stream<Item = E>
where
    E: Clone + Send + 'static,
{
    futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => return Some((event, receiver)),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "Event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
