//! Speech transcription boundary.
//!
//! A [`Transcriber`] turns speech into a stream of interim and final
//! fragments. The room keeps an [`UtteranceBuffer`] per session: interim
//! text is replaced on every update, final text accumulates until the
//! buffer is taken and submitted as an answer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{InterviewError, Result};

/// One recognition result from the speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptFragment {
    /// `true` once the engine will not revise this text.
    pub is_final: bool,
    /// Recognised text.
    pub text: String,
}

impl TranscriptFragment {
    /// Creates an interim fragment.
    #[must_use]
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            is_final: false,
            text: text.into(),
        }
    }

    /// Creates a final fragment.
    #[must_use]
    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            is_final: true,
            text: text.into(),
        }
    }
}

/// Speech-to-text capability.
pub trait Transcriber: Send + Sync {
    /// Starts listening and returns the fragment stream.
    ///
    /// # Errors
    ///
    /// `TranscriptionUnavailable` when the host has no speech engine.
    fn start(&self) -> Result<mpsc::UnboundedReceiver<TranscriptFragment>>;

    /// Stops listening; the fragment stream ends.
    fn stop(&self);

    /// Whether the engine is currently listening.
    fn is_listening(&self) -> bool;
}

// ============================================================================
// UtteranceBuffer
// ============================================================================

/// Accumulates fragments into the text of one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtteranceBuffer {
    interim: String,
    finalized: String,
}

impl UtteranceBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a fragment.
    ///
    /// Interim text overwrites the previous interim text. Final text is
    /// appended with a trailing space and clears the interim display.
    pub fn apply(&mut self, fragment: &TranscriptFragment) {
        if fragment.is_final {
            self.finalized.push_str(&fragment.text);
            self.finalized.push(' ');
            self.interim.clear();
        } else {
            self.interim.clone_from(&fragment.text);
        }
    }

    /// Text the engine may still revise.
    #[must_use]
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Finalized text so far, space-joined.
    #[must_use]
    pub fn finalized(&self) -> &str {
        &self.finalized
    }

    /// `true` if no finalized text is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.finalized.trim().is_empty()
    }

    /// Returns the trimmed finalized text and clears the buffer.
    pub fn take(&mut self) -> String {
        let text = self.finalized.trim().to_string();
        self.reset();
        text
    }

    /// Clears interim and finalized text.
    pub fn reset(&mut self) {
        self.interim.clear();
        self.finalized.clear();
    }
}

// ============================================================================
// Implementations
// ============================================================================

/// Transcriber for hosts without a speech engine. `start` always fails.
#[derive(Debug, Clone, Default)]
pub struct UnavailableTranscriber;

impl Transcriber for UnavailableTranscriber {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<TranscriptFragment>> {
        Err(InterviewError::transcription_unavailable(
            "no speech recognition engine on this host",
        ))
    }

    fn stop(&self) {}

    fn is_listening(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct ChannelInner {
    listening: AtomicBool,
    sender: Mutex<Option<mpsc::UnboundedSender<TranscriptFragment>>>,
}

impl ChannelInner {
    fn replace_sender(&self, sender: Option<mpsc::UnboundedSender<TranscriptFragment>>) {
        let mut slot = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = sender;
    }
}

/// Transcriber fed by a [`TranscriptFeeder`] instead of a microphone.
#[derive(Debug, Clone)]
pub struct ChannelTranscriber {
    inner: Arc<ChannelInner>,
}

/// Pushes fragments into a [`ChannelTranscriber`] while it is listening.
#[derive(Debug, Clone)]
pub struct TranscriptFeeder {
    inner: Arc<ChannelInner>,
}

impl ChannelTranscriber {
    /// Creates a transcriber and the feeder that drives it.
    #[must_use]
    pub fn with_feeder() -> (Self, TranscriptFeeder) {
        let inner = Arc::new(ChannelInner::default());
        let feeder = TranscriptFeeder {
            inner: Arc::clone(&inner),
        };
        (Self { inner }, feeder)
    }
}

impl Transcriber for ChannelTranscriber {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<TranscriptFragment>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.replace_sender(Some(tx));
        self.inner.listening.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    fn stop(&self) {
        self.inner.listening.store(false, Ordering::SeqCst);
        self.inner.replace_sender(None);
    }

    fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }
}

impl TranscriptFeeder {
    /// Delivers a fragment. Returns `false` if the transcriber is not listening.
    pub fn push(&self, fragment: TranscriptFragment) -> bool {
        let slot = self
            .inner
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().is_some_and(|tx| tx.send(fragment).is_ok())
    }

    /// Delivers an interim fragment.
    pub fn interim(&self, text: impl Into<String>) -> bool {
        self.push(TranscriptFragment::interim(text))
    }

    /// Delivers a final fragment.
    pub fn finalize(&self, text: impl Into<String>) -> bool {
        self.push(TranscriptFragment::finalized(text))
    }
}
