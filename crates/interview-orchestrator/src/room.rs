//! The interview room: one session plus its proctoring and speech input.
//!
//! The room is what a presentation layer talks to. Every candidate
//! interaction passes the proctoring gate before it reaches the session,
//! and a background watcher turns a proctoring lockout into session
//! termination at any point of the conversation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::events::{ProctorEvent, SessionEvent};
use crate::proctor::{EnvironmentSignals, ProctorMonitor, ProctorState};
use crate::question_bank::QuestionBank;
use crate::session::InterviewSession;
use crate::session_state::{EndReason, SessionState};
use crate::transcription::{TranscriptFragment, Transcriber, UtteranceBuffer};

/// Question position shown to the candidate, e.g. `Q 1/3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// One-based position, capped at `total`.
    pub position: usize,
    /// Queue length.
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q {}/{}", self.position, self.total)
    }
}

/// Formats a countdown as `MM:SS`. Minutes are not wrapped into hours.
///
/// ```
/// use std::time::Duration;
/// use interview_orchestrator::format_countdown;
///
/// assert_eq!(format_countdown(Duration::from_secs(2700)), "45:00");
/// assert_eq!(format_countdown(Duration::from_secs(61)), "01:01");
/// ```
#[must_use]
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

struct RoomInner {
    session: InterviewSession,
    proctor: ProctorMonitor,
    environment: Arc<dyn EnvironmentSignals>,
    transcriber: Arc<dyn Transcriber>,
    buffer: Mutex<UtteranceBuffer>,
    watcher: CancellationToken,
    opened_at: Instant,
    duration: Duration,
}

/// Handle to a running interview room. Cheap to clone.
#[derive(Clone)]
pub struct InterviewRoom {
    inner: Arc<RoomInner>,
}

impl fmt::Debug for InterviewRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterviewRoom")
            .field("session", &self.inner.session)
            .field("proctor", &self.inner.proctor)
            .field("duration", &self.inner.duration)
            .finish_non_exhaustive()
    }
}

impl InterviewRoom {
    /// Composes a room and starts the proctoring watcher.
    ///
    /// The watcher runs until [`terminate`](Self::terminate) closes the room.
    pub fn open(
        session: InterviewSession,
        proctor: ProctorMonitor,
        environment: Arc<dyn EnvironmentSignals>,
        transcriber: Arc<dyn Transcriber>,
        duration: Duration,
    ) -> Self {
        let watcher = CancellationToken::new();
        let mut signals = environment.subscribe();

        {
            let proctor = proctor.clone();
            let session = session.clone();
            let transcriber = Arc::clone(&transcriber);
            let cancel = watcher.clone();
            tokio::spawn(async move {
                if proctor.watch(&mut signals, &cancel).await {
                    info!("Terminating session after proctoring lockout");
                    transcriber.stop();
                    session.terminate(EndReason::LockedOut).await;
                    // violations keep counting until the room is closed
                    proctor.watch(&mut signals, &cancel).await;
                }
                debug!("Proctor watcher stopped");
            });
        }

        Self {
            inner: Arc::new(RoomInner {
                session,
                proctor,
                environment,
                transcriber,
                buffer: Mutex::new(UtteranceBuffer::new()),
                watcher,
                opened_at: Instant::now(),
                duration,
            }),
        }
    }

    /// Starts a session from `config` and opens a room around it.
    pub fn from_config(
        config: &Config,
        bank: &QuestionBank,
        environment: Arc<dyn EnvironmentSignals>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        let session = InterviewSession::from_config(config, bank);
        let proctor = ProctorMonitor::new(config.proctoring.max_violations, config.event_capacity);
        Self::open(session, proctor, environment, transcriber, config.duration())
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Submits an answer through the proctoring gate.
    ///
    /// # Errors
    ///
    /// `LockedOut` once locked, `FullscreenRequired` while not fullscreen,
    /// `SessionConcluded` after termination.
    pub async fn submit_utterance(&self, text: &str) -> Result<bool> {
        self.inner.proctor.check_interaction().await?;
        self.inner.session.submit_utterance(text).await
    }

    /// Asks the host to enter fullscreen.
    pub fn request_fullscreen(&self) -> Result<()> {
        self.inner.environment.request_fullscreen()
    }

    /// Ends the interview. Returns `false` if it had already ended.
    pub async fn terminate(&self, reason: EndReason) -> bool {
        self.inner.transcriber.stop();
        self.inner.watcher.cancel();
        self.inner.session.terminate(reason).await
    }

    /// Starts speech input. Each final fragment submits the finalized buffer.
    ///
    /// # Errors
    ///
    /// `TranscriptionUnavailable` if the host has no speech engine; typed
    /// answers keep working.
    pub async fn start_listening(&self) -> Result<()> {
        let mut fragments = match self.inner.transcriber.start() {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(error = %e, "Speech input unavailable; typed answers still work");
                return Err(e);
            }
        };
        self.inner.buffer.lock().await.reset();
        debug!("Speech input started");

        let room = self.clone();
        let cancel = self.inner.session.cancellation_token();
        tokio::spawn(async move {
            loop {
                let fragment = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    fragment = fragments.recv() => fragment,
                };
                match fragment {
                    Some(fragment) => room.on_fragment(fragment).await,
                    None => break,
                }
            }
            debug!("Speech input stopped");
        });

        Ok(())
    }

    /// Stops speech input.
    pub fn stop_listening(&self) {
        self.inner.transcriber.stop();
    }

    async fn on_fragment(&self, fragment: TranscriptFragment) {
        let text = {
            let mut buffer = self.inner.buffer.lock().await;
            buffer.apply(&fragment);
            if !fragment.is_final {
                return;
            }
            buffer.take()
        };

        match self.submit_utterance(&text).await {
            Ok(_) => {}
            Err(e) if e.is_gating() => warn!(error = %e, "Spoken answer blocked by proctoring"),
            Err(e) => debug!(error = %e, "Spoken answer not submitted"),
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Text the speech engine may still revise.
    pub async fn interim_transcript(&self) -> String {
        self.inner.buffer.lock().await.interim().to_string()
    }

    /// Whether speech input is active.
    pub fn is_listening(&self) -> bool {
        self.inner.transcriber.is_listening()
    }

    /// Current question position.
    pub async fn progress(&self) -> Progress {
        let (position, total) = self.inner.session.snapshot().await.progress();
        Progress { position, total }
    }

    /// Countdown remaining, clamped at zero. Reaching zero does not end the session.
    pub fn time_remaining(&self) -> Duration {
        self.inner
            .duration
            .saturating_sub(self.inner.opened_at.elapsed())
    }

    /// Whether the session was created from resume skills.
    pub async fn is_personalized(&self) -> bool {
        self.inner.session.snapshot().await.is_personalized()
    }

    /// Copy of the session state.
    pub async fn snapshot(&self) -> SessionState {
        self.inner.session.snapshot().await
    }

    /// Copy of the proctoring state.
    pub async fn proctor_state(&self) -> ProctorState {
        self.inner.proctor.snapshot().await
    }

    /// Subscribes to session events.
    pub fn subscribe_session(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.session.subscribe()
    }

    /// Subscribes to proctoring events.
    pub fn subscribe_proctor(&self) -> broadcast::Receiver<ProctorEvent> {
        self.inner.proctor.subscribe()
    }

    /// The underlying session.
    pub fn session(&self) -> &InterviewSession {
        &self.inner.session
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Pacing;
    use crate::error::InterviewError;
    use crate::events::EventBroadcaster;
    use crate::policy::Branch;
    use crate::proctor::SimulatedEnvironment;
    use crate::question_bank::Question;
    use crate::queue::QuestionQueue;
    use crate::session_state::{AiStatus, MessageKind, SessionPhase};
    use crate::transcription::{ChannelTranscriber, UnavailableTranscriber};
    use tokio::time::sleep;

    const OPENED: Duration = Duration::from_millis(5400);

    fn room_with(
        skills: &[&str],
        transcriber: Arc<dyn Transcriber>,
    ) -> (InterviewRoom, Arc<SimulatedEnvironment>) {
        let queue = QuestionQueue::build(skills, &QuestionBank::builtin());
        let skills = skills.iter().map(|s| (*s).to_string()).collect();
        let session = InterviewSession::start(
            SessionState::new(queue, skills),
            Pacing::default(),
            Box::new(|_: &Question, _: bool| Branch::Advance),
            EventBroadcaster::new(64),
        );
        let env = Arc::new(SimulatedEnvironment::new());
        let room = InterviewRoom::open(
            session,
            ProctorMonitor::default(),
            env.clone(),
            transcriber,
            Duration::from_secs(2700),
        );
        (room, env)
    }

    async fn settle() {
        sleep(Duration::from_millis(1)).await;
    }

    // ------------------------------------------------------------------------
    // Gating
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_submit_requires_fullscreen() {
        let (room, _env) = room_with(&["React"], Arc::new(UnavailableTranscriber));
        sleep(OPENED).await;

        let err = room.submit_utterance("answer").await.unwrap_err();
        assert!(matches!(err, InterviewError::FullscreenRequired { remaining_warnings: 3 }));

        room.request_fullscreen().unwrap();
        settle().await;
        assert!(room.submit_utterance("answer").await.unwrap());
        assert!(!room.submit_utterance("  ").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_fullscreen_reports_remaining_warnings() {
        let (room, env) = room_with(&["React"], Arc::new(UnavailableTranscriber));
        env.set_fullscreen(true);
        env.set_fullscreen(false);
        settle().await;

        let state = room.proctor_state().await;
        assert_eq!(state.violation_count(), 1);
        assert!(matches!(
            room.submit_utterance("answer").await,
            Err(InterviewError::FullscreenRequired { remaining_warnings: 2 })
        ));
    }

    // ------------------------------------------------------------------------
    // Lockout
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_three_hidden_events_lock_out_and_end_session() {
        let (room, env) = room_with(&["React"], Arc::new(UnavailableTranscriber));
        let mut proctor_rx = room.subscribe_proctor();
        env.set_fullscreen(true);
        sleep(OPENED).await;

        for _ in 0..3 {
            env.set_hidden(true);
            env.set_hidden(false);
        }
        settle().await;

        let proctor = room.proctor_state().await;
        assert_eq!(proctor.violation_count(), 3);
        assert!(proctor.is_locked());

        let state = room.snapshot().await;
        assert_eq!(state.phase(), SessionPhase::Concluded);
        assert_eq!(state.end_reason(), Some(EndReason::LockedOut));

        assert!(matches!(
            room.submit_utterance("answer").await,
            Err(InterviewError::LockedOut { violation_count: 3 })
        ));

        let lockouts = std::iter::from_fn(|| proctor_rx.try_recv().ok())
            .filter(|e| matches!(e, ProctorEvent::LockedOut(_)))
            .count();
        assert_eq!(lockouts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockout_stops_speech_input() {
        let (transcriber, feeder) = ChannelTranscriber::with_feeder();
        let (room, env) = room_with(&["React"], Arc::new(transcriber));
        env.set_fullscreen(true);
        sleep(OPENED).await;
        room.start_listening().await.unwrap();
        assert!(room.is_listening());

        for _ in 0..3 {
            env.set_hidden(true);
            env.set_hidden(false);
        }
        sleep(Duration::from_secs(1)).await;

        assert_eq!(room.snapshot().await.end_reason(), Some(EndReason::LockedOut));
        assert!(!room.is_listening());
        assert!(!feeder.finalize("too late"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signals_after_lockout_keep_counting() {
        let (room, env) = room_with(&["React"], Arc::new(UnavailableTranscriber));
        for _ in 0..3 {
            env.set_hidden(true);
            env.set_hidden(false);
        }
        settle().await;
        assert_eq!(room.snapshot().await.end_reason(), Some(EndReason::LockedOut));

        env.set_hidden(true);
        settle().await;
        let proctor = room.proctor_state().await;
        assert_eq!(proctor.violation_count(), 4);
        assert!(proctor.is_locked());

        room.terminate(EndReason::UserEnded).await;
        env.set_hidden(false);
        env.set_hidden(true);
        settle().await;
        assert_eq!(room.proctor_state().await.violation_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockout_mid_thinking_cancels_response() {
        let (room, env) = room_with(&["React", "Python"], Arc::new(UnavailableTranscriber));
        env.set_fullscreen(true);
        sleep(OPENED).await;

        room.submit_utterance("answer").await.unwrap();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(room.snapshot().await.ai_status(), AiStatus::Thinking);
        let before = room.snapshot().await.transcript().len();

        env.set_fullscreen(false);
        env.set_hidden(true);
        env.set_hidden(false);
        env.set_hidden(true);
        sleep(Duration::from_secs(30)).await;

        let state = room.snapshot().await;
        assert_eq!(state.transcript().len(), before);
        assert_eq!(state.end_reason(), Some(EndReason::LockedOut));
        assert_eq!(state.cursor(), 0);
    }

    // ------------------------------------------------------------------------
    // Speech input
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_final_fragment_submits_buffer() {
        let (transcriber, feeder) = ChannelTranscriber::with_feeder();
        let (room, env) = room_with(&["React"], Arc::new(transcriber));
        env.set_fullscreen(true);
        sleep(OPENED).await;

        room.start_listening().await.unwrap();
        assert!(room.is_listening());

        feeder.interim("controlled comp");
        settle().await;
        assert_eq!(room.interim_transcript().await, "controlled comp");

        feeder.finalize("controlled components keep state in React");
        sleep(Duration::from_millis(100)).await;

        let state = room.snapshot().await;
        let answer = state.transcript().last().unwrap();
        assert_eq!(answer.kind, MessageKind::Answer);
        assert_eq!(answer.text, "controlled components keep state in React");
        assert_eq!(room.interim_transcript().await, "");

        room.stop_listening();
        assert!(!room.is_listening());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_speech_keeps_typing_working() {
        let (room, env) = room_with(&["React"], Arc::new(UnavailableTranscriber));
        env.set_fullscreen(true);
        sleep(OPENED).await;

        let err = room.start_listening().await.unwrap_err();
        assert!(matches!(err, InterviewError::TranscriptionUnavailable { .. }));
        assert!(room.submit_utterance("typed answer").await.unwrap());
    }

    // ------------------------------------------------------------------------
    // Queries and termination
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_countdown_and_progress() {
        let (room, _env) = room_with(&["React", "Python"], Arc::new(UnavailableTranscriber));
        assert_eq!(room.time_remaining(), Duration::from_secs(2700));

        sleep(Duration::from_secs(100)).await;
        assert_eq!(format_countdown(room.time_remaining()), "43:20");
        assert_eq!(room.progress().await.to_string(), "Q 1/2");
        assert!(room.is_personalized().await);

        sleep(Duration::from_secs(5000)).await;
        assert_eq!(room.time_remaining(), Duration::ZERO);
        assert_eq!(format_countdown(room.time_remaining()), "00:00");
        assert!(!room.snapshot().await.phase().is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminate_is_idempotent_and_stops_speech() {
        let (transcriber, _feeder) = ChannelTranscriber::with_feeder();
        let (room, _env) = room_with(&[], Arc::new(transcriber));
        room.start_listening().await.unwrap();

        assert!(room.terminate(EndReason::UserEnded).await);
        assert!(!room.terminate(EndReason::UserEnded).await);
        assert!(!room.is_listening());
        assert!(!room.is_personalized().await);
        assert_eq!(room.snapshot().await.end_reason(), Some(EndReason::UserEnded));
    }
}
