//! Interview session driver.
//!
//! An [`InterviewSession`] is a cheap, cloneable handle over one running
//! session. A single driver task owns the conversational timeline: it opens
//! the session, then takes candidate utterances one at a time from a command
//! queue and plays out the interviewer's response with cancellable delays.
//! Utterances submitted while a response is still playing out wait in the
//! queue until the interviewer is listening again.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, Pacing};
use crate::error::{InterviewError, Result};
use crate::events::{EventBroadcaster, SessionEvent};
use crate::policy::{Branch, BranchPolicy};
use crate::question_bank::QuestionBank;
use crate::queue::QuestionQueue;
use crate::schedule::Scheduler;
use crate::session_state::{AiStatus, EndReason, SessionState};

#[derive(Debug)]
enum Command {
    Utterance(String),
}

/// Handle to a running interview session.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    state: Arc<Mutex<SessionState>>,
    commands: mpsc::UnboundedSender<Command>,
    events: EventBroadcaster<SessionEvent>,
    scheduler: Scheduler,
}

impl InterviewSession {
    /// Starts a session and spawns its driver on the current tokio runtime.
    ///
    /// Subscribe to `events` before calling this to observe the opening
    /// transitions when pacing is very short.
    pub fn start(
        state: SessionState,
        pacing: Pacing,
        policy: Box<dyn BranchPolicy>,
        events: EventBroadcaster<SessionEvent>,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let session = Self {
            state: Arc::new(Mutex::new(state)),
            commands,
            events,
            scheduler: Scheduler::new(),
        };

        let driver = Driver {
            state: Arc::clone(&session.state),
            events: session.events.clone(),
            scheduler: session.scheduler.clone(),
            pacing,
            policy,
            commands: receiver,
        };
        tokio::spawn(driver.run());

        session
    }

    /// Builds the queue from `config.skills` and starts a session.
    pub fn from_config(config: &Config, bank: &QuestionBank) -> Self {
        let queue = QuestionQueue::build(&config.skills, bank);
        info!(
            skills = config.skills.len(),
            questions = queue.len(),
            fallback = queue.is_fallback(),
            "Starting interview session"
        );
        Self::start(
            SessionState::new(queue, config.skills.clone()),
            config.pacing,
            Box::new(config.branch_policy()),
            EventBroadcaster::new(config.event_capacity),
        )
    }

    /// Submits a candidate utterance.
    ///
    /// Blank text is dropped and returns `Ok(false)`. Otherwise the utterance
    /// is queued for the driver and `Ok(true)` is returned.
    ///
    /// # Errors
    ///
    /// `SessionConcluded` if the session has been terminated.
    pub async fn submit_utterance(&self, text: &str) -> Result<bool> {
        if text.trim().is_empty() {
            debug!("Dropped blank utterance");
            return Ok(false);
        }
        if self.is_terminated().await {
            return Err(InterviewError::SessionConcluded);
        }
        self.commands
            .send(Command::Utterance(text.to_string()))
            .map_err(|_| InterviewError::SessionConcluded)?;
        debug!(chars = text.len(), "Queued utterance");
        Ok(true)
    }

    /// Terminates the session.
    ///
    /// Pending transitions are cancelled before the state is concluded, so
    /// nothing scheduled earlier can land afterwards. Returns `false` if the
    /// session was already terminated.
    pub async fn terminate(&self, reason: EndReason) -> bool {
        self.scheduler.cancel();
        let mut state = self.state.lock().await;
        if !state.terminate(reason) {
            return false;
        }
        info!(
            reason = ?reason,
            messages = state.transcript().len(),
            cursor = state.cursor(),
            "Interview session ended"
        );
        self.events.send(SessionEvent::session_ended(reason));
        true
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Returns `true` once the session has been terminated.
    pub async fn is_terminated(&self) -> bool {
        self.scheduler.is_cancelled() || self.state.lock().await.phase().is_terminal()
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Token cancelled when the session terminates.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.scheduler.token()
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Observable fields compared before and after each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    connected: bool,
    ai_status: AiStatus,
    transcript_len: usize,
    cursor: usize,
    has_question: bool,
}

impl Marker {
    fn of(state: &SessionState) -> Self {
        Self {
            connected: state.is_connected(),
            ai_status: state.ai_status(),
            transcript_len: state.transcript().len(),
            cursor: state.cursor(),
            has_question: state.current_question().is_some(),
        }
    }
}

struct Driver {
    state: Arc<Mutex<SessionState>>,
    events: EventBroadcaster<SessionEvent>,
    scheduler: Scheduler,
    pacing: Pacing,
    policy: Box<dyn BranchPolicy>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Driver {
    async fn run(mut self) {
        match self.drive().await {
            Ok(()) => debug!("Session driver finished: all handles dropped"),
            Err(InterviewError::Cancelled | InterviewError::SessionConcluded) => {
                debug!("Session driver stopped: session terminated");
            }
            Err(e) => warn!(error = %e, "Session driver failed"),
        }
    }

    async fn drive(&mut self) -> Result<()> {
        self.open().await?;

        let token = self.scheduler.token();
        loop {
            let command = tokio::select! {
                biased;
                () = token.cancelled() => return Err(InterviewError::Cancelled),
                command = self.commands.recv() => command,
            };

            match command {
                Some(Command::Utterance(text)) => self.respond(&text).await?,
                None => return Ok(()),
            }
        }
    }

    /// Connects, asks the first question and starts listening.
    async fn open(&mut self) -> Result<()> {
        self.update(SessionState::begin_connecting).await?;

        self.scheduler.after(self.pacing.connect()).await?;
        self.update(SessionState::mark_connected).await?;
        info!("Interview room connected");

        self.scheduler.after(self.pacing.question()).await?;
        self.update(|s| s.deliver_first_question().map(|_| ())).await?;

        self.scheduler.after(self.pacing.speaking()).await?;
        self.set_status(AiStatus::Listening).await
    }

    /// Plays out one answer cycle, ending in `Listening`.
    async fn respond(&mut self, text: &str) -> Result<()> {
        if !self.update(|s| s.record_utterance(text)).await? {
            return Ok(());
        }

        self.scheduler.after(self.pacing.thinking()).await?;

        let (question, has_next) = {
            let state = self.state.lock().await;
            (state.current_question().cloned(), state.has_next())
        };
        let Some(question) = question else {
            return self.set_status(AiStatus::Listening).await;
        };

        let branch = match self.policy.choose(&question, has_next) {
            Branch::Advance if !has_next => Branch::Conclude,
            branch => branch,
        };
        debug!(question = question.id, branch = ?branch, "Response decided");

        match branch {
            Branch::FollowUp(follow_up) => {
                self.update(|s| s.ask_follow_up(follow_up)).await?;
                self.scheduler.after(self.pacing.reply()).await?;
            }
            Branch::Advance => {
                self.update(SessionState::announce_transition).await?;
                self.scheduler.after(self.pacing.transition()).await?;
                self.set_status(AiStatus::Thinking).await?;
                self.scheduler.after(self.pacing.question()).await?;
                self.update(|s| s.advance_to_next_question().map(|_| ()))
                    .await?;
                self.scheduler.after(self.pacing.speaking()).await?;
            }
            Branch::Conclude => {
                self.update(SessionState::conclude_questions).await?;
                info!("All questions covered");
                self.scheduler.after(self.pacing.reply()).await?;
            }
        }

        self.set_status(AiStatus::Listening).await
    }

    async fn set_status(&mut self, status: AiStatus) -> Result<()> {
        self.update(|s| s.set_ai_status(status).map(|_| ())).await
    }

    /// Applies a transition under the state lock and publishes what changed.
    ///
    /// Fails with `Cancelled` if the session was terminated, so a transition
    /// never lands after termination.
    async fn update<T>(
        &mut self,
        apply: impl FnOnce(&mut SessionState) -> Result<T> + Send,
    ) -> Result<T> {
        let mut state = self.state.lock().await;
        if self.scheduler.is_cancelled() || state.phase().is_terminal() {
            return Err(InterviewError::Cancelled);
        }

        let before = Marker::of(&state);
        let value = apply(&mut state)?;
        self.publish(before, &state);
        Ok(value)
    }

    fn publish(&self, before: Marker, state: &SessionState) {
        let after = Marker::of(state);
        if before == after {
            return;
        }

        if !before.connected && after.connected {
            self.events.send(SessionEvent::connected());
        }

        if after.has_question && (!before.has_question || before.cursor != after.cursor) {
            if let Some(question) = state.current_question() {
                debug!(cursor = after.cursor, question = question.id, "Question changed");
                self.events.send(SessionEvent::question_changed(
                    after.cursor,
                    state.queue().len(),
                    question.clone(),
                ));
            }
        }

        for (index, message) in state
            .transcript()
            .iter()
            .enumerate()
            .skip(before.transcript_len)
        {
            self.events
                .send(SessionEvent::message_appended(index, message.clone()));
        }

        if before.ai_status != after.ai_status {
            debug!(status = %after.ai_status, "AI status changed");
            self.events
                .send(SessionEvent::ai_status_changed(after.ai_status));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
