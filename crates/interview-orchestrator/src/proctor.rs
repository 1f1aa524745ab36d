//! Proctoring: environment integrity tracking and lockout.
//!
//! The monitor runs independently of the conversation. It counts fullscreen
//! exits and visibility losses, gates interaction while the room is not
//! fullscreen, and locks the session out once the violation limit is hit.
//! Host signals arrive through the [`EnvironmentSignals`] capability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::error::{InterviewError, Result};
use crate::events::{EventBroadcaster, ProctorEvent};

/// Violations allowed before lockout unless configured otherwise.
pub const DEFAULT_MAX_VIOLATIONS: u32 = 3;

// ============================================================================
// Signals
// ============================================================================

/// What caused a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSource {
    /// The room left fullscreen.
    FullscreenExited,
    /// The room became hidden (tab switch, minimise).
    VisibilityHidden,
}

impl std::fmt::Display for ViolationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullscreenExited => write!(f, "left fullscreen"),
            Self::VisibilityHidden => write!(f, "window hidden"),
        }
    }
}

/// A change reported by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum EnvironmentSignal {
    /// Fullscreen was entered or left.
    FullscreenChanged {
        /// Whether the room is now fullscreen.
        in_fullscreen: bool,
    },
    /// The room was hidden or shown.
    VisibilityChanged {
        /// Whether the room is now hidden.
        is_hidden: bool,
    },
    /// The candidate tried to open the context menu.
    ContextMenuRequested,
}

/// Decision for context-menu requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuPolicy {
    /// Let the menu open.
    Allow,
    /// Suppress the menu.
    Deny,
}

/// Context menus are always suppressed inside the room.
#[must_use]
pub const fn context_menu_policy() -> ContextMenuPolicy {
    ContextMenuPolicy::Deny
}

/// Host capability that reports integrity signals and can enter fullscreen.
pub trait EnvironmentSignals: Send + Sync {
    /// Subscribes to signals in arrival order.
    fn subscribe(&self) -> broadcast::Receiver<EnvironmentSignal>;

    /// Asks the host to enter fullscreen.
    fn request_fullscreen(&self) -> Result<()>;
}

/// In-process environment driven by explicit calls.
///
/// Like a browser host it only emits a signal when the observed value
/// actually changes.
#[derive(Debug)]
pub struct SimulatedEnvironment {
    fullscreen: AtomicBool,
    hidden: AtomicBool,
    signals: broadcast::Sender<EnvironmentSignal>,
}

impl Default for SimulatedEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEnvironment {
    /// Creates an environment that starts windowed and visible.
    #[must_use]
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(64);
        Self {
            fullscreen: AtomicBool::new(false),
            hidden: AtomicBool::new(false),
            signals,
        }
    }

    /// Sets fullscreen, emitting a signal if it changed.
    pub fn set_fullscreen(&self, in_fullscreen: bool) {
        if self.fullscreen.swap(in_fullscreen, Ordering::SeqCst) != in_fullscreen {
            let _ = self
                .signals
                .send(EnvironmentSignal::FullscreenChanged { in_fullscreen });
        }
    }

    /// Sets visibility, emitting a signal if it changed.
    pub fn set_hidden(&self, is_hidden: bool) {
        if self.hidden.swap(is_hidden, Ordering::SeqCst) != is_hidden {
            let _ = self
                .signals
                .send(EnvironmentSignal::VisibilityChanged { is_hidden });
        }
    }

    /// Reports a context-menu request and returns the policy applied to it.
    pub fn open_context_menu(&self) -> ContextMenuPolicy {
        let _ = self.signals.send(EnvironmentSignal::ContextMenuRequested);
        context_menu_policy()
    }

    /// Whether the simulated host is fullscreen.
    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }

    /// Whether the simulated host is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::SeqCst)
    }
}

impl EnvironmentSignals for SimulatedEnvironment {
    fn subscribe(&self) -> broadcast::Receiver<EnvironmentSignal> {
        self.signals.subscribe()
    }

    fn request_fullscreen(&self) -> Result<()> {
        self.set_fullscreen(true);
        Ok(())
    }
}

// ============================================================================
// ProctorState
// ============================================================================

/// Result of applying one signal to a [`ProctorState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProctorUpdate {
    /// New fullscreen value, if it changed.
    pub fullscreen_changed: Option<bool>,
    /// The violation counted by this signal, if any.
    pub violation: Option<ViolationSource>,
    /// `true` only for the signal that triggered the lockout.
    pub locked_now: bool,
}

/// Integrity state for one session.
///
/// `violation_count` never decreases and `locked` flips to `true` at most
/// once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctorState {
    violation_count: u32,
    locked: bool,
    fullscreen_active: bool,
    max_violations: u32,
}

impl Default for ProctorState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VIOLATIONS)
    }
}

impl ProctorState {
    /// Creates a windowed, unlocked state with the given violation limit.
    #[must_use]
    pub const fn new(max_violations: u32) -> Self {
        Self {
            violation_count: 0,
            locked: false,
            fullscreen_active: false,
            max_violations,
        }
    }

    /// Total violations counted.
    #[must_use]
    pub const fn violation_count(&self) -> u32 {
        self.violation_count
    }

    /// Whether the lockout has been reached.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether the room is fullscreen.
    #[must_use]
    pub const fn fullscreen_active(&self) -> bool {
        self.fullscreen_active
    }

    /// Violation limit.
    #[must_use]
    pub const fn max_violations(&self) -> u32 {
        self.max_violations
    }

    /// Violations left before lockout.
    #[must_use]
    pub const fn remaining_warnings(&self) -> u32 {
        self.max_violations.saturating_sub(self.violation_count)
    }

    /// `true` while interaction must wait for fullscreen.
    #[must_use]
    pub const fn is_gated(&self) -> bool {
        !self.fullscreen_active && !self.locked
    }

    /// Checks whether the candidate may interact with the session.
    ///
    /// # Errors
    ///
    /// `LockedOut` once locked, `FullscreenRequired` while not fullscreen.
    pub fn check_interaction(&self) -> Result<()> {
        if self.locked {
            return Err(InterviewError::locked_out(self.violation_count));
        }
        if !self.fullscreen_active {
            return Err(InterviewError::fullscreen_required(self.remaining_warnings()));
        }
        Ok(())
    }

    /// Applies a fullscreen change. Only leaving fullscreen counts.
    pub fn on_fullscreen_change(&mut self, in_fullscreen: bool) -> ProctorUpdate {
        if self.fullscreen_active == in_fullscreen {
            return ProctorUpdate::default();
        }
        self.fullscreen_active = in_fullscreen;

        let mut update = if in_fullscreen {
            ProctorUpdate::default()
        } else {
            self.record_violation(ViolationSource::FullscreenExited)
        };
        update.fullscreen_changed = Some(in_fullscreen);
        update
    }

    /// Applies a visibility change. Only becoming hidden counts.
    pub fn on_visibility_change(&mut self, is_hidden: bool) -> ProctorUpdate {
        if is_hidden {
            self.record_violation(ViolationSource::VisibilityHidden)
        } else {
            ProctorUpdate::default()
        }
    }

    fn record_violation(&mut self, source: ViolationSource) -> ProctorUpdate {
        self.violation_count = self.violation_count.saturating_add(1);
        let locked_now = !self.locked && self.violation_count >= self.max_violations;
        if locked_now {
            self.locked = true;
        }
        ProctorUpdate {
            fullscreen_changed: None,
            violation: Some(source),
            locked_now,
        }
    }
}

// ============================================================================
// ProctorMonitor
// ============================================================================

/// Shared proctoring state with its own lock and event stream.
#[derive(Debug, Clone)]
pub struct ProctorMonitor {
    state: Arc<Mutex<ProctorState>>,
    events: EventBroadcaster<ProctorEvent>,
}

impl Default for ProctorMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VIOLATIONS, 100)
    }
}

impl ProctorMonitor {
    /// Creates a monitor with the given violation limit and event capacity.
    #[must_use]
    pub fn new(max_violations: u32, event_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProctorState::new(max_violations))),
            events: EventBroadcaster::new(event_capacity),
        }
    }

    /// Subscribes to proctoring events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProctorEvent> {
        self.events.subscribe()
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> ProctorState {
        *self.state.lock().await
    }

    /// Checks whether the candidate may interact with the session.
    pub async fn check_interaction(&self) -> Result<()> {
        self.state.lock().await.check_interaction()
    }

    /// Applies a host signal and publishes the resulting events.
    pub async fn handle(&self, signal: EnvironmentSignal) -> ProctorUpdate {
        let mut state = self.state.lock().await;
        let update = match signal {
            EnvironmentSignal::FullscreenChanged { in_fullscreen } => {
                state.on_fullscreen_change(in_fullscreen)
            }
            EnvironmentSignal::VisibilityChanged { is_hidden } => {
                state.on_visibility_change(is_hidden)
            }
            EnvironmentSignal::ContextMenuRequested => {
                debug!("Context menu request denied");
                return ProctorUpdate::default();
            }
        };

        if let Some(active) = update.fullscreen_changed {
            debug!(fullscreen = active, "Fullscreen changed");
            self.events.send(ProctorEvent::fullscreen_changed(active));
        }

        if let Some(source) = update.violation {
            warn!(
                violations = state.violation_count(),
                remaining = state.remaining_warnings(),
                source = %source,
                "Proctoring violation recorded"
            );
            self.events.send(ProctorEvent::violation_recorded(
                state.violation_count(),
                state.remaining_warnings(),
                source,
            ));
        }

        if update.locked_now {
            warn!(violations = state.violation_count(), "Proctoring lockout");
            self.events
                .send(ProctorEvent::locked_out(state.violation_count()));
        }

        update
    }

    /// Applies `signals` until `cancel` fires or the host stops sending.
    ///
    /// Returns `true` as soon as a signal triggers the lockout. Calling it
    /// again with the same receiver keeps counting later signals.
    pub async fn watch(
        &self,
        signals: &mut broadcast::Receiver<EnvironmentSignal>,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> bool {
        loop {
            let signal = tokio::select! {
                biased;
                () = cancel.cancelled() => return false,
                signal = signals.recv() => signal,
            };

            match signal {
                Ok(signal) => {
                    if self.handle(signal).await.locked_now {
                        return true;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "Proctor watcher lagged behind environment signals");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Environment signal stream closed");
                    return false;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
