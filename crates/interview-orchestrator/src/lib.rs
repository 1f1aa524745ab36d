//! Interview Room Orchestrator
//!
//! Builds a question queue from resume skills, runs the turn-taking
//! conversation with a simulated interviewer, and enforces the proctoring
//! rules that gate candidate interaction.

pub mod config;
pub mod error;
pub mod events;
pub mod policy;
pub mod proctor;
pub mod question_bank;
pub mod queue;
pub mod room;
pub mod schedule;
pub mod session;
pub mod session_state;
pub mod transcription;

pub use config::{Config, Pacing, ProctoringConfig};
pub use error::{InterviewError, Result};
pub use events::{into_stream, EventBroadcaster, ProctorEvent, SessionEvent};
pub use policy::{
    choose_branch, Branch, BranchPolicy, RandomBranchPolicy, DEFAULT_FOLLOW_UP_THRESHOLD,
};
pub use proctor::{
    context_menu_policy, ContextMenuPolicy, EnvironmentSignal, EnvironmentSignals,
    ProctorMonitor, ProctorState, ProctorUpdate, SimulatedEnvironment, ViolationSource,
    DEFAULT_MAX_VIOLATIONS,
};
pub use question_bank::{Difficulty, Question, QuestionBank};
pub use queue::{parse_skill_list, QuestionQueue};
pub use room::{format_countdown, InterviewRoom, Progress};
pub use schedule::Scheduler;
pub use session::InterviewSession;
pub use session_state::{
    AiStatus, EndReason, Message, MessageKind, Sender, SessionPhase, SessionState,
    CLOSING_MESSAGE, CONNECTED_MESSAGE, TRANSITION_MESSAGE,
};
pub use transcription::{
    ChannelTranscriber, TranscriptFeeder, TranscriptFragment, Transcriber,
    UnavailableTranscriber, UtteranceBuffer,
};
