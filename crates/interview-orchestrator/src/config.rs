//! Configuration types for the interview room.
//!
//! This module provides the structures that control a session: requested
//! skills, session metadata, pacing of the interviewer's turns, branching
//! randomness, proctoring limits and where reports are written.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InterviewError, Result};
use crate::policy::{RandomBranchPolicy, DEFAULT_FOLLOW_UP_THRESHOLD};
use crate::proctor::DEFAULT_MAX_VIOLATIONS;
use crate::question_bank::{Difficulty, QuestionBank};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "interview.json";

/// Default topic label for the session.
fn default_topic() -> String {
    "General".to_string()
}

/// Default session length: 45 minutes.
const fn default_duration_seconds() -> u64 {
    2700
}

const fn default_follow_up_threshold() -> f64 {
    DEFAULT_FOLLOW_UP_THRESHOLD
}

/// Default output directory for reports.
fn default_output_dir() -> String {
    ".".to_string()
}

/// Default per-subscriber event buffer.
const fn default_event_capacity() -> usize {
    100
}

const fn default_max_violations() -> u32 {
    DEFAULT_MAX_VIOLATIONS
}

const fn default_connect_delay() -> u64 {
    800
}

const fn default_question_delay() -> u64 {
    1500
}

const fn default_speaking_delay() -> u64 {
    3000
}

const fn default_thinking_delay() -> u64 {
    2000
}

const fn default_reply_delay() -> u64 {
    2500
}

const fn default_transition_delay() -> u64 {
    1200
}

/// Main configuration for an interview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Skills extracted from the candidate's resume, in request order.
    #[serde(default)]
    pub skills: Vec<String>,

    /// Session difficulty label.
    #[serde(default)]
    pub difficulty: Difficulty,

    /// Session topic label.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Countdown length in seconds.
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u64,

    /// Delays between interviewer transitions.
    #[serde(default)]
    pub pacing: Pacing,

    /// A follow-up is asked when a uniform draw exceeds this value.
    #[serde(default = "default_follow_up_threshold")]
    pub follow_up_threshold: f64,

    /// Fixed seed for reproducible branching. OS entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,

    /// Proctoring limits.
    #[serde(default)]
    pub proctoring: ProctoringConfig,

    /// Optional path to a custom question bank JSON file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_bank: Option<PathBuf>,

    /// Output directory for generated reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Buffer size for each event subscriber.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skills: Vec::new(),
            difficulty: Difficulty::default(),
            topic: default_topic(),
            duration_seconds: default_duration_seconds(),
            pacing: Pacing::default(),
            follow_up_threshold: default_follow_up_threshold(),
            rng_seed: None,
            proctoring: ProctoringConfig::default(),
            question_bank: None,
            output_dir: default_output_dir(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `interview.json` in the current directory. If it is missing
    /// the defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            InterviewError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `interview.json` in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::ConfigParseError` if the file exists but
    /// contains invalid JSON or an unknown difficulty.
    ///
    /// Returns `InterviewError::ConfigValidationError` if a value is out of
    /// range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(InterviewError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| InterviewError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `followUpThreshold` must be within `0.0..=1.0`
    /// - `durationSeconds` must be greater than 0
    /// - `proctoring.maxViolations` must be greater than 0
    /// - `eventCapacity` must be greater than 0
    /// - `topic` and `outputDir` must not be empty
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.follow_up_threshold) {
            return Err(InterviewError::config_validation(
                format!(
                    "followUpThreshold must be between 0.0 and 1.0, got {}",
                    self.follow_up_threshold
                ),
                "Use 0.5 for an even chance of follow-up questions",
            ));
        }

        if self.duration_seconds == 0 {
            return Err(InterviewError::config_validation(
                "durationSeconds must be greater than 0",
                "Set durationSeconds to at least 1 in your interview.json (2700 is 45 minutes)",
            ));
        }

        if self.proctoring.max_violations == 0 {
            return Err(InterviewError::config_validation(
                "proctoring.maxViolations must be greater than 0",
                "Set proctoring.maxViolations to at least 1 in your interview.json",
            ));
        }

        if self.event_capacity == 0 {
            return Err(InterviewError::config_validation(
                "eventCapacity must be greater than 0",
                "Set eventCapacity to at least 1 in your interview.json (100 is typical)",
            ));
        }

        if self.topic.trim().is_empty() {
            return Err(InterviewError::config_validation(
                "topic must not be empty",
                "Remove the topic field to use 'General'",
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(InterviewError::config_validation(
                "outputDir must not be empty",
                "Provide a valid output directory path in your interview.json (use '.' for current directory)",
            ));
        }

        Ok(())
    }

    /// Loads the configured question bank, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns the bank loader's error if a custom bank is configured but
    /// cannot be read or validated.
    pub fn load_question_bank(&self) -> Result<QuestionBank> {
        self.question_bank
            .as_deref()
            .map_or_else(|| Ok(QuestionBank::builtin()), QuestionBank::load_from_file)
    }

    /// Builds the branch policy for this configuration.
    #[must_use]
    pub fn branch_policy(&self) -> RandomBranchPolicy {
        self.rng_seed.map_or_else(
            || RandomBranchPolicy::from_entropy(self.follow_up_threshold),
            |seed| RandomBranchPolicy::from_seed(seed, self.follow_up_threshold),
        )
    }

    /// Session countdown length.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }
}

/// Delays, in milliseconds, between interviewer transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pacing {
    /// Connecting until connected.
    #[serde(default = "default_connect_delay")]
    pub connect_delay_ms: u64,

    /// Connected until the first question, and before each next question.
    #[serde(default = "default_question_delay")]
    pub question_delay_ms: u64,

    /// Speaking a question until listening.
    #[serde(default = "default_speaking_delay")]
    pub speaking_delay_ms: u64,

    /// A user answer until the response decision.
    #[serde(default = "default_thinking_delay")]
    pub thinking_delay_ms: u64,

    /// Speaking a follow-up or the closing until listening.
    #[serde(default = "default_reply_delay")]
    pub reply_delay_ms: u64,

    /// The "let's move on" message until the advance starts.
    #[serde(default = "default_transition_delay")]
    pub transition_delay_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            connect_delay_ms: default_connect_delay(),
            question_delay_ms: default_question_delay(),
            speaking_delay_ms: default_speaking_delay(),
            thinking_delay_ms: default_thinking_delay(),
            reply_delay_ms: default_reply_delay(),
            transition_delay_ms: default_transition_delay(),
        }
    }
}

impl Pacing {
    /// Pacing with every delay set to zero.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            connect_delay_ms: 0,
            question_delay_ms: 0,
            speaking_delay_ms: 0,
            thinking_delay_ms: 0,
            reply_delay_ms: 0,
            transition_delay_ms: 0,
        }
    }

    /// Connection delay.
    #[must_use]
    pub const fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    /// Delay before a question is spoken.
    #[must_use]
    pub const fn question(&self) -> Duration {
        Duration::from_millis(self.question_delay_ms)
    }

    /// Question speaking time.
    #[must_use]
    pub const fn speaking(&self) -> Duration {
        Duration::from_millis(self.speaking_delay_ms)
    }

    /// Thinking time after an answer.
    #[must_use]
    pub const fn thinking(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }

    /// Follow-up or closing speaking time.
    #[must_use]
    pub const fn reply(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// Pause after the transition message.
    #[must_use]
    pub const fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }
}

/// Proctoring configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctoringConfig {
    /// Violations allowed before lockout.
    #[serde(default = "default_max_violations")]
    pub max_violations: u32,
}

impl Default for ProctoringConfig {
    fn default() -> Self {
        Self {
            max_violations: default_max_violations(),
        }
    }
}
