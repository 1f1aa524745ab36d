//! Markdown report generation for interview sessions.
//!
//! [`MarkdownGenerator`] renders a [`Report`] as a document with:
//!
//! - A summary table with the headline numbers
//! - One section per question with its follow-ups and answers
//! - The full transcript
//! - The proctoring outcome
//!
//! # Example
//!
//! ```rust
//! use interview_report::{MarkdownGenerator, Report};
//!
//! let report = Report::default();
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# Interview Report"));
//! ```

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::{QuestionTurn, Report, TranscriptEntry};

/// Generates Markdown reports from interview sessions.
pub struct MarkdownGenerator<'a> {
    report: &'a Report,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_turns(&mut output);
        self.write_transcript(&mut output);
        self.write_proctoring(&mut output);
        Self::write_footer(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let summary = &self.report.summary;
        if summary.skills.is_empty() {
            let _ = writeln!(output, "# Interview Report\n");
        } else {
            let _ = writeln!(
                output,
                "# Interview Report: {}\n",
                escape_markdown(&summary.skills.join(", "))
            );
        }
    }

    /// Writes the summary section with metrics table.
    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Status | {} |", summary.status.description());
        let _ = writeln!(
            output,
            "| Questions | {} of {} |",
            summary.questions_asked, summary.queue_length
        );
        let _ = writeln!(output, "| Follow-ups | {} |", summary.follow_ups_asked);
        let _ = writeln!(output, "| Answers | {} |", summary.answers_given);
        let _ = writeln!(
            output,
            "| Duration | {} |",
            format_duration(summary.duration_seconds)
        );
        let _ = writeln!(output, "| Violations | {} |", summary.violations);
        let _ = writeln!(
            output,
            "| Personalized | {} |",
            if summary.personalized { "Yes" } else { "No" }
        );
        let _ = writeln!(
            output,
            "| Difficulty | {} |",
            or_dash(&escape_markdown(&summary.difficulty))
        );
        let _ = writeln!(
            output,
            "| Topic | {} |",
            or_dash(&escape_markdown(&summary.topic))
        );
        let _ = writeln!(output);
    }

    fn write_turns(&self, output: &mut String) {
        let _ = writeln!(output, "## Questions\n");

        if self.report.turns.is_empty() {
            let _ = writeln!(output, "*No questions were asked.*\n");
            return;
        }

        for turn in &self.report.turns {
            Self::write_turn(output, turn);
        }
    }

    /// Writes one question with its follow-ups and answers.
    fn write_turn(output: &mut String, turn: &QuestionTurn) {
        let _ = writeln!(
            output,
            "### Q{}: {}\n",
            turn.number,
            escape_markdown(&turn.question)
        );

        if !turn.follow_ups.is_empty() {
            let _ = writeln!(output, "**Follow-ups**:\n");
            for follow_up in &turn.follow_ups {
                let _ = writeln!(output, "- {}", escape_markdown(follow_up));
            }
            let _ = writeln!(output);
        }

        if turn.answers.is_empty() {
            let _ = writeln!(output, "*No answer recorded.*\n");
        } else {
            let quoted: Vec<String> = turn
                .answers
                .iter()
                .map(|answer| format!("> {}", escape_markdown(answer)))
                .collect();
            let _ = writeln!(output, "**Answers**:\n");
            let _ = writeln!(output, "{}\n", quoted.join("\n>\n"));
        }
    }

    fn write_transcript(&self, output: &mut String) {
        let _ = writeln!(output, "## Transcript\n");

        if self.report.transcript.is_empty() {
            let _ = writeln!(output, "*No messages recorded.*\n");
            return;
        }

        let _ = writeln!(output, "| Time | Speaker | Message |");
        let _ = writeln!(output, "|------|---------|---------|");

        for entry in &self.report.transcript {
            Self::write_transcript_entry(output, entry);
        }

        let _ = writeln!(output);
    }

    fn write_transcript_entry(output: &mut String, entry: &TranscriptEntry) {
        let time = format_timestamp(&entry.timestamp);
        let speaker = entry.speaker.label();
        let text = escape_markdown(&entry.text);
        let _ = writeln!(output, "| {time} | {speaker} | {text} |");
    }

    fn write_proctoring(&self, output: &mut String) {
        let proctoring = &self.report.proctoring;

        let _ = writeln!(output, "## Proctoring\n");

        if proctoring.locked_out {
            let _ = writeln!(
                output,
                "&#128308; **Locked out** after {} violations.\n",
                proctoring.violation_count
            );
        } else if proctoring.violation_count == 0 {
            let _ = writeln!(output, "No violations recorded.\n");
        } else {
            let _ = writeln!(
                output,
                "{} of {} allowed violations recorded.\n",
                proctoring.violation_count, proctoring.max_violations
            );
        }
    }

    /// Writes the report footer.
    fn write_footer(output: &mut String) {
        let _ = writeln!(output, "---");
        let timestamp = format_timestamp(&Utc::now());
        let _ = writeln!(output, "*Generated by Interview Room at {timestamp}*");
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Formats a duration in seconds to a human-readable string.
///
/// Examples:
/// - 65 seconds -> "1m 5s"
/// - 3661 seconds -> "1h 1m 1s"
/// - 45 seconds -> "45s"
fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();

    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }

    parts.join(" ")
}

/// Format: "YYYY-MM-DD HH:MM:SS UTC"
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

/// Escapes special Markdown characters in text.
///
/// This prevents candidate answers from being interpreted as Markdown formatting.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => {
                // table cells cannot hold raw newlines
                result.push_str("<br>");
            }
            _ => result.push(ch),
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
