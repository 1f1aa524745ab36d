//! Interview Room CLI
//!
//! Runs a simulated interview room in the terminal. Typed lines are answers;
//! slash commands stand in for the browser environment and the microphone.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use interview_orchestrator::{
    format_countdown, into_stream, parse_skill_list, ChannelTranscriber, Config, EndReason,
    InterviewRoom, MessageKind, ProctorEvent, ProctorState, Sender, SessionEvent, SessionState,
    SimulatedEnvironment, TranscriptFeeder,
};
use interview_report::{
    json::JsonGenerator, EntryKind, MarkdownGenerator, ProctoringSummary, Report, SessionEnd,
    SessionRecord, Speaker, TranscriptEntry,
};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Interview Room - simulated technical interview
///
/// Builds a question queue from resume skills and runs a turn-taking
/// interview with fullscreen and focus proctoring.
#[derive(Parser, Debug)]
#[command(name = "interview")]
#[command(version, about, long_about = None)]
struct Args {
    /// Comma-separated resume skills, e.g. "React, Python"
    #[arg(long, value_name = "LIST")]
    skills: Option<String>,

    /// Path to configuration file (default: interview.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Output directory for reports
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Seed for reproducible follow-up decisions
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Interview Room starting");
    tracing::debug!(config = ?args.config, "Config file");
    tracing::debug!(output_dir = ?args.output_dir, "Output directory");

    match run_interview(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs one interview from configuration to written reports.
async fn run_interview(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref skills) = args.skills {
        config.skills = parse_skill_list(skills);
    }
    if let Some(ref output_dir) = args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let bank = config.load_question_bank()?;
    let environment = Arc::new(SimulatedEnvironment::new());
    let (transcriber, feeder) = ChannelTranscriber::with_feeder();
    let room = InterviewRoom::from_config(&config, &bank, environment.clone(), Arc::new(transcriber));

    println!();
    println!("Type your answers and press Enter. Commands:");
    print_help();
    println!();
    println!("The room starts outside fullscreen; type /fullscreen to begin answering.");
    println!();

    run_room(&room, &environment, &feeder).await?;

    let state = room.snapshot().await;
    let proctor = room.proctor_state().await;

    println!();
    print_summary(&state, &proctor);

    let output_dir = PathBuf::from(&config.output_dir);
    generate_reports(&state, &proctor, &config, &output_dir)?;

    Ok(())
}

/// Pumps stdin commands and room events until the session ends.
async fn run_room(
    room: &InterviewRoom,
    environment: &SimulatedEnvironment,
    feeder: &TranscriptFeeder,
) -> anyhow::Result<()> {
    let mut session_events = std::pin::pin!(into_stream(room.subscribe_session()));
    let mut proctor_events = std::pin::pin!(into_stream(room.subscribe_proctor()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Ok(()) = tokio::signal::ctrl_c() => {
                println!();
                println!("Received Ctrl+C, ending interview...");
                room.terminate(EndReason::UserEnded).await;
                break;
            }
            event = session_events.next() => match event {
                Some(SessionEvent::SessionEnded(payload)) => {
                    tracing::info!(reason = ?payload.reason, "Session ended");
                    break;
                }
                Some(event) => print_session_event(&event),
                None => break,
            },
            Some(event) = proctor_events.next() => print_proctor_event(&event),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    room.terminate(EndReason::UserEnded).await;
                    break;
                };
                if handle_command(parse_command(&line), room, environment, feeder).await == Flow::End {
                    break;
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

/// One line of terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command<'a> {
    Answer(&'a str),
    Fullscreen,
    ExitFullscreen,
    Hide,
    Show,
    Mic,
    Say(&'a str),
    Partial(&'a str),
    Status,
    Help,
    End,
    Unknown(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    End,
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Answer(line);
    };

    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, arg)| (name, arg.trim()));

    match name {
        "fullscreen" => Command::Fullscreen,
        "exit-fullscreen" => Command::ExitFullscreen,
        "hide" => Command::Hide,
        "show" => Command::Show,
        "mic" => Command::Mic,
        "say" => Command::Say(arg),
        "partial" => Command::Partial(arg),
        "status" => Command::Status,
        "help" => Command::Help,
        "end" => Command::End,
        _ => Command::Unknown(name),
    }
}

async fn handle_command(
    command: Command<'_>,
    room: &InterviewRoom,
    environment: &SimulatedEnvironment,
    feeder: &TranscriptFeeder,
) -> Flow {
    match command {
        Command::Answer(text) => match room.submit_utterance(text).await {
            Ok(_) => {}
            Err(e) if e.is_gating() => println!("  ! {e}"),
            Err(e) => println!("  ! Answer not sent: {e}"),
        },
        Command::Fullscreen => {
            if let Err(e) = room.request_fullscreen() {
                println!("  ! {e}");
            }
        }
        Command::ExitFullscreen => environment.set_fullscreen(false),
        Command::Hide => environment.set_hidden(true),
        Command::Show => environment.set_hidden(false),
        Command::Mic => {
            if room.is_listening() {
                room.stop_listening();
                println!("  Microphone off");
            } else if room.start_listening().await.is_ok() {
                println!("  Microphone on; use /partial and /say to speak");
            }
        }
        Command::Say(text) => {
            if !feeder.finalize(text) {
                println!("  Microphone is off; type /mic first");
            }
        }
        Command::Partial(text) => {
            if feeder.interim(text) {
                println!("  (hearing: {})", room.interim_transcript().await);
            } else {
                println!("  Microphone is off; type /mic first");
            }
        }
        Command::Status => print_status(room).await,
        Command::Help => print_help(),
        Command::End => {
            println!("Ending interview...");
            room.terminate(EndReason::UserEnded).await;
            return Flow::End;
        }
        Command::Unknown(name) => println!("  Unknown command '/{name}'; type /help"),
    }

    Flow::Continue
}

// ============================================================================
// Configuration
// ============================================================================

/// Loads configuration from the specified path or the working directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    if config.skills.is_empty() {
        println!("  Skills: (none, using default questions)");
    } else {
        println!("  Skills: {}", config.skills.join(", "));
    }
    println!("  Difficulty: {}", config.difficulty);
    println!("  Topic: {}", config.topic);
    println!(
        "  Duration: {}",
        format_countdown(std::time::Duration::from_secs(config.duration_seconds))
    );
    println!("  Max violations: {}", config.proctoring.max_violations);
    println!("  Output directory: {}", config.output_dir);
}

// ============================================================================
// Display
// ============================================================================

fn print_help() {
    println!("  /fullscreen       enter fullscreen");
    println!("  /exit-fullscreen  leave fullscreen");
    println!("  /hide, /show      switch away from or back to the room");
    println!("  /mic              toggle the microphone");
    println!("  /partial <text>   interim speech");
    println!("  /say <text>       final speech (submits the answer)");
    println!("  /status           show progress and time remaining");
    println!("  /end              end the interview");
}

const fn speaker_label(sender: Sender) -> &'static str {
    match sender {
        Sender::Ai => "Interviewer",
        Sender::User => "You",
        Sender::System => "System",
    }
}

fn print_session_event(event: &SessionEvent) {
    match event {
        SessionEvent::MessageAppended(payload) => {
            let message = &payload.message;
            println!("{}: {}", speaker_label(message.sender), message.text);
        }
        SessionEvent::QuestionChanged(payload) => {
            println!(
                "--- Q {}/{} | {} | {} ---",
                payload.cursor + 1,
                payload.queue_length,
                payload.question.topic,
                payload.question.difficulty
            );
        }
        SessionEvent::AiStatusChanged(payload) => {
            tracing::debug!(status = %payload.status, "Interviewer status");
        }
        SessionEvent::Connected(_) | SessionEvent::SessionEnded(_) => {}
    }
}

fn print_proctor_event(event: &ProctorEvent) {
    match event {
        ProctorEvent::FullscreenChanged(payload) => {
            if payload.fullscreen_active {
                println!("  [fullscreen on]");
            } else {
                println!("  [fullscreen off: answers are blocked until you return]");
            }
        }
        ProctorEvent::ViolationRecorded(payload) => {
            println!(
                "  [warning: {}; {} warning(s) remaining]",
                payload.source, payload.remaining_warnings
            );
        }
        ProctorEvent::LockedOut(payload) => {
            println!(
                "  [locked out after {} violations; the interview has ended]",
                payload.violation_count
            );
        }
    }
}

async fn print_status(room: &InterviewRoom) {
    let state = room.snapshot().await;
    let proctor = room.proctor_state().await;

    println!("  Phase: {}", state.phase());
    println!("  Interviewer: {}", state.ai_status());
    println!("  Progress: {}", room.progress().await);
    println!("  Time remaining: {}", format_countdown(room.time_remaining()));
    println!(
        "  Fullscreen: {}",
        if proctor.fullscreen_active() { "yes" } else { "no" }
    );
    println!(
        "  Violations: {}/{}",
        proctor.violation_count(),
        proctor.max_violations()
    );
    if room.is_listening() {
        println!("  Hearing: {}", room.interim_transcript().await);
    }
}

fn print_summary(state: &SessionState, proctor: &ProctorState) {
    println!("=== Interview Summary ===");
    println!("Questions asked: {}/{}", state.questions_asked(), state.queue().len());
    println!("Follow-ups: {}", state.follow_ups_asked());
    println!("Violations: {}", proctor.violation_count());
    if let Some(reason) = state.end_reason() {
        println!("Ended: {reason:?}");
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Writes Markdown and JSON reports to `output_dir`.
fn generate_reports(
    state: &SessionState,
    proctor: &ProctorState,
    config: &Config,
    output_dir: &Path,
) -> anyhow::Result<()> {
    println!();
    println!("Generating reports...");

    let record = create_session_record(state, proctor, config);
    let report = Report::from_session(&record);

    std::fs::create_dir_all(output_dir)?;

    let markdown = MarkdownGenerator::new(&report).generate();
    let md_path = output_dir.join("interview-report.md");
    std::fs::write(&md_path, markdown)?;
    println!("  Markdown report: {}", md_path.display());

    let json_path = output_dir.join("interview-report.json");
    JsonGenerator::new(&report).write_to_file(&json_path, true)?;
    println!("  JSON report: {}", json_path.display());

    println!();
    println!("Status: {}", report.summary.status);

    Ok(())
}

fn create_session_record(
    state: &SessionState,
    proctor: &ProctorState,
    config: &Config,
) -> SessionRecord {
    SessionRecord {
        skills: state.skills().to_vec(),
        difficulty: config.difficulty.to_string(),
        topic: config.topic.clone(),
        queue_length: state.queue().len(),
        transcript: state
            .transcript()
            .iter()
            .map(|m| {
                TranscriptEntry::new(
                    convert_sender(m.sender),
                    convert_kind(m.kind),
                    m.text.clone(),
                    m.timestamp,
                )
            })
            .collect(),
        closing_delivered: state.closing_delivered(),
        started_at: Some(state.started_at()),
        ended_at: state.ended_at(),
        end: state.end_reason().map(convert_end),
        proctoring: ProctoringSummary {
            violation_count: proctor.violation_count(),
            max_violations: proctor.max_violations(),
            locked_out: proctor.is_locked(),
        },
    }
}

const fn convert_sender(sender: Sender) -> Speaker {
    match sender {
        Sender::Ai => Speaker::Ai,
        Sender::User => Speaker::User,
        Sender::System => Speaker::System,
    }
}

const fn convert_kind(kind: MessageKind) -> EntryKind {
    match kind {
        MessageKind::Connection => EntryKind::Connection,
        MessageKind::Question => EntryKind::Question,
        MessageKind::FollowUp => EntryKind::FollowUp,
        MessageKind::Transition => EntryKind::Transition,
        MessageKind::Closing => EntryKind::Closing,
        MessageKind::Answer => EntryKind::Answer,
    }
}

const fn convert_end(reason: EndReason) -> SessionEnd {
    match reason {
        EndReason::UserEnded => SessionEnd::UserEnded,
        EndReason::LockedOut => SessionEnd::LockedOut,
    }
}
