use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use exam_core::model::{ExamType, Report, SelectionMode};
use exam_core::{Clock, QuestionBank};
use services::exam::{ExamSession, ExamState, FinishOutcome, SessionMode, SessionTimer};
use services::resolver::{QuestionResolver, ResolveGuard};
use services::source::{
    QuestionSource, RemoteQuestionSource, SourceConfig, SourceGroup, SourceRequest,
};
use services::{ExamError, SourceError};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCount { raw: String },
    InvalidExamType { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidExamType { raw } => write!(f, "invalid --exam value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

struct Args {
    subject: String,
    mode: SelectionMode,
    count: usize,
    practice: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--subject <code>] [--count <n>] [--practice] <mode>");
    eprintln!();
    eprintln!("Modes (pick one):");
    eprintln!("  --exam midterm|final      curated exam-period questions");
    eprintln!("  --lectures <range>        e.g. --lectures 1-22 or --lectures 10,12,15");
    eprintln!("  --topic <text>            free-topic practice");
    eprintln!();
    eprintln!("Defaults: --subject CS101, --count 5, --exam midterm");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_SOURCE_URL       remote question source (optional; bank used offline)");
    eprintln!("  EXAM_SOURCE_API_KEY   bearer token for the source (optional)");
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut subject = "CS101".to_string();
        let mut count = 5_usize;
        let mut practice = false;
        let mut mode: Option<SelectionMode> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--subject" => {
                    subject = require_value(&mut args, "--subject")?;
                }
                "--count" => {
                    let raw = require_value(&mut args, "--count")?;
                    count = raw
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidCount { raw })?;
                }
                "--practice" => practice = true,
                "--exam" => {
                    let raw = require_value(&mut args, "--exam")?;
                    let exam_type = ExamType::from_str(&raw)
                        .map_err(|_| ArgsError::InvalidExamType { raw })?;
                    mode = Some(SelectionMode::ExamType(exam_type));
                }
                "--lectures" => {
                    mode = Some(SelectionMode::LectureRange(require_value(
                        &mut args,
                        "--lectures",
                    )?));
                }
                "--topic" => {
                    mode = Some(SelectionMode::FreeTopic(require_value(&mut args, "--topic")?));
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            subject,
            mode: mode.unwrap_or(SelectionMode::ExamType(ExamType::Midterm)),
            count,
            practice,
        })
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

/// Stand-in source when no remote endpoint is configured; every request falls
/// through to the bundled bank.
struct OfflineSource;

#[async_trait]
impl QuestionSource for OfflineSource {
    async fn fetch(&self, _request: &SourceRequest) -> Result<Vec<SourceGroup>, SourceError> {
        Err(SourceError::EmptyResponse)
    }
}

fn build_source() -> Arc<dyn QuestionSource> {
    match SourceConfig::from_env() {
        Some(config) => Arc::new(RemoteQuestionSource::new(config)),
        None => Arc::new(OfflineSource),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let args = Args::parse(argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::default_clock();
    let resolver = QuestionResolver::new(build_source(), QuestionBank::builtin());
    let guard = ResolveGuard::new();
    let token = guard.begin();

    let resolved = resolver.resolve(&args.subject, &args.mode, args.count).await?;
    // A single-shot CLI never abandons setup, but resolution still goes
    // through the guard so a stale result would be dropped.
    let Some(questions) = token.accept(resolved) else {
        return Ok(());
    };

    let session_mode = if args.practice {
        SessionMode::Practice
    } else {
        SessionMode::TimedExam
    };
    let mut session = ExamSession::new(questions, session_mode, clock.now())?;

    println!(
        "{} questions on {} ({}). {} seconds on the clock.",
        session.total_questions(),
        args.subject,
        args.mode,
        session.remaining_seconds()
    );
    println!("Commands: 1-4 answer, f flag, g <n> go to, finish, quit.");
    show_question(&session);

    let (timer, mut ticks) = SessionTimer::start();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut awaiting_confirmation = false;
    let mut abandoned = false;

    while session.state() == ExamState::Active && !abandoned {
        tokio::select! {
            _ = ticks.recv() => {
                if session.tick(clock.now()) == ExamState::Finished {
                    println!("\nTime is up.");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_command(&mut session, line.trim(), awaiting_confirmation, &clock) {
                    CommandFlow::Continue => awaiting_confirmation = false,
                    CommandFlow::AwaitConfirm => awaiting_confirmation = true,
                    CommandFlow::Quit => abandoned = true,
                }
            }
        }
    }
    timer.stop();

    // Abandoning an active attempt discards all session state; only a real
    // finish reaches the report.
    if !abandoned && session.is_finished() {
        present_report(&session)?;
    }
    Ok(())
}

enum CommandFlow {
    Continue,
    AwaitConfirm,
    Quit,
}

fn handle_command(
    session: &mut ExamSession,
    line: &str,
    awaiting_confirmation: bool,
    clock: &Clock,
) -> CommandFlow {
    if awaiting_confirmation {
        if line.eq_ignore_ascii_case("yes") {
            session.confirm_finish(clock.now());
        } else {
            println!("Finish cancelled.");
            show_question(session);
        }
        return CommandFlow::Continue;
    }

    let result = match line {
        "" => Ok(()),
        "quit" => return CommandFlow::Quit,
        "finish" => {
            match session.request_finish(clock.now()) {
                FinishOutcome::Confirm { answered, total } => {
                    println!(
                        "{answered} of {total} answered. Type 'yes' to finish anyway, anything else to keep going."
                    );
                    return CommandFlow::AwaitConfirm;
                }
                FinishOutcome::Finished => return CommandFlow::Continue,
            }
        }
        "f" => session.toggle_flag().map(|flagged| {
            println!("Question {} {}.", session.cursor() + 1, if flagged { "flagged" } else { "unflagged" });
        }),
        _ => {
            if let Some(rest) = line.strip_prefix("g ") {
                match rest.trim().parse::<usize>() {
                    Ok(n) if n >= 1 => session.go_to(n - 1).map(|()| show_question(session)),
                    _ => {
                        println!("Usage: g <question number>");
                        Ok(())
                    }
                }
            } else if let Ok(choice) = line.parse::<usize>() {
                answer(session, choice)
            } else {
                println!("Unrecognized command: {line}");
                Ok(())
            }
        }
    };

    if let Err(err) = result {
        report_exam_error(&err);
    }
    CommandFlow::Continue
}

fn answer(session: &mut ExamSession, choice: usize) -> Result<(), ExamError> {
    if choice == 0 {
        return Err(ExamError::OutOfRange { index: 0, len: 4 });
    }
    session.select_answer(choice - 1)?;
    let cursor = session.cursor();
    if session.revealed()[cursor] {
        let question = session.current_question();
        if session.answers()[cursor] == Some(question.correct_index()) {
            println!("Correct. {}", question.explanation());
        } else {
            println!(
                "Not quite; the answer was '{}'. {}",
                question.correct_option(),
                question.explanation()
            );
        }
    }
    // Move on to the next unanswered question, if any.
    let next = (0..session.total_questions())
        .map(|i| (cursor + 1 + i) % session.total_questions())
        .find(|i| session.answers()[*i].is_none());
    if let Some(next) = next {
        session.go_to(next)?;
        show_question(session);
    } else {
        println!("All questions answered. Type 'finish' to see your results.");
    }
    Ok(())
}

fn report_exam_error(err: &ExamError) {
    match err {
        ExamError::AlreadyAnswered { index } => {
            println!("Question {} is locked in; answers cannot be changed.", index + 1);
        }
        ExamError::OutOfRange { .. } => println!("That choice is out of range."),
        _ => println!("{err}"),
    }
}

fn show_question(session: &ExamSession) {
    let question = session.current_question();
    let number = session.cursor() + 1;
    let flag = if session.flags()[session.cursor()] { " [flagged]" } else { "" };
    println!();
    println!(
        "Q{number}/{} ({}){flag}: {}",
        session.total_questions(),
        question.topic(),
        question.text()
    );
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
}

/// ResultPresenter: renders the scoring engine's output.
fn present_report(session: &ExamSession) -> Result<(), Box<dyn std::error::Error>> {
    let report: Report = services::score_session(session)?;

    println!();
    println!(
        "Score: {}/{} ({}%), grade {}",
        report.raw_score, report.total, report.percentage, report.grade
    );

    println!("\nBy topic (weakest first):");
    for agg in &report.topic_aggregates {
        println!(
            "  {:<20} {}/{} ({}%, {})",
            agg.topic,
            agg.correct_count,
            agg.total_questions,
            agg.pct(),
            agg.standing()
        );
    }

    if !report.weak_topics.is_empty() {
        println!("\nSuggested help requests:");
        for weak in &report.weak_topics {
            println!("  - {}", weak.help_request());
        }
    }

    if !report.missed_questions.is_empty() {
        println!("\nReview these:");
        for missed in &report.missed_questions {
            let given = match missed.given {
                Some(i) => missed.question.options()[i].as_str(),
                None => "(unanswered)",
            };
            println!(
                "  {} (you said: {given}; correct: {})",
                missed.question.text(),
                missed.question.correct_option()
            );
            if !missed.question.explanation().is_empty() {
                println!("    {}", missed.question.explanation());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
