use std::fmt;
use std::path::PathBuf;

use lesson_core::model::{Course, LessonId, SectionId};
use services::{AppServices, Clock, Outcome, load_course, parse_course};
use tracing_subscriber::EnvFilter;
use ui::render::{
    progress_bar, render_course_sidebar, render_exercise, render_lesson_sidebar,
    render_section_body,
};
use ui::{AppState, IntentOutcome, NavigationIntent};

const SAMPLE_CATALOG: &str = include_str!("../data/lessons.json");
const DEFAULT_DB_URL: &str = "sqlite://lessons.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingOperand { command: &'static str, operand: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidIndex { raw: String },
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingOperand { command, operand } => {
                write!(f, "{command} requires <{operand}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidIndex { raw } => write!(f, "invalid index: {raw}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lessons <command> [--db <sqlite_url>] [--lesson <lesson_id>] [--catalog <path>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  lessons                  list modules and lessons");
    eprintln!("  status                   show the open lesson (default)");
    eprintln!("  attempt <section_id>     record an attempt on an exercise or quiz");
    eprintln!("  complete <section_id>    mark a section completed");
    eprintln!("  goto <index>             move to a section, if unlocked");
    eprintln!("  module <index>           select a course module");
    eprintln!("  reset                    wipe progress for every lesson");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --lesson <first lesson of the catalog>");
    eprintln!("  --catalog <built-in sample course>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSONS_DB_URL, LESSONS_LESSON_ID, LESSONS_CATALOG, LESSONS_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Lessons,
    Status,
    Attempt(SectionId),
    Complete(SectionId),
    Goto(usize),
    Module(usize),
    Reset,
}

impl Command {
    fn parse(name: &str, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        match name {
            "lessons" => Ok(Self::Lessons),
            "status" => Ok(Self::Status),
            "attempt" => section_operand(args, "attempt").map(Self::Attempt),
            "complete" => section_operand(args, "complete").map(Self::Complete),
            "goto" => index_operand(args, "goto").map(Self::Goto),
            "module" => index_operand(args, "module").map(Self::Module),
            "reset" => Ok(Self::Reset),
            other => Err(ArgsError::UnknownCommand(other.to_owned())),
        }
    }
}

fn section_operand(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<SectionId, ArgsError> {
    let raw = args.next().ok_or(ArgsError::MissingOperand {
        command,
        operand: "section_id",
    })?;
    raw.parse().map_err(|_| ArgsError::InvalidId {
        flag: "section_id",
        raw,
    })
}

fn index_operand(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<usize, ArgsError> {
    let raw = args.next().ok_or(ArgsError::MissingOperand {
        command,
        operand: "index",
    })?;
    raw.parse().map_err(|_| ArgsError::InvalidIndex { raw })
}

struct Args {
    command: Command,
    db_url: String,
    lesson: Option<LessonId>,
    catalog: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LESSONS_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut lesson = std::env::var("LESSONS_LESSON_ID")
            .ok()
            .and_then(|value| value.parse::<LessonId>().ok());
        let mut catalog = std::env::var_os("LESSONS_CATALOG").map(PathBuf::from);
        let mut command = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--lesson" => {
                    let value = require_value(&mut args, "--lesson")?;
                    let parsed = value.parse().map_err(|_| ArgsError::InvalidId {
                        flag: "--lesson",
                        raw: value.clone(),
                    })?;
                    lesson = Some(parsed);
                }
                "--catalog" => {
                    catalog = Some(PathBuf::from(require_value(&mut args, "--catalog")?));
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                name if command.is_none() => {
                    command = Some(Command::parse(name, &mut args)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            command: command.unwrap_or(Command::Status),
            db_url,
            lesson,
            catalog,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LESSONS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Course, Box<dyn std::error::Error>> {
    let course = match path {
        Some(path) => load_course(path)?,
        None => parse_course(SAMPLE_CATALOG)?,
    };
    Ok(course)
}

fn print_status(state: &AppState) {
    print!("{}", render_lesson_sidebar(&state.lesson_sidebar()));
    let index = state.store().current_section_index();
    println!();
    match state.exercise(index) {
        Some(exercise) => print!("{}", render_exercise(&exercise)),
        None => {
            if let Some(section) = state.lesson().section(index) {
                print!("{}", render_section_body(section));
            }
        }
    }
}

fn report<T>(outcome: &Outcome<T>, applied: &str) {
    match outcome {
        Outcome::Applied(_) => println!("{applied}"),
        Outcome::Rejected(reason) => println!("nothing changed: {reason}"),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if matches!(argv.first().map(String::as_str), Some("--help" | "-h" | "help")) {
        print_usage();
        return Ok(());
    }

    let parsed = Args::parse(argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    tracing::debug!(db = %parsed.db_url, command = ?parsed.command, "starting");
    let course = load_catalog(parsed.catalog.as_ref())?;

    // Open + migrate SQLite in the binary glue so core/services stay I/O free.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), course).await?;

    if parsed.command == Command::Lessons {
        for (index, module) in services.course().modules().iter().enumerate() {
            println!("{index:>2}. {} <{}>", module.title(), module.id());
            for lesson in module.lessons() {
                println!("      {} <{}> {} sections", lesson.title(), lesson.id(), lesson.len());
            }
        }
        return Ok(());
    }

    let mut state = AppState::open(&services, parsed.lesson.as_ref()).await?;
    match parsed.command {
        Command::Lessons | Command::Status => print_status(&state),
        Command::Attempt(section_id) => {
            let outcome = state.record_attempt(&section_id).await?;
            if let Outcome::Applied(entry) = &outcome {
                println!("{section_id}: {} attempt(s)", entry.attempt_count);
            }
            report(&outcome, "attempt recorded");
            if let Some(index) = state.lesson().position_of(&section_id)
                && let Some(exercise) = state.exercise(index)
            {
                println!();
                print!("{}", render_exercise(&exercise));
            }
        }
        Command::Complete(section_id) => {
            let outcome = state.mark_completed(&section_id).await?;
            report(&outcome, "section completed");
            println!("{}", progress_bar(state.store().summary().rounded_percent()));
        }
        Command::Goto(index) => {
            let outcome = state.apply(NavigationIntent::SelectSection(index)).await?;
            if let IntentOutcome::Rejected(reason) = &outcome {
                println!("nothing changed: {reason}");
            }
            print_status(&state);
        }
        Command::Module(index) => {
            match state.apply(NavigationIntent::SelectModule(index)).await? {
                IntentOutcome::ModuleSelected {
                    opened: Some(lesson),
                    ..
                } => println!("opened {lesson}"),
                IntentOutcome::Ignored => println!("no module at index {index}"),
                _ => {}
            }
            print!("{}", render_course_sidebar(&state.course_sidebar()));
        }
        Command::Reset => {
            let removed = state.reset_all().await?;
            println!("cleared progress for {removed} lesson(s)");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
