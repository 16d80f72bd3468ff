use std::fmt;
use std::time::Duration;

use services::DEFAULT_GENERATION_LATENCY;

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidLatency { raw: String },
    InvalidModule { raw: String },
    MisplacedComplete,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLatency { raw } => write!(f, "invalid --latency-ms value: {raw}"),
            ArgsError::InvalidModule { raw } => write!(f, "invalid module number: {raw}"),
            ArgsError::MisplacedComplete => write!(f, "--complete is only valid with generate"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  pathway [options] generate <prompt...> [--complete <n>]...");
    eprintln!("  pathway [options] show <course-id>");
    eprintln!("  pathway [options] complete <course-id> <module-number>");
    eprintln!("  pathway [options] history | saved | clear-history");
    eprintln!("  pathway [options] save <course-id> | unsave <course-id>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     default: sqlite:pathway.sqlite3");
    eprintln!("  --user <id>           signed-in user; omit for an anonymous session");
    eprintln!("  --name <name>         display name used when the profile is created");
    eprintln!("  --latency-ms <ms>     simulated generation latency (default: 3000)");
    eprintln!("  --complete <n>        with generate: complete module n right away (repeatable)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PATHWAY_DB_URL, PATHWAY_USER, PATHWAY_GENERATION_LATENCY_MS, PATHWAY_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `complete` lists 1-based modules to finish right after opening the path.
    Generate { prompt: String, complete: Vec<usize> },
    Show { course_id: String },
    Complete { course_id: String, module: usize },
    History,
    Saved,
    Save { course_id: String },
    Unsave { course_id: String },
    ClearHistory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub user: Option<String>,
    pub name: Option<String>,
    pub latency: Duration,
    pub command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_latency(raw: String) -> Result<Duration, ArgsError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ArgsError::InvalidLatency { raw })
}

impl Config {
    /// Parse flags and positional arguments, falling back to environment values.
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("PATHWAY_DB_URL")
            .unwrap_or_else(|| "sqlite:pathway.sqlite3".to_string());
        let mut user = env("PATHWAY_USER");
        let mut name = None;
        let mut latency = match env("PATHWAY_GENERATION_LATENCY_MS") {
            Some(raw) => parse_latency(raw)?,
            None => DEFAULT_GENERATION_LATENCY,
        };

        let mut positional = Vec::new();
        let mut complete = Vec::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => user = Some(require_value(&mut args, "--user")?),
                "--name" => name = Some(require_value(&mut args, "--name")?),
                "--complete" => {
                    complete.push(parse_module(require_value(&mut args, "--complete")?)?);
                }
                "--latency-ms" => latency = parse_latency(require_value(&mut args, "--latency-ms")?)?,
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        Ok(Self {
            db_url,
            user,
            name,
            latency,
            command: parse_command(positional, complete)?,
        })
    }
}

fn next_course_id(rest: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    rest.next()
        .ok_or(ArgsError::MissingArgument { what: "course id" })
}

fn parse_module(raw: String) -> Result<usize, ArgsError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ArgsError::InvalidModule { raw })
}

fn parse_command(positional: Vec<String>, complete: Vec<usize>) -> Result<Command, ArgsError> {
    let mut rest = positional.into_iter();
    let Some(cmd) = rest.next() else {
        return Err(ArgsError::MissingArgument { what: "command" });
    };
    let command = match cmd.as_str() {
        "generate" => {
            let prompt = rest.by_ref().collect::<Vec<_>>().join(" ");
            if prompt.trim().is_empty() {
                return Err(ArgsError::MissingArgument { what: "prompt" });
            }
            return Ok(Command::Generate { prompt, complete });
        }
        "show" => Command::Show {
            course_id: next_course_id(&mut rest)?,
        },
        "complete" => {
            let course_id = next_course_id(&mut rest)?;
            let raw = rest
                .next()
                .ok_or(ArgsError::MissingArgument { what: "module number" })?;
            Command::Complete {
                course_id,
                module: parse_module(raw)?,
            }
        }
        "history" => Command::History,
        "saved" => Command::Saved,
        "save" => Command::Save {
            course_id: next_course_id(&mut rest)?,
        },
        "unsave" => Command::Unsave {
            course_id: next_course_id(&mut rest)?,
        },
        "clear-history" => Command::ClearHistory,
        _ => return Err(ArgsError::UnknownCommand(cmd)),
    };
    if !complete.is_empty() {
        return Err(ArgsError::MisplacedComplete);
    }

    match rest.next() {
        Some(extra) => Err(ArgsError::UnknownArg(extra)),
        None => Ok(command),
    }
}

/// Turn a sqlite URL or bare path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw.to_string();
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its parent directory exist.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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
