use pathway_core::Clock;
use pathway_core::model::{CourseDescriptor, CourseId, Identity, ModuleStatus, UserId};
use pathway_core::progression::{IgnoreReason, Transition};
use services::{AppServices, LearningPath};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::{Command, Config, normalize_sqlite_url, prepare_sqlite_file, print_usage};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PATHWAY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_path(path: &LearningPath) {
    let course = path.course();
    println!("{} ({}) [{}]", course.title, course.duration, course.course_id);
    for module in path.modules() {
        let marker = match module.status {
            ModuleStatus::Completed => "[x]",
            ModuleStatus::Current => "[>]",
            ModuleStatus::Locked => "[ ]",
        };
        println!(
            "  {marker} {}. {}: {}",
            module.id, module.description, module.title
        );
    }
    let summary = path.summary();
    if summary.is_finished() {
        println!("All {} modules completed.", summary.total);
    } else {
        println!(
            "Progress: {}/{} ({}%)",
            summary.completed,
            summary.total,
            summary.percent()
        );
    }
}

fn print_courses(label: &str, courses: &[CourseDescriptor]) {
    if courses.is_empty() {
        println!("No {label} courses yet.");
        return;
    }
    for course in courses {
        println!("{}  {} ({})", course.course_id, course.title, course.duration);
    }
}

/// 1-based module number to list index; 0 maps out of range.
fn module_index(module: usize) -> usize {
    module.checked_sub(1).unwrap_or(usize::MAX)
}

fn report_transition(module: usize, transition: Transition) {
    match transition {
        Transition::Advanced { .. } => println!("Module {module} completed."),
        Transition::Ignored(IgnoreReason::Locked) => {
            println!("Module {module} is still locked.");
        }
        Transition::Ignored(IgnoreReason::AlreadyCompleted) => {
            println!("Module {module} is already completed.");
        }
        Transition::Ignored(IgnoreReason::OutOfRange { len, .. }) => {
            println!("This course has modules 1 to {len}.");
        }
    }
}

fn require_user(identity: &Identity) -> Result<&UserId, Box<dyn std::error::Error>> {
    identity
        .user_id()
        .ok_or_else(|| "this command needs a signed-in user (--user <id>)".into())
}

async fn load_course(
    app: &AppServices,
    user: &UserId,
    raw_id: &str,
) -> Result<CourseDescriptor, Box<dyn std::error::Error>> {
    let course_id = CourseId::new(raw_id)?;
    app.library()
        .find_course(user, &course_id)
        .await?
        .ok_or_else(|| format!("no course {course_id} in your history or saved list").into())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if matches!(argv.first().map(String::as_str), None | Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let cfg = Config::parse(argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let identity = Identity::from_optional(cfg.user.as_deref());
    let db_url = normalize_sqlite_url(&cfg.db_url);
    prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::system(), cfg.latency).await?;
    tracing::debug!(%db_url, anonymous = identity.is_anonymous(), "services ready");

    if let Some(user) = identity.user_id() {
        let name = cfg.name.as_deref().unwrap_or(user.as_str());
        app.library().ensure_profile(user, name).await?;
    }

    match cfg.command {
        Command::Generate { prompt, complete } => {
            let generator = app.generator();
            let pending = generator.prepare(&prompt)?;
            println!(
                "Generating \"{}\" ({}) [{}]...",
                pending.title, pending.duration, pending.course_id
            );
            let generated = generator.fill(pending).await?;
            let course = match identity.user_id() {
                Some(user) => {
                    let (profile, outcome) =
                        app.library().record_generation(user, generated.clone()).await?;
                    println!("{}", outcome.message());
                    // A repeated prompt keeps the entry already in history.
                    profile.history.first().cloned().unwrap_or(generated)
                }
                None => generated,
            };
            let paths = app.learning_paths();
            let mut path = paths.open(course, &identity).await;
            for module in complete {
                let transition = paths.complete_module(&mut path, module_index(module)).await;
                report_transition(module, transition);
            }
            print_path(&path);
        }
        Command::Show { course_id } => {
            let user = require_user(&identity)?;
            let course = load_course(&app, user, &course_id).await?;
            let path = app.learning_paths().open(course, &identity).await;
            print_path(&path);
        }
        Command::Complete { course_id, module } => {
            let user = require_user(&identity)?;
            let course = load_course(&app, user, &course_id).await?;
            let paths = app.learning_paths();
            let mut path = paths.open(course, &identity).await;
            let transition = paths.complete_module(&mut path, module_index(module)).await;
            report_transition(module, transition);
            print_path(&path);
        }
        Command::History => {
            let user = require_user(&identity)?;
            let profile = app.library().profile(user).await?;
            print_courses("generated", &profile.history);
        }
        Command::Saved => {
            let user = require_user(&identity)?;
            let profile = app.library().profile(user).await?;
            print_courses("saved", &profile.saved);
        }
        Command::Save { course_id } => {
            let user = require_user(&identity)?;
            let course = load_course(&app, user, &course_id).await?;
            let (_, outcome) = app.library().toggle_save(user, &course).await?;
            println!("{}", outcome.message());
        }
        Command::Unsave { course_id } => {
            let user = require_user(&identity)?;
            let course_id = CourseId::new(course_id)?;
            let (_, removed) = app.library().remove_saved(user, &course_id).await?;
            if removed {
                println!("Course removed from saved list.");
            } else {
                println!("Course {course_id} was not saved.");
            }
        }
        Command::ClearHistory => {
            let user = require_user(&identity)?;
            let (_, cleared) = app.library().clear_history(user).await?;
            if cleared {
                println!("Your generated course history has been cleared.");
            } else {
                println!("History is already empty.");
            }
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
