//! Plain-text course template and its parser.
//!
//! The template is what a course source returns:
//!
//! ```text
//! Course: Rust Masterclass
//! Duration: 8 weeks
//! Modules:
//! - Week 1: Introduction to Rust Basics
//! ```

use crate::model::{DEFAULT_DURATION, ModuleDraft};

const WEEK_TITLES: [&str; 8] = [
    "Introduction to {topic} Basics",
    "Core Concepts & Syntax",
    "Advanced Techniques & Libraries",
    "DOM Manipulation/Data Handling",
    "Responsive Design/Project Setup",
    "APIs & External Services",
    "Mini Project & Debugging",
    "Final Capstone & Review",
];

/// Render the canned eight-week completion for a topic.
#[must_use]
pub fn mock_completion(topic: &str) -> String {
    let topic = topic.trim();
    let mut out = format!("Course: {topic} Masterclass\nDuration: {DEFAULT_DURATION}\nModules:");
    for (week, title) in (1..).zip(WEEK_TITLES) {
        out.push_str(&format!("\n- Week {week}: {}", title.replace("{topic}", topic)));
    }
    out
}

/// Structured result of parsing a course template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCourse {
    pub title: String,
    pub duration: String,
    pub modules: Vec<ModuleDraft>,
}

/// Parse a course template.
///
/// Missing headers fall back to the prompt as title and the default
/// duration. Module lines must look like `- Week N: Title` and appear after
/// `Modules:`; anything else is skipped. Ids are assigned `1..=n` in order
/// and no status is set.
#[must_use]
pub fn parse_course(prompt: &str, completion: &str) -> ParsedCourse {
    let mut title = prompt.trim().to_string();
    let mut duration = DEFAULT_DURATION.to_string();
    let mut modules = Vec::new();
    let mut in_modules = false;

    for line in completion.lines() {
        if let Some(rest) = line.strip_prefix("Course:") {
            title = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Duration:") {
            duration = rest.trim().to_string();
        } else if line.starts_with("Modules:") {
            in_modules = true;
        } else if in_modules && line.starts_with('-') {
            if let Some((week, module_title)) = parse_module_line(line) {
                let id = u32::try_from(modules.len() + 1).unwrap_or(u32::MAX);
                modules.push(ModuleDraft::new(id, module_title, week));
            }
        }
    }

    ParsedCourse {
        title,
        duration,
        modules,
    }
}

/// Split `- Week N: Title` into `("Week N", "Title")`.
fn parse_module_line(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("- ")?;
    let (label, title) = rest.split_once(": ")?;
    let number = label.strip_prefix("Week ")?;
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    Some((label.to_string(), title.to_string()))
}
