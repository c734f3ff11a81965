use crate::Prerequisite;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Prerequisites missing:\n{}", format_missing(.0))]
    MissingPrerequisites(Vec<Prerequisite>),

    #[error("Invalid selection '{value}', expected one of: {expected}")]
    InvalidSelection { value: String, expected: String },

    #[error("Invalid configuration file '{0}': {1}")]
    ConfigError(PathBuf, #[source] serde_json::Error),
}

fn format_missing(missing: &[Prerequisite]) -> String {
    missing
        .iter()
        .map(|item| match item.fix {
            Some(fix) => format!(
                "{} not found at: {}\n  Run: {}",
                item.name,
                item.path.display(),
                fix
            ),
            None => format!("{} not found at: {}", item.name, item.path.display()),
        })
        .collect::<Vec<String>>()
        .join("\n")
}
