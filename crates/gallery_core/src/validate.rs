use std::fmt;
use std::path::Path;

use url::Url;

use crate::{FormState, RunPlan};

/// Problems in the run form, caught before anything reaches the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingUrl,
    InvalidUrl(String),
    MissingPrefix,
    InvalidPrefix(String),
    MissingBaseDir,
    NoDocumentKind,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingUrl => write!(f, "please enter an article URL"),
            ConfigError::InvalidUrl(reason) => write!(f, "the article URL is not valid: {reason}"),
            ConfigError::MissingPrefix => write!(f, "please enter a document filename prefix"),
            ConfigError::InvalidPrefix(reason) => write!(f, "the filename prefix is not usable: {reason}"),
            ConfigError::MissingBaseDir => write!(f, "please choose a base output folder"),
            ConfigError::NoDocumentKind => {
                write!(f, "select at least one of Word document or slide deck")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Checks every field in form order and returns the first problem found.
pub fn validate_form(form: &FormState) -> Result<RunPlan, ConfigError> {
    let url = form.url.trim();
    if url.is_empty() {
        return Err(ConfigError::MissingUrl);
    }
    let parsed = Url::parse(url).map_err(|err| ConfigError::InvalidUrl(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "unsupported scheme {}",
            parsed.scheme()
        )));
    }

    let prefix = form.prefix.as_str();
    if prefix.trim().is_empty() {
        return Err(ConfigError::MissingPrefix);
    }
    validate_prefix(prefix)?;

    let base_dir = match form.base_dir.as_deref() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => return Err(ConfigError::MissingBaseDir),
    };

    if !form.paged && !form.slides {
        return Err(ConfigError::NoDocumentKind);
    }

    Ok(RunPlan {
        article_url: url.to_string(),
        base_dir,
        prefix: prefix.to_string(),
        paged: form.paged,
        slides: form.slides,
    })
}

/// Prefix is used verbatim as a file stem, so it must already be a valid one.
pub fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if let Some(c) = prefix.chars().find(|&c| is_forbidden(c)) {
        return Err(ConfigError::InvalidPrefix(format!(
            "character {c:?} is not allowed in file names"
        )));
    }
    if prefix.ends_with('.') || prefix.ends_with(' ') {
        return Err(ConfigError::InvalidPrefix(
            "must not end with a dot or space".to_string(),
        ));
    }
    if is_reserved_windows_name(prefix) {
        return Err(ConfigError::InvalidPrefix(format!(
            "{prefix} is a reserved device name"
        )));
    }
    if Path::new(prefix).components().count() != 1 {
        return Err(ConfigError::InvalidPrefix("must be a plain file name".to_string()));
    }
    Ok(())
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
