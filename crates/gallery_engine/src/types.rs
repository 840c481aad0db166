use std::fmt;
use std::path::PathBuf;

/// Output document flavours a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    /// Word-processing document, one image per paragraph.
    Paged,
    /// Slide deck, one centred image per slide.
    Slide,
}

impl DocumentKind {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Paged => "docx",
            DocumentKind::Slide => "pptx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Paged => "Word document",
            DocumentKind::Slide => "slide deck",
        }
    }
}

/// A validated, absolute image URL found in the article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub source_url: String,
    pub extension: String,
}

/// An image persisted in the session directory.
///
/// `index` is the dense success-order position; the file is `{index}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    pub index: usize,
    pub local_path: PathBuf,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    pub source_url: String,
    pub reason: String,
}

/// Everything the worker needs to execute one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub article_url: String,
    pub base_dir: PathBuf,
    pub prefix: String,
    pub kinds: Vec<DocumentKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Human-readable progress line.
    Status(String),
    /// Terminal event; exactly one per run.
    Finished(RunSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    NothingDownloaded,
    SessionFailed(String),
    FetchFailed(FailureKind),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentResult {
    Saved {
        path: PathBuf,
        placed: usize,
        skipped: usize,
    },
    NothingToAssemble,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub kind: DocumentKind,
    pub result: DocumentResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub session_path: Option<PathBuf>,
    pub outcome: RunOutcome,
    pub downloaded: usize,
    pub failed: usize,
    pub documents: Vec<DocumentReport>,
}

impl RunSummary {
    pub(crate) fn aborted(session_path: Option<PathBuf>, outcome: RunOutcome) -> Self {
        Self {
            session_path,
            outcome,
            downloaded: 0,
            failed: 0,
            documents: Vec::new(),
        }
    }

    /// One-line closing summary published at the end of every run.
    pub fn headline(&self) -> String {
        match &self.outcome {
            RunOutcome::Completed => {
                let saved = self
                    .documents
                    .iter()
                    .filter(|doc| matches!(doc.result, DocumentResult::Saved { .. }))
                    .count();
                format!(
                    "Run finished: {} images saved, {} failed, {} of {} documents written",
                    self.downloaded,
                    self.failed,
                    saved,
                    self.documents.len()
                )
            }
            RunOutcome::NothingDownloaded => format!(
                "Run finished: nothing was downloaded ({} failed), no documents generated",
                self.failed
            ),
            RunOutcome::SessionFailed(reason) => {
                format!("Run aborted: could not create session folder ({reason})")
            }
            RunOutcome::FetchFailed(kind) => format!("Run aborted: article fetch failed ({kind})"),
            RunOutcome::Cancelled => format!(
                "Run cancelled: {} images saved before cancellation",
                self.downloaded
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
