//! Document assemblers: lay out downloaded images into a `.docx` or `.pptx`.
//!
//! Both assemblers read image files but never modify them. A per-image
//! failure skips that image; only packaging or saving fails the document.
pub mod layout;
mod ooxml;
mod paged;
mod probe;
mod slide;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::persist::PersistError;
use crate::progress::ProgressSink;
use crate::{DocumentKind, DownloadedImage};

pub use layout::{PageGeometry, Placement, SlideGeometry};
pub use paged::PagedAssembler;
pub use probe::{DecoderProbe, ImageInfo, ImageProbe, ProbeError};
pub use slide::SlideAssembler;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub kind: DocumentKind,
    pub prefix: String,
    pub output_path: PathBuf,
    /// Images placed in the document, in order.
    pub images: Vec<DownloadedImage>,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyOutcome {
    Saved(AssembledDocument),
    /// No input images, or none could be placed; nothing was written.
    NothingToAssemble,
}

pub trait DocumentAssembler: Send + Sync {
    fn kind(&self) -> DocumentKind;

    fn assemble(
        &self,
        images: &[DownloadedImage],
        output_dir: &Path,
        prefix: &str,
        sink: &dyn ProgressSink,
    ) -> Result<AssemblyOutcome, AssembleError>;
}

pub(crate) fn output_filename(prefix: &str, kind: DocumentKind) -> String {
    format!("{prefix}.{}", kind.extension())
}

pub(crate) fn display_name(image: &DownloadedImage) -> String {
    image
        .local_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.local_path.display().to_string())
}
