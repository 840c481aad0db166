//! Gallery engine: fetch an article, download its images, assemble documents.
pub mod assemble;
mod decode;
mod download;
mod engine;
mod extract;
mod fetch;
mod persist;
mod pipeline;
mod progress;
mod session;
mod types;

pub use assemble::{
    AssembleError, AssembledDocument, AssemblyOutcome, DecoderProbe, DocumentAssembler,
    ImageInfo, ImageProbe, PageGeometry, PagedAssembler, Placement, ProbeError, SlideAssembler,
    SlideGeometry,
};
pub use decode::{decode_html, DecodedHtml};
pub use download::{DownloadReport, ImageDownloader};
pub use engine::{EngineHandle, StartError};
pub use extract::{
    resolve_extension, ExtractionReport, LazyImageExtractor, ReferenceExtractor,
    DEFAULT_IMAGE_EXTENSION,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use persist::{AtomicFileWriter, PersistError};
pub use pipeline::{Clock, EngineSettings, Pipeline};
pub use progress::{shorten_for_display, ChannelProgressSink, ProgressSink};
pub use session::{create_session, Session, SessionError, SESSION_TIMESTAMP_FORMAT};
pub use types::{
    DocumentKind, DocumentReport, DocumentResult, DownloadFailure, DownloadedImage, EngineEvent,
    FailureKind, FetchError, FetchMetadata, FetchOutput, ImageReference, RunOutcome, RunRequest,
    RunSummary,
};
