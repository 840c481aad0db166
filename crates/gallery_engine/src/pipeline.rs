use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;

use crate::assemble::{
    AssemblyOutcome, DocumentAssembler, PageGeometry, PagedAssembler, SlideAssembler,
    SlideGeometry,
};
use crate::decode::decode_html;
use crate::download::{ImageDownloader, URL_DISPLAY_LEN};
use crate::extract::{LazyImageExtractor, ReferenceExtractor};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::progress::{shorten_for_display, ProgressSink};
use crate::session::create_session;
use crate::{
    DocumentKind, DocumentReport, DocumentResult, DownloadedImage, FailureKind, FetchError,
    FetchOutput, RunOutcome, RunRequest, RunSummary,
};

/// Source of the session timestamp.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub article: FetchSettings,
    pub image: FetchSettings,
    /// Image requests kept in flight at once; 1 downloads strictly in order.
    pub download_concurrency: usize,
    pub page: PageGeometry,
    pub slide: SlideGeometry,
    /// Scheme used for `//host/...` image references.
    pub protocol_relative_scheme: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            article: FetchSettings::article(),
            image: FetchSettings::image(),
            download_concurrency: 1,
            page: PageGeometry::default(),
            slide: SlideGeometry::default(),
            protocol_relative_scheme: "http".to_string(),
        }
    }
}

/// The full session -> fetch -> extract -> download -> assemble sequence.
pub struct Pipeline {
    article_fetcher: Arc<dyn Fetcher>,
    image_fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn ReferenceExtractor>,
    assemblers: BTreeMap<DocumentKind, Arc<dyn DocumentAssembler>>,
    download_concurrency: usize,
    clock: Clock,
}

impl Pipeline {
    pub fn new(settings: &EngineSettings) -> Self {
        let extractor = LazyImageExtractor::new()
            .with_protocol_relative_scheme(settings.protocol_relative_scheme.clone());
        Self {
            article_fetcher: Arc::new(ReqwestFetcher::new(settings.article.clone())),
            image_fetcher: Arc::new(ReqwestFetcher::new(settings.image.clone())),
            extractor: Arc::new(extractor),
            assemblers: BTreeMap::new(),
            download_concurrency: settings.download_concurrency.max(1),
            clock: Arc::new(Local::now),
        }
        .with_assembler(Arc::new(PagedAssembler::new(settings.page)))
        .with_assembler(Arc::new(SlideAssembler::new(settings.slide)))
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_fetchers(mut self, article: Arc<dyn Fetcher>, image: Arc<dyn Fetcher>) -> Self {
        self.article_fetcher = article;
        self.image_fetcher = image;
        self
    }

    /// Registers (or replaces) the assembler for its document kind.
    pub fn with_assembler(mut self, assembler: Arc<dyn DocumentAssembler>) -> Self {
        self.assemblers.insert(assembler.kind(), assembler);
        self
    }

    /// Executes one run. Never panics on IO failure; the outcome is in the summary.
    ///
    /// Publishes the closing summary line before returning.
    pub async fn run(
        &self,
        request: &RunRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let summary = self.run_stages(request, sink, cancel).await;
        match summary.outcome {
            RunOutcome::SessionFailed(_) | RunOutcome::FetchFailed(_) => {
                sink.error(summary.headline())
            }
            _ => sink.status(summary.headline()),
        }
        summary
    }

    async fn run_stages(
        &self,
        request: &RunRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RunSummary {
        sink.status(format!("Starting run for {}", request.article_url));
        if cancel.is_cancelled() {
            return RunSummary::aborted(None, RunOutcome::Cancelled);
        }

        let session = match create_session(&request.base_dir, (self.clock)(), sink) {
            Ok(session) => session,
            Err(err) => {
                sink.error(format!("Could not create the session folder: {err}"));
                return RunSummary::aborted(None, RunOutcome::SessionFailed(err.to_string()));
            }
        };
        let session_path = session.session_path;
        sink.status(format!("Files will be saved in {}", session_path.display()));

        if cancel.is_cancelled() {
            return RunSummary::aborted(Some(session_path), RunOutcome::Cancelled);
        }

        sink.status(format!(
            "Fetching article {}",
            shorten_for_display(&request.article_url, URL_DISPLAY_LEN)
        ));
        let article = match self.fetch_article(&request.article_url, cancel).await {
            Ok(output) => output,
            Err(err) if err.kind == FailureKind::Cancelled => {
                return RunSummary::aborted(Some(session_path), RunOutcome::Cancelled);
            }
            Err(err) => {
                sink.error(format!("Article request failed: {}: {err}", request.article_url));
                return RunSummary::aborted(Some(session_path), RunOutcome::FetchFailed(err.kind));
            }
        };
        sink.status(format!("Article fetched ({} bytes)", article.metadata.byte_len));

        let decoded = decode_html(&article.bytes, article.metadata.content_type.as_deref());
        if decoded.had_errors {
            sink.warn(format!(
                "Article contained bytes invalid for {}; they were replaced",
                decoded.encoding_label
            ));
        }

        let extraction = self.extractor.extract(&decoded.html);
        if extraction.tags_found == 0 {
            sink.status("No <img> tags found on the page".to_string());
        }
        sink.status(format!(
            "Found {} image tags, {} usable references. Starting downloads...",
            extraction.tags_found,
            extraction.references.len()
        ));

        if cancel.is_cancelled() {
            return RunSummary::aborted(Some(session_path), RunOutcome::Cancelled);
        }

        let downloads = ImageDownloader::new(self.image_fetcher.as_ref())
            .with_concurrency(self.download_concurrency)
            .download_all(&extraction.references, &session_path, sink, cancel)
            .await;
        let downloaded = downloads.images.len();
        let failed = downloads.failures.len();

        if downloads.cancelled {
            return RunSummary {
                session_path: Some(session_path),
                outcome: RunOutcome::Cancelled,
                downloaded,
                failed,
                documents: Vec::new(),
            };
        }

        if downloads.images.is_empty() {
            sink.status("No images were downloaded; no documents will be generated".to_string());
            return RunSummary {
                session_path: Some(session_path),
                outcome: RunOutcome::NothingDownloaded,
                downloaded,
                failed,
                documents: Vec::new(),
            };
        }

        let mut documents = Vec::with_capacity(request.kinds.len());
        for &kind in &request.kinds {
            if cancel.is_cancelled() {
                return RunSummary {
                    session_path: Some(session_path),
                    outcome: RunOutcome::Cancelled,
                    downloaded,
                    failed,
                    documents,
                };
            }
            let result = self.assemble(kind, &downloads.images, request, &session_path, sink);
            documents.push(DocumentReport { kind, result });
        }
        sink.status("All selected documents finished".to_string());

        RunSummary {
            session_path: Some(session_path),
            outcome: RunOutcome::Completed,
            downloaded,
            failed,
            documents,
        }
    }

    async fn fetch_article(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchOutput, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::new(FailureKind::Cancelled, "run cancelled")),
            result = self.article_fetcher.fetch(url) => result,
        }
    }

    fn assemble(
        &self,
        kind: DocumentKind,
        images: &[DownloadedImage],
        request: &RunRequest,
        session_path: &Path,
        sink: &dyn ProgressSink,
    ) -> DocumentResult {
        let Some(assembler) = self.assemblers.get(&kind) else {
            sink.error(format!("No assembler registered for the {}", kind.label()));
            return DocumentResult::Failed("no assembler registered".to_string());
        };
        match assembler.assemble(images, session_path, &request.prefix, sink) {
            Ok(AssemblyOutcome::Saved(doc)) => DocumentResult::Saved {
                path: doc.output_path,
                placed: doc.images.len(),
                skipped: doc.skipped,
            },
            Ok(AssemblyOutcome::NothingToAssemble) => DocumentResult::NothingToAssemble,
            Err(err) => {
                sink.error(format!("Saving the {} failed: {err}", kind.label()));
                DocumentResult::Failed(err.to_string())
            }
        }
    }
}
