use std::path::Path;

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::fetch::Fetcher;
use crate::persist::AtomicFileWriter;
use crate::progress::{shorten_for_display, ProgressSink};
use crate::{DownloadFailure, DownloadedImage, FetchError, FetchOutput, ImageReference};

pub(crate) const URL_DISPLAY_LEN: usize = 70;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadReport {
    pub images: Vec<DownloadedImage>,
    pub failures: Vec<DownloadFailure>,
    pub cancelled: bool,
}

/// Accumulator threaded through the download loop.
///
/// The next file index is derived from the successes recorded so far, so
/// indices stay dense no matter how many references fail.
#[derive(Debug, Default)]
struct DownloadLedger {
    images: Vec<DownloadedImage>,
    failures: Vec<DownloadFailure>,
}

impl DownloadLedger {
    fn next_index(&self) -> usize {
        self.images.len()
    }

    fn record(
        &mut self,
        reference: &ImageReference,
        result: Result<FetchOutput, FetchError>,
        writer: &AtomicFileWriter,
        sink: &dyn ProgressSink,
    ) {
        let shown = shorten_for_display(&reference.source_url, URL_DISPLAY_LEN);
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                sink.warn(format!("Image download failed: {shown}: {err}"));
                self.fail(reference, err.to_string());
                return;
            }
        };

        let index = self.next_index();
        let filename = format!("{index}.{}", reference.extension);
        match writer.write(&filename, &output.bytes) {
            Ok(local_path) => {
                sink.status(format!("Saved {filename} ({} bytes)", output.bytes.len()));
                self.images.push(DownloadedImage {
                    index,
                    local_path,
                    source_url: reference.source_url.clone(),
                });
            }
            Err(err) => {
                sink.warn(format!("Saving image failed: {filename}: {err}"));
                self.fail(reference, err.to_string());
            }
        }
    }

    fn fail(&mut self, reference: &ImageReference, reason: String) {
        self.failures.push(DownloadFailure {
            source_url: reference.source_url.clone(),
            reason,
        });
    }
}

/// Fetches every reference independently and persists the successes.
///
/// With `concurrency > 1` several requests are in flight, but responses are
/// consumed in submission order, so indices follow reference order among the
/// successful downloads. Files are written one at a time.
pub struct ImageDownloader<'a> {
    fetcher: &'a dyn Fetcher,
    concurrency: usize,
}

impl<'a> ImageDownloader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn download_all(
        &self,
        references: &[ImageReference],
        destination: &Path,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> DownloadReport {
        let total = references.len();
        let fetcher = self.fetcher;
        let writer = AtomicFileWriter::new(destination.to_path_buf());
        let mut ledger = DownloadLedger::default();
        let mut cancelled = false;

        let mut responses = stream::iter(references.iter().enumerate())
            .map(|(position, reference)| async move {
                sink.status(format!(
                    "Downloading ({}/{}): {}",
                    position + 1,
                    total,
                    shorten_for_display(&reference.source_url, URL_DISPLAY_LEN)
                ));
                (reference, fetcher.fetch(&reference.source_url).await)
            })
            .buffered(self.concurrency);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = responses.next() => Some(next),
            };
            match next {
                None => {
                    cancelled = true;
                    break;
                }
                Some(None) => break,
                Some(Some((reference, result))) => {
                    ledger.record(reference, result, &writer, sink);
                }
            }
        }

        if cancelled {
            sink.warn(format!(
                "Download cancelled after {} of {} images",
                ledger.images.len() + ledger.failures.len(),
                total
            ));
        } else {
            sink.status(format!(
                "Image download finished: {} saved, {} failed, folder {}",
                ledger.images.len(),
                ledger.failures.len(),
                destination.display()
            ));
        }

        DownloadReport {
            images: ledger.images,
            failures: ledger.failures,
            cancelled,
        }
    }
}
