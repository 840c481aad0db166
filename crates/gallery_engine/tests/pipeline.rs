mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, TimeZone};
use common::{jpeg_bytes, png_bytes, TestSink};
use gallery_engine::{
    AssembleError, AssemblyOutcome, DocumentAssembler, DocumentKind, DocumentResult,
    DownloadedImage, EngineEvent, EngineHandle, EngineSettings, FailureKind, FetchSettings,
    Pipeline, ProgressSink, RunOutcome, RunRequest, StartError,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE: &str = r#"<html><body>
  <img alt="no source">
  <img data-src="//HOST/a.jpg" data-type="image/png">
  <img src="http://HOST/b">
</body></html>"#;

fn pipeline(settings: &EngineSettings) -> Pipeline {
    Pipeline::new(settings).with_clock(Arc::new(|| {
        Local.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
    }))
}

fn request(server: &MockServer, base: &Path, kinds: Vec<DocumentKind>) -> RunRequest {
    RunRequest {
        article_url: format!("{}/article", server.uri()),
        base_dir: base.to_path_buf(),
        prefix: "gallery".to_string(),
        kinds,
    }
}

async fn mount_article(server: &MockServer, html: &str, delay: Duration) {
    let host = server.address().to_string();
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(delay)
                .set_body_raw(html.replace("HOST", &host), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_images(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(64, 32), "image/png"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(jpeg_bytes(30, 60), "image/jpeg"))
        .mount(server)
        .await;
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn full_run_downloads_images_and_writes_both_documents() {
    let server = MockServer::start().await;
    mount_article(&server, ARTICLE, Duration::ZERO).await;
    mount_images(&server).await;
    let temp = TempDir::new().unwrap();
    let sink = TestSink::new();

    let summary = pipeline(&EngineSettings::default())
        .run(
            &request(&server, temp.path(), vec![DocumentKind::Paged, DocumentKind::Slide]),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 0);
    let session = summary.session_path.clone().unwrap();
    assert_eq!(session.file_name().unwrap(), "20240501083000");
    assert_eq!(
        file_names(&session),
        vec!["0.png", "1.jpg", "gallery.docx", "gallery.pptx"]
    );
    assert_eq!(summary.documents.len(), 2);
    assert!(summary.documents.iter().all(|doc| matches!(
        doc.result,
        DocumentResult::Saved { placed: 2, skipped: 0, .. }
    )));

    let lines = sink.lines();
    assert!(lines
        .iter()
        .any(|line| line.starts_with("Found 3 image tags, 2 usable references")));
    assert_eq!(
        lines.last().unwrap(),
        "Run finished: 2 images saved, 0 failed, 2 of 2 documents written"
    );
}

#[tokio::test]
async fn page_without_usable_images_produces_no_documents() {
    let server = MockServer::start().await;
    mount_article(&server, "<html><body><img alt=\"x\"></body></html>", Duration::ZERO).await;
    let temp = TempDir::new().unwrap();
    let sink = TestSink::new();

    let summary = pipeline(&EngineSettings::default())
        .run(
            &request(&server, temp.path(), vec![DocumentKind::Paged, DocumentKind::Slide]),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(summary.outcome, RunOutcome::NothingDownloaded);
    assert!(summary.documents.is_empty());
    assert!(file_names(&summary.session_path.unwrap()).is_empty());
    assert!(sink
        .lines()
        .last()
        .unwrap()
        .contains("nothing was downloaded"));
}

#[tokio::test]
async fn article_served_as_plain_text_is_still_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><img alt=\"x\"></body></html>",
            "text/plain; charset=utf-8",
        ))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let sink = TestSink::new();

    let summary = pipeline(&EngineSettings::default())
        .run(
            &request(&server, temp.path(), vec![DocumentKind::Paged]),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(summary.outcome, RunOutcome::NothingDownloaded);
    assert!(sink
        .lines()
        .iter()
        .any(|line| line.starts_with("Found 1 image tags, 0 usable references")));
}

#[tokio::test]
async fn article_timeout_aborts_after_session_creation() {
    let server = MockServer::start().await;
    mount_article(&server, ARTICLE, Duration::from_millis(300)).await;
    let temp = TempDir::new().unwrap();
    let sink = TestSink::new();
    let settings = EngineSettings {
        article: FetchSettings {
            request_timeout: Duration::from_millis(50),
            ..FetchSettings::article()
        },
        ..EngineSettings::default()
    };

    let summary = pipeline(&settings)
        .run(
            &request(&server, temp.path(), vec![DocumentKind::Paged]),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(summary.outcome, RunOutcome::FetchFailed(FailureKind::Timeout));
    let session = summary.session_path.unwrap();
    assert!(session.is_dir());
    assert!(file_names(&session).is_empty());

    let errors: Vec<_> = sink
        .lines()
        .into_iter()
        .filter(|line| line.starts_with("Error: "))
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("Error: Article request failed"));
    assert!(errors[1].contains("Run aborted"));
}

#[tokio::test]
async fn cancelled_before_start_touches_nothing() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = pipeline(&EngineSettings::default())
        .run(
            &request(&server, temp.path(), vec![DocumentKind::Slide]),
            &TestSink::new(),
            &cancel,
        )
        .await;

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(summary.session_path, None);
    assert!(file_names(temp.path()).is_empty());
}

struct BrokenAssembler;

impl DocumentAssembler for BrokenAssembler {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Paged
    }

    fn assemble(
        &self,
        _images: &[DownloadedImage],
        _output_dir: &Path,
        _prefix: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<AssemblyOutcome, AssembleError> {
        Err(AssembleError::Io(std::io::Error::other("disk full")))
    }
}

#[tokio::test]
async fn failing_document_does_not_stop_the_other_kind() {
    let server = MockServer::start().await;
    mount_article(&server, ARTICLE, Duration::ZERO).await;
    mount_images(&server).await;
    let temp = TempDir::new().unwrap();
    let sink = TestSink::new();

    let summary = pipeline(&EngineSettings::default())
        .with_assembler(Arc::new(BrokenAssembler))
        .run(
            &request(&server, temp.path(), vec![DocumentKind::Paged, DocumentKind::Slide]),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert!(matches!(summary.documents[0].result, DocumentResult::Failed(_)));
    assert!(matches!(summary.documents[1].result, DocumentResult::Saved { .. }));
    assert!(sink
        .lines()
        .iter()
        .any(|line| line.starts_with("Error: Saving the Word document failed")));
}

fn wait_for_finish(engine: &EngineHandle) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        events.extend(engine.drain());
        if matches!(events.last(), Some(EngineEvent::Finished(_))) {
            return events;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("run did not finish in time");
}

fn wait_until_idle(engine: &EngineHandle) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while engine.is_busy() {
        assert!(Instant::now() < deadline, "engine stayed busy");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn engine_runs_one_request_at_a_time() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        mount_article(&server, ARTICLE, Duration::from_millis(200)).await;
        mount_images(&server).await;
        server
    });
    let temp = TempDir::new().unwrap();
    let engine = EngineHandle::with_pipeline(pipeline(&EngineSettings::default()));
    let run = request(&server, temp.path(), vec![DocumentKind::Slide]);

    engine.start(run.clone()).unwrap();
    assert!(engine.is_busy());
    assert_eq!(engine.start(run.clone()), Err(StartError::Busy));

    let events = wait_for_finish(&engine);
    let finished: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, EngineEvent::Finished(_)))
        .collect();
    assert_eq!(finished.len(), 1);
    wait_until_idle(&engine);
    assert!(!engine.cancel());

    // Idle again: the next request is accepted.
    engine.start(run).unwrap();
    wait_for_finish(&engine);
}

#[test]
fn engine_cancel_reports_cancelled_outcome() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        mount_article(&server, ARTICLE, Duration::from_secs(5)).await;
        server
    });
    let temp = TempDir::new().unwrap();
    let engine = EngineHandle::with_pipeline(pipeline(&EngineSettings::default()));

    engine
        .start(request(&server, temp.path(), vec![DocumentKind::Paged]))
        .unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert!(engine.cancel());

    let events = wait_for_finish(&engine);
    let Some(EngineEvent::Finished(summary)) = events.last() else {
        panic!("missing finish event");
    };
    assert_eq!(summary.outcome, RunOutcome::Cancelled);
}

#[test]
fn finish_event_is_queued_before_engine_reports_idle() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        mount_article(&server, ARTICLE, Duration::from_millis(50)).await;
        server
    });
    let temp = TempDir::new().unwrap();
    let engine = EngineHandle::with_pipeline(pipeline(&EngineSettings::default()));

    engine
        .start(request(&server, temp.path(), vec![DocumentKind::Paged]))
        .unwrap();
    wait_until_idle(&engine);

    let events = engine.drain();
    assert!(matches!(events.last(), Some(EngineEvent::Finished(_))));
}
