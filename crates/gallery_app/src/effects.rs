use engine_logging::{engine_info, engine_warn};
use gallery_core::{Effect, Msg, RunPlan, RunResultKind};
use gallery_engine::{
    DocumentKind, EngineEvent, EngineHandle, EngineSettings, RunOutcome, RunRequest, RunSummary,
};

/// Executes core effects against the engine and turns engine events back
/// into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            engine: EngineHandle::new(settings),
        }
    }

    /// Messages produced synchronously while executing, e.g. a refused start.
    pub fn execute(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut replies = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartRun(plan) => {
                    engine_info!(
                        "StartRun url={} prefix={} paged={} slides={}",
                        plan.article_url,
                        plan.prefix,
                        plan.paged,
                        plan.slides
                    );
                    if let Err(err) = self.engine.start(request_from_plan(plan)) {
                        engine_warn!("Run not started: {}", err);
                        replies.push(Msg::StartRejected(err.to_string()));
                    }
                }
                Effect::CancelRun => {
                    if !self.engine.cancel() {
                        engine_info!("Cancel requested but no run is active");
                    }
                }
            }
        }
        replies
    }

    /// Drains pending engine events without blocking.
    pub fn poll(&self) -> Vec<Msg> {
        self.engine.drain().into_iter().map(msg_from_event).collect()
    }
}

pub(crate) fn request_from_plan(plan: RunPlan) -> RunRequest {
    let mut kinds = Vec::with_capacity(2);
    if plan.paged {
        kinds.push(DocumentKind::Paged);
    }
    if plan.slides {
        kinds.push(DocumentKind::Slide);
    }
    RunRequest {
        article_url: plan.article_url,
        base_dir: plan.base_dir,
        prefix: plan.prefix,
        kinds,
    }
}

pub(crate) fn msg_from_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Status(line) => Msg::Progress(line),
        EngineEvent::Finished(summary) => Msg::RunFinished(result_kind(&summary)),
    }
}

fn result_kind(summary: &RunSummary) -> RunResultKind {
    match summary.outcome {
        RunOutcome::Completed => RunResultKind::Completed,
        RunOutcome::NothingDownloaded => RunResultKind::NothingDownloaded,
        RunOutcome::SessionFailed(_) | RunOutcome::FetchFailed(_) => RunResultKind::Failed,
        RunOutcome::Cancelled => RunResultKind::Cancelled,
    }
}
