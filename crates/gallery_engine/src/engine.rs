use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use engine_logging::{engine_error, engine_info};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::pipeline::{EngineSettings, Pipeline};
use crate::progress::{ChannelProgressSink, ProgressSink};
use crate::{EngineEvent, RunRequest};

enum EngineCommand {
    Run {
        request: RunRequest,
        cancel: CancellationToken,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("a run is already in progress")]
    Busy,
    #[error("the background worker has stopped")]
    WorkerGone,
}

/// Foreground handle to the single background worker.
///
/// At most one run executes at a time. Events arrive in emission order and
/// every accepted run ends with exactly one `EngineEvent::Finished`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    busy: Arc<AtomicBool>,
    current_cancel: Mutex<Option<CancellationToken>>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_pipeline(Pipeline::new(&settings))
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let busy = Arc::new(AtomicBool::new(false));
        let worker_busy = busy.clone();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("Failed to start the worker runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Run { request, cancel } => {
                        let sink = ChannelProgressSink::new(event_tx.clone());
                        let summary = runtime.block_on(pipeline.run(&request, &sink, &cancel));
                        // Idle only once the final event is queued.
                        sink.emit(EngineEvent::Finished(summary));
                        worker_busy.store(false, Ordering::SeqCst);
                    }
                }
            }
        });

        Self {
            cmd_tx,
            event_rx,
            busy,
            current_cancel: Mutex::new(None),
        }
    }

    /// Hands a run to the worker. Rejected while another run is active.
    pub fn start(&self, request: RunRequest) -> Result<(), StartError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StartError::Busy);
        }

        let cancel = CancellationToken::new();
        if let Ok(mut slot) = self.current_cancel.lock() {
            *slot = Some(cancel.clone());
        }
        engine_info!("Starting run for {}", request.article_url);
        if self
            .cmd_tx
            .send(EngineCommand::Run { request, cancel })
            .is_err()
        {
            self.busy.store(false, Ordering::SeqCst);
            return Err(StartError::WorkerGone);
        }
        Ok(())
    }

    /// Requests cancellation of the active run. Returns false when idle.
    pub fn cancel(&self) -> bool {
        if !self.is_busy() {
            return false;
        }
        match self.current_cancel.lock() {
            Ok(slot) => match slot.as_ref() {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Everything queued so far, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<EngineEvent> {
        self.event_rx.try_iter().collect()
    }
}
