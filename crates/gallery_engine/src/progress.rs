use std::sync::mpsc;

use engine_logging::{engine_error, engine_info, engine_warn};

use crate::EngineEvent;

/// Receives the ordered event stream of a run.
///
/// Every status line is mirrored to the log before it is handed to the sink.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);

    fn status(&self, message: String) {
        engine_info!("{}", message);
        self.emit(EngineEvent::Status(message));
    }

    fn warn(&self, message: String) {
        engine_warn!("{}", message);
        self.emit(EngineEvent::Status(format!("Warning: {message}")));
    }

    fn error(&self, message: String) {
        engine_error!("{}", message);
        self.emit(EngineEvent::Status(format!("Error: {message}")));
    }
}

/// Unbounded FIFO hand-off to the foreground; sending never blocks.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        // A vanished consumer must not stop the run.
        let _ = self.tx.send(event);
    }
}

/// Shortens long URLs for status lines, keeping the cut on a char boundary.
pub fn shorten_for_display(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
