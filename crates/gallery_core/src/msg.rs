use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the article URL.
    UrlChanged(String),
    /// User edited the document filename prefix.
    PrefixChanged(String),
    /// User picked the base output folder.
    BaseDirChosen(PathBuf),
    /// User toggled Word document output.
    PagedToggled(bool),
    /// User toggled slide deck output.
    SlideToggled(bool),
    StartClicked,
    CancelClicked,
    /// The worker refused the run (already busy or gone).
    StartRejected(String),
    /// One progress line from the worker.
    Progress(String),
    /// Terminal event of the active run.
    RunFinished(crate::RunResultKind),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
