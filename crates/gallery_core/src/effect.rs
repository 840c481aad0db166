use crate::RunPlan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand a validated plan to the background worker.
    StartRun(RunPlan),
    /// Ask the active run to stop at its next checkpoint.
    CancelRun,
}
