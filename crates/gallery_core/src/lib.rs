//! Gallery core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod validate;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, FormState, RunPlan, RunResultKind, RunState, MAX_LOG_LINES};
pub use update::update;
pub use validate::{validate_form, validate_prefix, ConfigError};
pub use view_model::AppViewModel;
