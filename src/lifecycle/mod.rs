//! Lifecycle control of managed resources.
//!
//! `unknown` → `running` | `stopped` by query; a command moves the resource to
//! `transitioning` until the runtime answers, then to `running` / `stopped`,
//! or to `error` / `not_found` / `unknown` on failure.

mod actor;
mod controller;
mod retry;
mod state;

pub use controller::LifecycleController;
pub use retry::CallPolicy;
pub use state::CommandOutcome;
