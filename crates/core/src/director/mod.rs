//! Match director: the control loop between the backend and an assigner.
//!
//! On every tick the director fetches newly formed matches for its profile and,
//! when there are any, hands them to the `Assigner` and sends the resulting
//! assignment groups back to the backend:
//! - **Fetch**: retried on transient failures, stream drained into one batch
//! - **Assign**: retried the same way; the batch stays fixed for the tick
//! - **Stop**: on a fatal error or when the cancellation token fires

mod config;
mod runner;
mod types;

pub use config::DirectorConfig;
pub use runner::Director;
pub use types::{Assigner, AssignerError, DirectorError, DirectorState};
