//! Training state: hyperparameters, stateful values and checkpoint files.

mod checkpoint;
mod hyperparameters;
mod lr_scheduler;
mod state;

pub use checkpoint::*;
pub use hyperparameters::*;
pub use lr_scheduler::*;
pub use state::*;
