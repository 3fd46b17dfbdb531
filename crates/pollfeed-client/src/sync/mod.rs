//! Sync client: local view merge, session state and poll scheduling.

pub mod scheduler;
pub mod session;
pub mod status;
pub mod view;

pub use scheduler::PollScheduler;
pub use session::{Draft, PollReport, SendReport, SharedSession, SyncSession};
pub use status::{ConnectionStatus, FocusState};
pub use view::{LocalView, MergeOutcome};

#[cfg(test)]
pub(crate) mod testing;
