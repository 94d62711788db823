//! Export orchestration

pub mod coordinator;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use summary::{RunStatus, RunSummary};
