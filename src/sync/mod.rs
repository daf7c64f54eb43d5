pub mod orchestrator;
pub mod staging;
pub mod transfer;

pub use orchestrator::{FileOutcome, FileStatus, SyncOrchestrator, SyncReport};
pub use staging::StagingArea;
pub use transfer::{is_transfer_complete, LocalMirror, TransferClient};
