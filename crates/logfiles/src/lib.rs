//! Closed log files: naming protocol, delivery status and the uploader
//!
//! The buffer directory is the hand-off point between the writer and the
//! uploader. The writer appends to `*.log.open` files it owns exclusively;
//! a rename makes the file visible to the uploader, which ships it to every
//! configured destination and deletes it once all of them acknowledge.
//! Delivery state is persisted in a `<logfile>.status` sidecar so delivery
//! stays exactly-once across process restarts.

pub mod naming;
mod status;
mod uploader;

pub use status::{DestinationStatus, StatusManager};
pub use uploader::{PeriodicUploader, UploaderConfig, UploaderError};
