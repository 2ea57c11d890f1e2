//! Durable event buffering
//!
//! [`AsyncLogger`] is the hand-off between the HTTP boundary and the
//! filesystem: `consume` queues a fact for its token's writer task and
//! returns once queued — *queued for durable write*, not persisted. Each
//! token gets one writer task owning one `.open` file; a rotation timer in
//! the same task closes and renames the file so append and rotate never
//! race. Closed files are picked up by the uploader.

mod clock;
mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use writer::{AsyncLogger, LogWriterConfig, LogWriterError};
