//! Link sessions for USB-to-CAN serial adapters.
//!
//! Open a device, send frames, and receive them either one at a time or
//! through a single background worker that hands every decoded frame to a
//! callback.

pub mod error;
pub mod link;
pub mod open;

pub use error::{LinkError, Result};
pub use link::Link;
pub use open::{open, open_path};
