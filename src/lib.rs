//! # rig-control
//!
//! Command framing and transport for motorized rigs (rotators) driven over
//! a serial link.
//!
//! ## Architecture
//!
//! - **Protocol**: `[cmd id, counter, length, payload…, xor checksum]` frames
//! - **Encoder** ([`RigControl`]): validates arguments, assigns sequence
//!   counters, and dispatches frames
//! - **Transport**: a dry-run hex printer, or a writer task in front of a
//!   serial port or any async byte sink
//!
//! Frames are fire-and-forget; nothing is read back from the rig.
//!
//! ## Example
//!
//! ```ignore
//! use rig_control::{RigControl, SerialConfig};
//!
//! #[tokio::main]
//! async fn main() -> rig_control::Result<()> {
//!     let (rig, _writer) = RigControl::open_serial(&SerialConfig::default())?;
//!
//!     rig.init().await?;
//!     rig.turn_to(21.7, 3.0).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod transport;
pub mod writer;

mod rig;

pub use error::{ArgumentError, Result, RigError, TransportError};
pub use protocol::{Command, CommandId, Frame};
pub use rig::{Delivery, RigControl, RigControlBuilder};
pub use transport::{DryRun, DryRunOutput, SerialConfig, Transport, WriteAck};
pub use writer::WriterHandle;
