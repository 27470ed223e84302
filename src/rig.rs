//! Rig control encoder and dispatcher.
//!
//! [`RigControl`] owns the sequence counter and the link to the rig. Its
//! command methods validate arguments, assemble a frame and dispatch it:
//! 1. Validate arguments (nothing is built on failure)
//! 2. Encode the payload and assemble the frame (counter advances)
//! 3. Dry run: print the hex dump. Attached: write to the transport
//!
//! # Example
//!
//! ```
//! use rig_control::{Delivery, RigControl};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> rig_control::Result<()> {
//! let rig = RigControl::new();
//!
//! let delivery = rig.init().await?;
//! assert_eq!(
//!     delivery,
//!     Delivery::DryRun("0x01, 0x01, 0x02, 0x00, 0x00, 0x02".to_string())
//! );
//!
//! rig.turn_to(21.7, 3.0).await?;
//! rig.turn(-1.0).await?;
//! # Ok(())
//! # }
//! ```

use tokio::task::JoinHandle;

use crate::error::{RigError, Result, TransportError};
use crate::protocol::{assemble_frame, Command, Frame, SequenceCounter, INITIAL_COUNTER};
use crate::transport::{open_serial, DryRun, DryRunOutput, SerialConfig, Transport, WriteAck};
use crate::writer::WriterHandle;

/// Where frames go.
#[derive(Debug)]
enum Link<T> {
    /// No transport: frames are printed.
    Detached(DryRun),
    /// Frames are written to a live transport.
    Attached(T),
}

/// Outcome of dispatching one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Detached: the hex dump that was printed.
    DryRun(String),
    /// Attached: the transport accepted the frame.
    Sent(WriteAck),
}

impl Delivery {
    /// True if the frame went to a live transport.
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent(_))
    }
}

/// Builder for [`RigControl`].
///
/// # Example
///
/// ```
/// use rig_control::{DryRunOutput, RigControlBuilder};
///
/// let rig = RigControlBuilder::new()
///     .dry_run_output(DryRunOutput::Quiet)
///     .initial_counter(250)
///     .build();
/// assert_eq!(rig.next_counter(), 250);
/// ```
pub struct RigControlBuilder<T = WriterHandle> {
    transport: Option<T>,
    dry_run_output: DryRunOutput,
    initial_counter: u8,
}

impl RigControlBuilder {
    /// Create a builder for a detached encoder.
    pub fn new() -> Self {
        Self {
            transport: None,
            dry_run_output: DryRunOutput::default(),
            initial_counter: INITIAL_COUNTER,
        }
    }
}

impl Default for RigControlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> RigControlBuilder<T> {
    /// Attach a live transport from the start.
    pub fn transport<U: Transport>(self, transport: U) -> RigControlBuilder<U> {
        RigControlBuilder {
            transport: Some(transport),
            dry_run_output: self.dry_run_output,
            initial_counter: self.initial_counter,
        }
    }

    /// Where dry-run dumps go while detached. Default: stdout.
    pub fn dry_run_output(mut self, output: DryRunOutput) -> Self {
        self.dry_run_output = output;
        self
    }

    /// Counter value of the first frame. Default: 1.
    pub fn initial_counter(mut self, value: u8) -> Self {
        self.initial_counter = value;
        self
    }

    pub fn build(self) -> RigControl<T> {
        let link = match self.transport {
            Some(transport) => Link::Attached(transport),
            None => Link::Detached(DryRun::new(self.dry_run_output)),
        };
        RigControl {
            counter: SequenceCounter::starting_at(self.initial_counter),
            link,
        }
    }
}

/// Command encoder bound to a rig link.
///
/// Command methods take `&self`; frames issued concurrently still get
/// distinct counters. Frames arrive in issue order only when each call is
/// awaited before the next one.
#[derive(Debug)]
pub struct RigControl<T = WriterHandle> {
    counter: SequenceCounter,
    link: Link<T>,
}

impl RigControl {
    /// Detached encoder printing dry-run dumps to stdout.
    pub fn new() -> Self {
        RigControlBuilder::new().build()
    }

    /// Open a serial port and attach it.
    ///
    /// Returns the encoder and the writer task handle. Must be called
    /// inside a tokio runtime.
    pub fn open_serial(
        config: &SerialConfig,
    ) -> Result<(Self, JoinHandle<std::result::Result<(), TransportError>>)> {
        let (writer, task) = open_serial(config)?;
        let rig = RigControlBuilder::new().transport(writer).build();
        Ok((rig, task))
    }
}

impl Default for RigControl {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> RigControl<T> {
    /// Detached encoder for transport type `T`.
    pub fn detached(output: DryRunOutput) -> Self {
        Self {
            counter: SequenceCounter::new(),
            link: Link::Detached(DryRun::new(output)),
        }
    }

    /// Encoder attached to `transport`.
    pub fn with_transport(transport: T) -> Self {
        RigControlBuilder::new().transport(transport).build()
    }

    /// Attach a live transport.
    ///
    /// Allowed once; an attached encoder never goes back to dry run.
    pub fn attach(&mut self, transport: T) -> Result<()> {
        if self.is_attached() {
            return Err(RigError::AlreadyAttached);
        }
        self.link = Link::Attached(transport);
        tracing::debug!("transport attached");
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.link, Link::Attached(_))
    }

    /// Counter value the next frame will get.
    pub fn next_counter(&self) -> u8 {
        self.counter.peek()
    }

    /// Send `INIT`.
    pub async fn init(&self) -> Result<Delivery> {
        self.send(Command::init()).await
    }

    /// Send `TURN_TO`: `target_degree` in `-180..=180`, `speed` in `1..=255`.
    pub async fn turn_to(&self, target_degree: f64, speed: f64) -> Result<Delivery> {
        self.send(Command::turn_to(target_degree, speed)?).await
    }

    /// Send `TURN` with a raw speed value.
    pub async fn turn(&self, speed: f64) -> Result<Delivery> {
        self.send(Command::turn(speed)?).await
    }

    /// Build and dispatch a command.
    pub async fn send(&self, command: Command) -> Result<Delivery> {
        let frame = self.build_frame(&command)?;
        self.dispatch(frame).await
    }

    /// Assemble the frame for `command`, consuming a counter value.
    pub fn build_frame(&self, command: &Command) -> Result<Frame> {
        let payload = command.encode_payload();
        assemble_frame(&self.counter, command.id(), Some(&payload))
    }

    /// Print or write an assembled frame.
    pub async fn dispatch(&self, frame: Frame) -> Result<Delivery> {
        match &self.link {
            Link::Detached(dry_run) => Ok(Delivery::DryRun(dry_run.emit(&frame))),
            Link::Attached(transport) => {
                let counter = frame.counter();
                match transport.write(frame).await {
                    Ok(ack) => Ok(Delivery::Sent(ack)),
                    Err(e) => {
                        tracing::warn!(counter, "Frame dispatch failed: {}", e);
                        Err(e.into())
                    }
                }
            }
        }
    }
}
