//! Rotate demo - sends the interface init and a few turn commands.
//!
//! Without arguments the frames are only printed (dry run):
//!
//! ```text
//! $ cargo run --example rotate
//! would send: 0x01, 0x01, 0x02, 0x00, 0x00, 0x02
//! would send: 0x11, 0x02, 0x02, 0x00, 0x01, 0x10
//! ...
//! ```
//!
//! Pass a serial device (or a JSON config file) to send them for real:
//!
//! ```text
//! $ cargo run --example rotate -- /dev/ttyUSB0
//! $ cargo run --example rotate -- rig-serial.json
//! ```

use rig_control::{transport, RigControl, RigError, SerialConfig, TransportError};
use tokio::task::JoinHandle;

type WriterTask = JoinHandle<Result<(), TransportError>>;

/// Open the serial link, listing the ports that do exist if it fails.
fn open(config: &SerialConfig) -> rig_control::Result<(RigControl, WriterTask)> {
    RigControl::open_serial(config).map_err(|e| {
        if let RigError::Serial(_) = &e {
            eprintln!("cannot open {}: {}", config.path, e);
            match transport::available_ports() {
                Ok(ports) if ports.is_empty() => eprintln!("no serial ports found"),
                Ok(ports) => eprintln!("available ports: {}", ports.join(", ")),
                Err(list_err) => eprintln!("cannot list serial ports: {}", list_err),
            }
        }
        e
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (rig, writer) = match std::env::args().nth(1) {
        Some(arg) if arg.ends_with(".json") => {
            let (rig, writer) = open(&SerialConfig::from_file(&arg)?)?;
            (rig, Some(writer))
        }
        Some(path) => {
            let (rig, writer) = open(&SerialConfig::with_path(path))?;
            (rig, Some(writer))
        }
        None => (RigControl::new(), None),
    };

    rig.init().await?;
    rig.turn(1.0).await?;
    rig.turn(-1.0).await?;
    rig.turn(0.0).await?;
    rig.turn_to(21.7, 3.0).await?;

    // Dropping the last handle lets the writer task drain and exit.
    drop(rig);
    if let Some(writer) = writer {
        writer.await??;
    }

    Ok(())
}
