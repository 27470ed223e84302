//! Integration tests for rig-control.
//!
//! These tests drive the public API end to end: command builders, frame
//! assembly, and delivery through the writer task into an in-memory pipe.

use std::time::Duration;

use rig_control::protocol::{checksum, Frame, MIN_FRAME_SIZE};
use rig_control::writer::{spawn_writer_task_default, WriterHandle};
use rig_control::{
    CommandId, Delivery, DryRunOutput, RigControl, RigControlBuilder, RigError, TransportError,
};
use tokio::io::{duplex, AsyncReadExt, DuplexStream};

/// Read until `len` bytes arrived on the far end of the pipe.
async fn read_exact_len(server: &mut DuplexStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    tokio::time::timeout(Duration::from_secs(1), server.read_exact(&mut buf))
        .await
        .expect("timed out waiting for frames")
        .unwrap();
    buf
}

/// Split a byte stream back into frames using the length field.
fn split_frames(mut bytes: &[u8]) -> Vec<Frame> {
    let mut frames = Vec::new();
    while bytes.len() >= MIN_FRAME_SIZE {
        let len = MIN_FRAME_SIZE + bytes[2] as usize;
        frames.push(Frame::decode(&bytes[..len]).unwrap());
        bytes = &bytes[len..];
    }
    assert!(bytes.is_empty(), "trailing bytes: {:?}", bytes);
    frames
}

/// The demo sequence: init, then turn at 1, -1 and 0.
#[tokio::test]
async fn test_demo_sequence_over_pipe() {
    let (client, mut server) = duplex(4096);
    let (writer, _task) = spawn_writer_task_default(client);
    let rig = RigControl::with_transport(writer);

    rig.init().await.unwrap();
    rig.turn(1.0).await.unwrap();
    rig.turn(-1.0).await.unwrap();
    rig.turn(0.0).await.unwrap();

    let bytes = read_exact_len(&mut server, 4 * 6).await;
    assert_eq!(
        bytes,
        vec![
            0x01, 0x01, 0x02, 0x00, 0x00, 0x02, // init
            0x11, 0x02, 0x02, 0x00, 0x01, 0x10, // turn(1)
            0x11, 0x03, 0x02, 0xFF, 0xFF, 0x10, // turn(-1)
            0x11, 0x04, 0x02, 0x00, 0x00, 0x17, // turn(0)
        ]
    );
}

#[tokio::test]
async fn test_turn_to_over_pipe() {
    let (client, mut server) = duplex(4096);
    let (writer, _task) = spawn_writer_task_default(client);
    let rig = RigControl::with_transport(writer);

    let delivery = rig.turn_to(21.7, 3.0).await.unwrap();
    assert!(delivery.is_sent());

    let frames = split_frames(&read_exact_len(&mut server, 7).await);
    let frame = &frames[0];
    assert_eq!(frame.command_id(), CommandId::TurnTo);
    assert_eq!(frame.counter(), 1);
    assert_eq!(frame.payload(), &[0x00, 0xD9, 0x03]);
    assert_eq!(frame.checksum(), checksum(&frame.as_bytes()[..6]));
}

#[tokio::test]
async fn test_dry_run_dump_format() {
    let rig = RigControlBuilder::new()
        .dry_run_output(DryRunOutput::Quiet)
        .build();

    match rig.init().await.unwrap() {
        Delivery::DryRun(dump) => assert_eq!(dump, "0x01, 0x01, 0x02, 0x00, 0x00, 0x02"),
        other => panic!("expected dry run, got {:?}", other),
    }
}

#[tokio::test]
async fn test_counter_wraps_across_256_frames() {
    let rig = RigControlBuilder::new()
        .dry_run_output(DryRunOutput::Quiet)
        .build();

    let mut previous = None;
    for _ in 0..300 {
        let frame = rig.build_frame(&rig_control::Command::init()).unwrap();
        if let Some(prev) = previous {
            assert_eq!(frame.counter(), u8::wrapping_add(prev, 1));
        }
        previous = Some(frame.counter());
    }
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() {
    let (client, mut server) = duplex(4096);
    let (writer, _task) = spawn_writer_task_default(client);
    let rig = RigControl::with_transport(writer);

    assert!(matches!(
        rig.turn_to(-181.0, 10.0).await,
        Err(RigError::InvalidArgument(_))
    ));
    rig.init().await.unwrap();

    // Only the init frame went out, and it got the first counter.
    let frames = split_frames(&read_exact_len(&mut server, 6).await);
    assert_eq!(frames[0].counter(), 1);
}

#[tokio::test]
async fn test_attach_after_dry_run() {
    let (client, mut server) = duplex(4096);
    let (writer, _task) = spawn_writer_task_default(client);

    let mut rig: RigControl<WriterHandle> = RigControl::detached(DryRunOutput::Quiet);
    assert!(!rig.init().await.unwrap().is_sent());

    rig.attach(writer.clone()).unwrap();
    assert!(rig.turn(5.0).await.unwrap().is_sent());
    assert!(matches!(rig.attach(writer), Err(RigError::AlreadyAttached)));

    // The dry-run frame consumed counter 1.
    let frames = split_frames(&read_exact_len(&mut server, 6).await);
    assert_eq!(frames[0].counter(), 2);
    assert_eq!(frames[0].payload(), &[0x00, 0x05]);
}

#[tokio::test]
async fn test_closed_pipe_surfaces_transport_error() {
    let (client, server) = duplex(64);
    drop(server);
    let (writer, task) = spawn_writer_task_default(client);
    let rig = RigControl::with_transport(writer);

    let result = rig.init().await;
    assert!(matches!(
        result,
        Err(RigError::Transport(TransportError::Io(_)))
    ));
    assert!(task.await.unwrap().is_err());

    // Counter was consumed; the writer is gone for good.
    assert_eq!(rig.next_counter(), 2);
    assert!(matches!(
        rig.init().await,
        Err(RigError::Transport(TransportError::ConnectionClosed))
    ));
}

/// Dropping the rig releases the writer, whose task then exits cleanly
/// after every frame reached the sink.
#[tokio::test]
async fn test_dropping_rig_ends_writer_task() {
    let (client, mut server) = duplex(4096);
    let (writer, task) = spawn_writer_task_default(client);
    let rig = RigControl::with_transport(writer);

    rig.init().await.unwrap();
    rig.turn_to(21.7, 3.0).await.unwrap();
    drop(rig);

    let result = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("writer task kept running after the rig was dropped")
        .unwrap();
    assert!(result.is_ok());

    let bytes = read_exact_len(&mut server, 6 + 7).await;
    let frames = split_frames(&bytes);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].command_id(), CommandId::TurnTo);
}
