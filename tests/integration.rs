//! Integration tests for jdwp-client.
//!
//! A scripted fake VM sits on the far end of an in-memory duplex stream and
//! answers commands frame by frame.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use jdwp_client::codec::{field, Seq, Shape, Value};
use jdwp_client::jdwp::{
    codes, command_set, event, schema, virtual_machine, EventKind, EventRequestSet, Location,
    SuspendPolicy,
};
use jdwp_client::protocol::{Frame, Header, HEADER_SIZE};
use jdwp_client::transport::{
    accept_handshake, ConnectionState, FrameReader, FrameWriter, HANDSHAKE,
};
use jdwp_client::{ErrorKind, JdwpError, Session, SessionBuilder};
use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

/// Peer side of the connection.
struct FakeVm {
    reader: FrameReader<ReadHalf<DuplexStream>>,
    writer: FrameWriter<WriteHalf<DuplexStream>>,
}

impl FakeVm {
    async fn next_command(&mut self) -> Frame {
        self.reader.read_frame().await.unwrap()
    }

    async fn reply(&mut self, id: u32, code: u16, payload: &[u8]) {
        let header = Header::reply(id, code, payload.len() as u32);
        self.writer.write_frame(&header, payload).await.unwrap();
    }

    async fn event(&mut self, id: u32, payload: &[u8]) {
        self.writer
            .write_command(id, command_set::EVENT, event::COMPOSITE, payload)
            .await
            .unwrap();
    }

    /// Answer the next command with `payload` and return the command.
    async fn answer(&mut self, payload: &[u8]) -> Frame {
        let frame = self.next_command().await;
        self.reply(frame.id(), 0, payload).await;
        frame
    }
}

async fn connect() -> (Session, FakeVm) {
    connect_with(Session::builder(), 64 * 1024).await
}

async fn connect_with(builder: SessionBuilder, buffer: usize) -> (Session, FakeVm) {
    let (client, mut server) = duplex(buffer);
    let peer = tokio::spawn(async move {
        accept_handshake(&mut server, HANDSHAKE).await.unwrap();
        server
    });

    let session = builder.open(client).await.unwrap();
    let (read_half, write_half) = split(peer.await.unwrap());
    let vm = FakeVm {
        reader: FrameReader::new(read_half),
        writer: FrameWriter::new(write_half),
    };
    (session, vm)
}

fn hex(s: &str) -> Vec<u8> {
    let digits: Vec<u8> = s.bytes().filter(u8::is_ascii_hexdigit).collect();
    digits
        .chunks(2)
        .map(|pair| u8::from_str_radix(std::str::from_utf8(pair).unwrap(), 16).unwrap())
        .collect()
}

#[tokio::test]
async fn test_handshake_opens_session() {
    let (session, _vm) = connect().await;
    assert_eq!(session.state(), ConnectionState::Open);
}

#[tokio::test]
async fn test_handshake_mismatch_aborts() {
    let (client, mut server) = duplex(1024);
    let peer = tokio::spawn(async move {
        let mut buf = [0u8; 14];
        server.read_exact(&mut buf).await.unwrap();
        server.write_all(b"JDWP-Handshakx").await.unwrap();
        server
    });

    let err = match Session::open(client).await {
        Err(e) => e,
        Ok(_) => panic!("handshake should fail"),
    };
    assert!(matches!(err, JdwpError::HandshakeMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);

    // The client shut its write side down.
    let mut server = peer.await.unwrap();
    let mut rest = Vec::new();
    server.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_counted_sequence_reply() {
    let (session, mut vm) = connect().await;
    let shape = Shape::record([
        field("count", Shape::I32),
        field(
            "items",
            Shape::sequence(
                "count",
                Shape::record([
                    field("tag", Shape::U8),
                    field("id", Shape::U64),
                    field("status", Shape::I32),
                ]),
            ),
        ),
    ]);
    let payload = hex("00000001 01 0000000000000001 00000007");

    let (value, _) = tokio::join!(
        session.call_decode(1, 2, &[], &shape),
        vm.answer(&payload)
    );
    let value = value.unwrap();

    let items = value.get("items").and_then(Value::as_sequence).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("tag"), Some(&Value::U8(1)));
    assert_eq!(items[0].get("id"), Some(&Value::U64(1)));
    assert_eq!(items[0].get("status"), Some(&Value::I32(7)));
}

#[tokio::test]
async fn test_composite_breakpoint_event() {
    let (session, mut vm) = connect().await;
    let mut events = session.events().unwrap();

    let body = hex(
        "01 00000001 02 00000002 0000000000000003 01 0000000000000002 00007f9475c27c10 0000000000000000",
    );
    vm.event(100, &body).await;

    let frame = events.recv().await.unwrap();
    assert_eq!(frame.id, 100);
    assert_eq!(frame.command_set, command_set::EVENT);
    assert_eq!(frame.command, event::COMPOSITE);

    let value = session.decode_composite(&frame).unwrap().unwrap();
    assert_eq!(value.get("suspendPolicy"), Some(&Value::U8(1)));

    let list = value.get("events").and_then(Value::as_sequence).unwrap();
    assert_eq!(list.len(), 1);
    let breakpoint = list[0].as_tagged().unwrap();
    assert_eq!(breakpoint.tag, EventKind::Breakpoint.as_u8());
    assert_eq!(breakpoint.variant, "Breakpoint");
    assert_eq!(breakpoint.value.get("requestId"), Some(&Value::I32(2)));
    assert_eq!(breakpoint.value.get("thread"), Some(&Value::U64(3)));

    let location = Location::from_value(breakpoint.value.get("location").unwrap()).unwrap();
    assert_eq!(location, Location::in_class(2, 0x7f9475c27c10, 0));
}

#[tokio::test]
async fn test_send_puts_one_frame_on_the_wire() {
    let (session, mut vm) = connect().await;

    let (id, _rx) = session.send(15, 1, b"payload").await.unwrap();
    let frame = vm.next_command().await;

    assert_eq!(frame.id(), id);
    assert_eq!(frame.header.length as usize, HEADER_SIZE + 7);
    assert_eq!(frame.header.command_set(), 15);
    assert_eq!(frame.header.command_id(), 1);
    assert_eq!(frame.payload, Bytes::from_static(b"payload"));
}

#[tokio::test]
async fn test_concurrent_sends_get_distinct_ids() {
    let (session, mut vm) = connect().await;
    let session = Arc::new(session);

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            let (id, _rx) = session.send(1, 1, &[]).await.unwrap();
            id
        }));
    }

    let mut sent = HashSet::new();
    for task in tasks {
        assert!(sent.insert(task.await.unwrap()));
    }

    let mut seen = HashSet::new();
    for _ in 0..32 {
        seen.insert(vm.next_command().await.id());
    }
    assert_eq!(sent, seen);
}

#[tokio::test]
async fn test_call_leaves_nothing_pending() {
    let (session, mut vm) = connect().await;

    let (reply, _) = tokio::join!(session.call(1, 1, &[]), vm.answer(b"ok"));
    assert_eq!(reply.unwrap().data(), b"ok");
    assert_eq!(session.pending_count(), 0);

    let (reply, _) = tokio::join!(session.call(1, 1, &[]), async {
        let frame = vm.next_command().await;
        vm.reply(frame.id(), codes::INVALID_THREAD, &[]).await;
    });
    let reply = reply.unwrap();
    assert_eq!(reply.error_code, codes::INVALID_THREAD);
    assert_eq!(session.pending_count(), 0);
}

#[tokio::test]
async fn test_call_checked_maps_error_code() {
    let (session, mut vm) = connect().await;

    let (result, _) = tokio::join!(session.call_checked(11, 1, &[]), async {
        let frame = vm.next_command().await;
        vm.reply(frame.id(), codes::INVALID_THREAD, &[]).await;
    });

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Application);
    assert_eq!(err.error_code(), Some(codes::INVALID_THREAD));
    assert!(err.to_string().contains("not a valid thread"));
}

#[tokio::test]
async fn test_disposed_reply_is_dropped() {
    let (session, mut vm) = connect().await;
    let mut events = session.events().unwrap();

    let (id, _rx) = session.send(1, 1, &[]).await.unwrap();
    assert!(session.dispose(id));
    assert_eq!(session.pending_count(), 0);

    let frame = vm.next_command().await;
    vm.reply(frame.id(), 0, b"late").await;
    vm.event(500, &[]).await;

    assert_eq!(events.recv().await.unwrap().id, 500);
}

#[tokio::test]
async fn test_cancelled_call_is_disposed() {
    let (session, mut vm) = connect().await;
    let mut events = session.events().unwrap();

    let call = tokio::time::timeout(Duration::from_millis(50), session.call(1, 1, &[])).await;
    assert!(call.is_err());
    assert_eq!(session.pending_count(), 0);

    let frame = vm.next_command().await;
    vm.reply(frame.id(), 0, &[]).await;
    vm.event(9, &[]).await;
    assert_eq!(events.recv().await.unwrap().id, 9);
}

#[tokio::test]
async fn test_cancelled_large_call_keeps_framing() {
    let (session, mut vm) = connect_with(Session::builder(), 64).await;

    let call = tokio::time::timeout(
        Duration::from_millis(50),
        session.call(1, 1, &[0xAA; 1000]),
    )
    .await;
    assert!(call.is_err());

    let (sent, (big, small)) = tokio::join!(session.send(1, 7, b"xy"), async {
        (vm.next_command().await, vm.next_command().await)
    });
    let (id, _rx) = sent.unwrap();

    assert_eq!(big.payload.len(), 1000);
    assert!(big.payload.iter().all(|b| *b == 0xAA));
    assert_eq!(small.id(), id);
    assert_eq!(small.header.command_id(), 7);
    assert_eq!(&small.payload[..], b"xy");
    assert_eq!(session.pending_count(), 1);
}

#[tokio::test]
async fn test_close_with_peer_not_reading() {
    let (session, _vm) = connect_with(Session::builder(), 64).await;
    let session = Arc::new(session);

    let caller = session.clone();
    let call = tokio::spawn(async move { caller.call(1, 1, &[0u8; 4096]).await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let closed = tokio::time::timeout(Duration::from_millis(500), session.close()).await;
    assert!(closed.is_ok(), "close hung");
    assert_eq!(session.state(), ConnectionState::Closed);

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, JdwpError::ConnectionClosed));
    assert_eq!(session.pending_count(), 0);
}

#[tokio::test]
async fn test_events_arrive_in_receipt_order() {
    let (session, mut vm) = connect().await;
    let mut events = session.events().unwrap();

    let (id, rx) = session.send(1, 1, &[]).await.unwrap();
    let frame = vm.next_command().await;
    assert_eq!(frame.id(), id);

    vm.event(101, b"a").await;
    vm.reply(id, 0, b"r").await;
    vm.event(102, b"b").await;
    vm.event(103, b"c").await;

    let reply = rx.recv().await.unwrap();
    assert_eq!(&reply.data[..], b"r");

    let mut seen = Vec::new();
    for _ in 0..3 {
        let event = events.recv().await.unwrap();
        seen.push((event.id, event.data.to_vec()));
    }
    assert_eq!(
        seen,
        vec![
            (101, b"a".to_vec()),
            (102, b"b".to_vec()),
            (103, b"c".to_vec())
        ]
    );
}

#[tokio::test]
async fn test_full_event_queue_holds_back_replies() {
    let (session, mut vm) = connect_with(Session::builder().event_capacity(1), 64 * 1024).await;
    let mut events = session.events().unwrap();

    let (id, rx) = session.send(1, 1, &[]).await.unwrap();
    vm.next_command().await;
    for event_id in 1..=3u32 {
        vm.event(event_id, &[]).await;
    }
    vm.reply(id, 0, b"late").await;

    let reply = rx.recv();
    tokio::pin!(reply);
    let early = tokio::time::timeout(Duration::from_millis(100), &mut reply).await;
    assert!(early.is_err(), "reply overtook queued events");
    assert_eq!(session.pending_count(), 1);

    for event_id in 1..=3u32 {
        assert_eq!(events.recv().await.unwrap().id, event_id);
    }
    let reply = reply.await.unwrap();
    assert_eq!(&reply.data[..], b"late");
    assert_eq!(session.pending_count(), 0);
}

#[tokio::test]
async fn test_event_stream_ends_on_eof() {
    let (session, vm) = connect().await;
    let mut events = session.events().unwrap();

    drop(vm);
    assert!(events.recv().await.is_none());
    assert!(matches!(session.events(), Err(JdwpError::EventsTaken)));
}

#[tokio::test]
async fn test_close_then_send_fails() {
    let (session, _vm) = connect().await;

    session.close().await.unwrap();
    session.close().await.unwrap();
    assert_eq!(session.state(), ConnectionState::Closed);

    let err = session.call(1, 1, &[]).await.unwrap_err();
    assert!(matches!(err, JdwpError::ConnectionClosed));
}

#[tokio::test]
async fn test_vm_version() {
    let (session, mut vm) = connect().await;
    let payload = Seq::new()
        .string("Java Debug Wire Protocol")
        .int(17)
        .int(0)
        .string("17.0.2")
        .string("OpenJDK 64-Bit Server VM")
        .marshal()
        .unwrap();

    let (version, frame) = tokio::join!(session.vm_version(), vm.answer(&payload));
    assert_eq!(frame.header.command_set(), command_set::VIRTUAL_MACHINE);
    assert_eq!(frame.header.command_id(), virtual_machine::VERSION);

    let version = version.unwrap();
    assert_eq!(version.get("jdwpMajor"), Some(&Value::I32(17)));
    assert_eq!(version.get("vmVersion").and_then(Value::as_str), Some("17.0.2"));

    let json = serde_json::to_value(&version).unwrap();
    assert_eq!(json["vmName"], "OpenJDK 64-Bit Server VM");
}

#[tokio::test]
async fn test_classes_by_signature() {
    let (session, mut vm) = connect().await;
    let payload = Seq::new()
        .int(1)
        .octet(1)
        .u64(0x2a)
        .int(7)
        .marshal()
        .unwrap();

    let (classes, frame) = tokio::join!(
        session.classes_by_signature("Ljava/lang/String;"),
        vm.answer(&payload)
    );
    let classes = classes.unwrap();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].class_id, 0x2a);
    assert_eq!(classes[0].status, 7);

    // u32 length prefix, then the signature bytes
    assert_eq!(&frame.payload[..4], &[0, 0, 0, 18]);
    assert_eq!(&frame.payload[4..], b"Ljava/lang/String;");
}

#[tokio::test]
async fn test_set_breakpoint_request() {
    let (session, mut vm) = connect().await;
    let request = EventRequestSet::new(EventKind::Breakpoint, SuspendPolicy::EventThread)
        .location_only(Location::in_class(2, 3, 0));
    let reply = Seq::new().int(41).marshal().unwrap();

    let (request_id, frame) = tokio::join!(session.set_event_request(&request), vm.answer(&reply));
    assert_eq!(request_id.unwrap(), 41);
    assert_eq!(frame.payload.len(), 1 + 1 + 4 + 1 + 25);
    assert_eq!(&frame.payload[..2], &[2, 1]);
}

#[tokio::test]
async fn test_thread_frames() {
    let (session, mut vm) = connect().await;
    let mut seq = Seq::new();
    seq.int(1).u64(0x99).write(&Location::in_class(2, 3, 4));
    let payload = seq.marshal().unwrap();

    let (frames, _) = tokio::join!(session.thread_frames(5, 0, -1), vm.answer(&payload));
    let frames = frames.unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].thread, 5);
    assert_eq!(frames[0].frame_id, 0x99);
    assert_eq!(frames[0].location, Location::in_class(2, 3, 4));
}

#[tokio::test]
async fn test_reply_decode_failure_is_schema_or_framing() {
    let (session, mut vm) = connect().await;
    let shape = schema::event_request_set();

    let (result, _) = tokio::join!(
        session.call_decode(1, 1, &[], &shape),
        vm.answer(&[0, 0])
    );
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Framing);
}
