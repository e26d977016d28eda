use std::sync::{Arc, Mutex};

use knitlink_ayab::{AyabMessage, InfoReply};
use knitlink_control::{Envelope, MessageId, SystemInfo};
use knitlink_frame::{encode_to_vec, END, ESC};
use knitlink_session::{Diagnostic, Inbound, Session, SessionConfig};
use knitlink_transport::{MemoryTransport, Transport, TransportEvent, Unit};

const SYSTEM_INFO_REPLY: &str = r#"{"id":129,"data":{"esp-idf":{"version":"v5.2.1"},"esp32_firmware":{"version":"0.4.0","compile_date":"Mar  3 2024","compile_time":"10:11:12"}}}"#;

fn open_session() -> Session<MemoryTransport> {
    let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
    session.on_open().unwrap();
    session.transport_mut().take_sent();
    session
}

fn record_diagnostics(session: &mut Session<MemoryTransport>) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.on_diagnostic(move |diag: &Diagnostic| sink.lock().unwrap().push(diag.to_string()));
    seen
}

fn info_reply_payload() -> Vec<u8> {
    let mut payload = vec![0xC3, 0x01, 0x02, 0x01, 0x00];
    payload.extend_from_slice(b"FIRMWARETAG12345");
    payload
}

#[test]
fn system_info_reply_reaches_its_handler() {
    let mut session = open_session();
    let replies = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&replies);
    session.on_control(129, move |env: &Envelope| {
        sink.lock().unwrap().push(env.data_as::<SystemInfo>().unwrap())
    });

    let inbound = session.handle_unit(&Unit::text(SYSTEM_INFO_REPLY));

    assert_eq!(inbound.len(), 1);
    let replies = replies.lock().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].esp_idf.version, "v5.2.1");
    assert_eq!(replies[0].esp32_firmware.version, "0.4.0");
}

#[test]
fn malformed_json_is_reported_and_routing_continues() {
    let mut session = open_session();
    let seen = record_diagnostics(&mut session);
    let hits = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&hits);
    session.on_control(129, move |_: &Envelope| *counter.lock().unwrap() += 1);

    assert!(session.handle_unit(&Unit::text("{not json")).is_empty());
    session.handle_unit(&Unit::text(SYSTEM_INFO_REPLY));

    assert_eq!(*hits.lock().unwrap(), 1);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("malformed JSON message"));
}

#[test]
fn unexpected_id_is_reported() {
    let mut session = open_session();
    let seen = record_diagnostics(&mut session);

    session.handle_unit(&Unit::text(r#"{"id":144,"data":{"ssid":"x"}}"#));

    assert_eq!(*seen.lock().unwrap(), vec!["unexpected message id 144"]);
}

#[test]
fn info_reply_split_across_binary_units() {
    let mut session = open_session();
    let wire = encode_to_vec(&info_reply_payload());

    let mut messages = Vec::new();
    for chunk in wire.chunks(3) {
        messages.extend(session.handle_unit(&Unit::binary(chunk.to_vec())));
    }

    assert_eq!(messages.len(), 1);
    let Inbound::Machine(AyabMessage::InfoReply(InfoReply { firmware, tag, .. })) = &messages[0]
    else {
        panic!("expected info reply, got {:?}", messages[0]);
    };
    assert_eq!(firmware.to_string(), "2.1.0");
    assert_eq!(tag, "FIRMWARETAG12345");
}

#[test]
fn invalid_escape_recovers_at_next_frame() {
    let mut session = open_session();
    let seen = record_diagnostics(&mut session);

    let mut wire = vec![END, 0x84, ESC, 0x01, 0x02, END];
    wire.extend_from_slice(&encode_to_vec(&[0x7F]));
    let inbound = session.handle_unit(&Unit::binary(wire));

    assert_eq!(
        inbound,
        vec![Inbound::Machine(AyabMessage::Unknown { tag: 0x7F })]
    );
    let seen = seen.lock().unwrap();
    assert!(seen[0].starts_with("framing violation"));
    assert_eq!(seen[1], "unknown machine message tag 0x7F");
}

#[test]
fn oversized_frame_is_dropped() {
    let mut config = SessionConfig::default();
    config.frame.max_payload_size = 8;
    let mut session = Session::new(MemoryTransport::new(), config);
    let seen = record_diagnostics(&mut session);

    let mut wire = encode_to_vec(&[0x55; 32]).to_vec();
    wire.extend_from_slice(&encode_to_vec(&[0x7F]));
    let inbound = session.handle_unit(&Unit::binary(wire));

    assert_eq!(inbound.len(), 1);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn truncated_machine_frame_reports_tag_and_length() {
    let mut session = open_session();
    let seen = record_diagnostics(&mut session);

    session.handle_unit(&Unit::binary(encode_to_vec(&[0x84, 0x01, 0x02])));

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["malformed frame (tag 0x84: 3 bytes, need 12)"]
    );
}

#[test]
fn reopened_session_starts_with_empty_decoder() {
    let mut session = open_session();
    session.handle_unit(&Unit::binary(vec![END, 0x84, 0x00, 0x01]));
    assert_eq!(session.dispatcher().decoder().pending_len(), 3);

    session.on_close(1006, "");
    session.on_open().unwrap();
    assert_eq!(session.dispatcher().decoder().pending_len(), 0);

    // the stale bytes must not be glued onto the next frame
    let inbound = session.handle_unit(&Unit::binary(encode_to_vec(&[0x7F])));
    assert_eq!(
        inbound,
        vec![Inbound::Machine(AyabMessage::Unknown { tag: 0x7F })]
    );
}

#[test]
fn send_after_close_is_rejected() {
    let mut session = open_session();
    let seen = record_diagnostics(&mut session);
    session
        .handle_event(TransportEvent::Closed {
            code: 1000,
            reason: String::new(),
        })
        .unwrap();

    // the memory transport still reports Open; the session state decides
    assert!(session.transport().is_open());
    assert!(session.request_info().is_err());
    assert!(session.request(MessageId::SystemInfo).is_err());

    assert!(session.transport().sent().is_empty());
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn stats_count_traffic() {
    let mut session = open_session();
    session.handle_unit(&Unit::text(SYSTEM_INFO_REPLY));
    session.handle_unit(&Unit::binary(encode_to_vec(&info_reply_payload())));
    session.request_info().unwrap();

    let stats = session.stats();
    assert_eq!(stats.units_received, 2);
    assert_eq!(stats.envelopes, 1);
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.machine_messages, 1);
    // one for the system-info request on open, one for request-info
    assert_eq!(stats.units_sent, 2);
    assert_eq!(stats.opens, 1);
}
