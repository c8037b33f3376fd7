//! Frames produced by the builder, parsed back with tungstenite's
//! independent RFC 6455 header parser.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::io::Cursor;

use tokio_tungstenite::tungstenite::protocol::frame::FrameHeader;
use tokio_tungstenite::tungstenite::protocol::frame::coding::{
    Control, Data, OpCode as WireOpCode,
};
use ws_multicast::frame::{CloseCode, FrameSpec, OpCode, encode_frame};

fn parse(bytes: &[u8]) -> (FrameHeader, Vec<u8>) {
    let mut cursor = Cursor::new(bytes);
    let Ok(Some((header, len))) = FrameHeader::parse(&mut cursor) else {
        panic!("tungstenite rejected the frame header");
    };
    let Ok(start) = usize::try_from(cursor.position()) else {
        panic!("header length overflow");
    };
    let payload = bytes[start..].to_vec();
    assert_eq!(payload.len() as u64, len, "declared length must match payload");
    (header, payload)
}

fn wire_opcode(opcode: OpCode) -> WireOpCode {
    match opcode {
        OpCode::Continuation => WireOpCode::Data(Data::Continue),
        OpCode::Text => WireOpCode::Data(Data::Text),
        OpCode::Binary => WireOpCode::Data(Data::Binary),
        OpCode::Close => WireOpCode::Control(Control::Close),
        OpCode::Ping => WireOpCode::Control(Control::Ping),
        OpCode::Pong => WireOpCode::Control(Control::Pong),
    }
}

#[test]
fn every_opcode_round_trips() {
    let payload = b"round trip payload";
    for opcode in [OpCode::Text, OpCode::Binary, OpCode::Ping, OpCode::Pong] {
        let frame = encode_frame(&FrameSpec::server(opcode, payload));
        let (header, body) = parse(&frame);
        assert!(header.is_final);
        assert!(header.mask.is_none());
        assert_eq!(header.opcode, wire_opcode(opcode));
        assert_eq!(body, payload);
    }
}

#[test]
fn data_lengths_round_trip_across_encodings() {
    for len in [0usize, 1, 125, 126, 127, 65_535, 65_536, 200_000] {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let frame = encode_frame(&FrameSpec::server(OpCode::Binary, &payload));
        let (header, body) = parse(&frame);
        assert!(header.is_final);
        assert!(header.mask.is_none());
        assert_eq!(body, payload, "payload mismatch at length {len}");
    }
}

#[test]
fn length_indicator_boundaries() {
    let indicator = |len: usize| {
        let payload = vec![0u8; len];
        encode_frame(&FrameSpec::server(OpCode::Text, &payload))[1]
    };
    assert_eq!(indicator(0), 0);
    assert_eq!(indicator(1), 1);
    assert_eq!(indicator(125), 125);
    assert_eq!(indicator(126), 126);
    assert_eq!(indicator(65_535), 126);
    assert_eq!(indicator(65_536), 127);
}

#[test]
fn close_frame_round_trips_status() {
    for code in [CloseCode::NORMAL, CloseCode::GOING_AWAY, CloseCode::new(4000)] {
        let frame = encode_frame(&FrameSpec::close(code));
        let (header, body) = parse(&frame);
        assert_eq!(header.opcode, WireOpCode::Control(Control::Close));
        assert_eq!(body, code.to_be_bytes());
    }
    let normal = encode_frame(&FrameSpec::close(CloseCode::NORMAL));
    assert_eq!(&normal[2..4], &[0x03, 0xE8]);
}

#[test]
fn masked_frame_is_recognised_as_masked() {
    let key = [1, 2, 3, 4];
    let spec = FrameSpec {
        mask: Some(key),
        ..FrameSpec::server(OpCode::Text, b"abcd")
    };
    let (header, body) = parse(&encode_frame(&spec));
    assert_eq!(header.mask, Some(key));
    let unmasked: Vec<u8> = body.iter().zip(key.iter().cycle()).map(|(b, k)| b ^ k).collect();
    assert_eq!(unmasked, b"abcd");
}
