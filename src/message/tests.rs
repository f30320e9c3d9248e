//! Unit tests for the message envelope and its bodies.

use std::sync::{Arc, atomic::Ordering};

use bytes::Bytes;
use rstest::rstest;

use super::*;
use crate::{
    error::DecodeError,
    test_helpers::{Point, SequenceHeader, test_registry},
    wire::MAX_NESTING,
};

const NAKACK: HeaderId = HeaderId::new(10);
const UNICAST: HeaderId = HeaderId::new(20);
const FRAG: HeaderId = HeaderId::new(30);

fn body_of(kind: &str) -> Message {
    match kind {
        "empty" => Message::empty(),
        "bytes" => Message::bytes(b"payload bytes".to_vec()),
        "bytes-none" => Message::new(Body::Bytes(None)),
        "bytes-window" => Message::bytes(
            ByteView::slice(b"xxpayloadxx".to_vec(), 2, 7).expect("in bounds"),
        ),
        "nio" => Message::nio(vec![5_u8; 40]),
        "nio-direct" => Message::nio_direct(vec![6_u8; 400]),
        "composite" => Message::composite([
            Message::bytes(b"first".to_vec()).with_src(Address::new(9)),
            Message::empty(),
            Message::composite([Message::bytes(b"nested".to_vec())]),
        ]),
        "object" => Message::object(Arc::new(Point { x: -3, y: 4 })),
        "serializable" => Message::serializable((42_u32, String::from("answer"))),
        "serializable-streamable" => Message::new(Body::Serializable(
            SerializableBody::streamable(Arc::new(Point { x: 1, y: 2 })),
        )),
        other => panic!("unknown fixture {other}"),
    }
}

fn decorated(kind: &str) -> Message {
    body_of(kind)
        .with_dest(Address::new(0xd0))
        .with_src(Address::new(0x50))
        .with_flag(Flag::Oob)
        .with_flag(Flag::NoFc)
        .with_header(NAKACK, Arc::new(SequenceHeader::new(11)))
        .with_header(UNICAST, Arc::new(SequenceHeader::new(22)))
}

fn round_trip(message: &Message) -> Message {
    let encoded = message.encode().expect("encode message");
    Message::decode(encoded, &test_registry()).expect("decode message")
}

fn payload_bytes(message: &Message) -> Vec<u8> {
    let mut out = Vec::<u8>::new();
    message.body().write_to(&mut out).expect("encode body");
    out
}

#[rstest]
fn decoded_message_matches_original(
    #[values(
        "empty",
        "bytes",
        "bytes-none",
        "bytes-window",
        "nio",
        "nio-direct",
        "composite",
        "object",
        "serializable",
        "serializable-streamable"
    )]
    kind: &str,
    #[values(true, false)] decorate: bool,
) {
    let message = if decorate { decorated(kind) } else { body_of(kind) };
    let decoded = round_trip(&message);

    assert_eq!(decoded.kind(), message.kind());
    assert_eq!(decoded.dest(), message.dest());
    assert_eq!(decoded.src(), message.src());
    assert_eq!(decoded.flags(), message.flags());
    assert_eq!(
        decoded.headers().ids().collect::<Vec<_>>(),
        message.headers().ids().collect::<Vec<_>>()
    );
    assert_eq!(
        decoded.length().expect("decoded length"),
        message.length().expect("original length")
    );
    assert_eq!(payload_bytes(&decoded), payload_bytes(&message));
    assert_eq!(decoded.has_payload(), message.has_payload());
}

#[rstest]
fn serialized_size_equals_encoded_length(
    #[values(
        "empty",
        "bytes",
        "bytes-none",
        "bytes-window",
        "nio",
        "nio-direct",
        "composite",
        "object",
        "serializable",
        "serializable-streamable"
    )]
    kind: &str,
    #[values(true, false)] decorate: bool,
) {
    let message = if decorate { decorated(kind) } else { body_of(kind) };
    let mut out = Vec::<u8>::new();
    message.write_to(&mut out).expect("encode message");
    assert_eq!(out.len(), message.serialized_size().expect("size"));
}

#[test]
fn absent_buffer_differs_from_empty_buffer() {
    let absent = round_trip(&Message::new(Body::Bytes(None)));
    let empty = round_trip(&Message::bytes(Vec::new()));
    assert!(matches!(absent.array(), Ok(None)));
    assert!(!absent.has_payload());
    assert_eq!(empty.array().expect("bytes body").map(ByteView::len), Some(0));
    assert!(empty.has_payload());
}

#[test]
fn envelope_layout_is_bit_exact() {
    let message = Message::empty()
        .with_dest(Address::new(1))
        .with_flag(Flag::DontBundle);
    let mut out = Vec::<u8>::new();
    message.write_message(&mut out).expect("encode");

    let mut expected = vec![MessageKind::Empty.as_u8(), 0x00, 0x02, 0x00, 0x01];
    expected.extend_from_slice(&1_u128.to_be_bytes());
    expected.extend_from_slice(&[0x00, 0, 0, 0, 0]);
    assert_eq!(out, expected);
}

#[rstest]
#[case::empty(Message::empty())]
#[case::composite(Message::composite([Message::empty()]))]
#[case::object(Message::object(Arc::new(Point::default())))]
#[case::serializable(Message::serializable(1_u8))]
#[case::nio_direct(Message::nio_direct(vec![1_u8]))]
#[case::fragment_view(Message::fragment(Arc::new(Message::empty()), 0, 1))]
fn array_is_unsupported_without_a_backing_array(#[case] message: Message) {
    let err = message.array().expect_err("no backing array");
    assert_eq!(err.operation, "array");
    assert!(!message.has_array());
}

#[test]
fn set_array_replaces_the_buffer() {
    let mut message = Message::nio(vec![1_u8]);
    message.set_array(vec![2_u8, 3]).expect("heap buffer accepts arrays");
    assert_eq!(message.length().expect("length"), 2);

    let mut composite = Message::new(Body::Composite(CompositeBody::new()));
    assert!(composite.set_array(vec![1_u8]).is_err());
}

#[test]
fn header_copy_aliases_values() {
    let original = decorated("bytes");
    let copy = original.copy(true, true);

    let original_header = original.header(NAKACK).expect("header present");
    let copied_header = copy.header(NAKACK).expect("header copied");
    assert!(Arc::ptr_eq(original_header, copied_header));

    copy.header_as::<SequenceHeader>(NAKACK)
        .expect("sequence header")
        .seqno
        .store(99, Ordering::Relaxed);
    assert_eq!(
        original
            .header_as::<SequenceHeader>(NAKACK)
            .expect("sequence header")
            .seqno(),
        99
    );
}

#[test]
fn copy_without_payload_or_headers_keeps_the_envelope() {
    let mut original = decorated("bytes");
    original.set_transient_flag(TransientFlag::DontLoopback);
    let copy = original.copy(false, false);

    assert_eq!(copy.dest(), original.dest());
    assert_eq!(copy.src(), original.src());
    assert_eq!(copy.flags(), original.flags());
    assert!(copy.is_transient_flag_set(TransientFlag::DontLoopback));
    assert!(copy.headers().is_empty());
    assert!(!copy.has_payload());
    assert_eq!(copy.kind(), MessageKind::Bytes.as_u8());
}

#[test]
fn copy_aliases_byte_payloads() {
    let original = Message::bytes(vec![1_u8, 2, 3]);
    let copy = original.copy(true, false);
    let original_view = original.array().expect("bytes").expect("buffer");
    let copied_view = copy.array().expect("bytes").expect("buffer");
    assert_eq!(original_view.buffer().as_ptr(), copied_view.buffer().as_ptr());
}

#[test]
fn composite_copy_is_deep() {
    let original = decorated("composite");
    let copy = original.copy(true, true);
    let (Body::Composite(source), Body::Composite(copied)) = (original.body(), copy.body()) else {
        panic!("composite bodies expected");
    };
    assert_eq!(copied.len(), source.len());
    let source_first = source.get(0).expect("first child");
    let copied_first = copied.get(0).expect("first child");
    assert!(!std::ptr::eq(source_first, copied_first));
    assert_eq!(copied_first.src(), Some(Address::new(9)));
    assert_eq!(payload_bytes(copied_first), payload_bytes(source_first));
}

#[test]
fn copy_from_starting_id_skips_lower_ids() {
    let message = decorated("empty").with_header(FRAG, Arc::new(SequenceHeader::new(3)));
    let copy = message.copy_with_headers_from(false, UNICAST);
    assert_eq!(copy.headers().ids().collect::<Vec<_>>(), [UNICAST, FRAG]);
}

#[test]
fn header_put_overwrites_in_place() {
    let mut message = decorated("empty");
    let old = message
        .put_header(NAKACK, Arc::new(SequenceHeader::new(77)))
        .expect("previous header returned");
    assert_eq!(
        message.headers().ids().collect::<Vec<_>>(),
        [NAKACK, UNICAST]
    );
    assert!(!Arc::ptr_eq(&old, message.header(NAKACK).expect("header")));
}

#[rstest]
#[case::no_known_sender(None, true)]
#[case::different_sender(Some(Address::new(0x77)), true)]
#[case::same_sender(Some(Address::new(0x50)), false)]
fn no_addrs_mode_omits_addresses_only_for_the_known_sender(
    #[case] sender: Option<Address>,
    #[case] expect_addresses: bool,
) {
    let message = decorated("bytes");
    let mut out = Vec::<u8>::new();
    message
        .write_to_no_addrs(sender.as_ref(), &mut out, &[UNICAST])
        .expect("encode");
    assert_eq!(
        out.len(),
        message
            .serialized_size_no_addrs(sender.as_ref(), &[UNICAST])
            .expect("size")
    );

    let decoded = Message::read_from(message.kind(), &mut Bytes::from(out), &test_registry())
        .expect("decode");
    if expect_addresses {
        assert_eq!(decoded.dest(), message.dest());
        assert_eq!(decoded.src(), message.src());
    } else {
        assert_eq!(decoded.dest(), None);
        assert_eq!(decoded.src(), None);
    }
    assert_eq!(decoded.headers().ids().collect::<Vec<_>>(), [NAKACK]);
}

#[test]
fn message_without_own_source_still_omits_addresses_for_known_sender() {
    let message = Message::empty().with_dest(Address::new(3));
    let mut out = Vec::<u8>::new();
    message
        .write_to_no_addrs(Some(&Address::new(4)), &mut out, &[])
        .expect("encode");
    let decoded = Message::read_from(message.kind(), &mut Bytes::from(out), &Registry::new())
        .expect("decode");
    assert_eq!(decoded.dest(), None);
}

#[test]
fn unknown_header_kind_fails_the_whole_message() {
    let message = decorated("bytes");
    let encoded = message.encode().expect("encode");
    let err = Message::decode(encoded, &Registry::new()).expect_err("header kind unknown");
    assert!(matches!(err, DecodeError::UnknownHeaderKind { kind: 1001 }));
}

#[test]
fn unknown_object_kind_fails_decoding() {
    let encoded = Message::object(Arc::new(Point::default())).encode().expect("encode");
    let err = Message::decode(encoded, &Registry::new()).expect_err("object kind unknown");
    assert!(matches!(err, DecodeError::UnknownObjectKind { .. }));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut encoded = Message::empty().encode().expect("encode").to_vec();
    encoded.push(0);
    let err = Message::decode(encoded, &Registry::new()).expect_err("trailing byte");
    assert!(matches!(err, DecodeError::TrailingBytes { remaining: 1 }));
}

#[test]
fn truncated_input_is_rejected() {
    let encoded = decorated("nio").encode().expect("encode");
    let cut = encoded.slice(..encoded.len() - 1);
    let err = Message::decode(cut, &test_registry()).expect_err("truncated");
    assert!(matches!(err, DecodeError::Truncated { .. }));
}

/// `[Composite][flags][transient][no dest][no src][0 headers][1 child]`.
const ONE_CHILD_COMPOSITE: [u8; 14] = [4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
const EMPTY_MESSAGE: [u8; 10] = [2, 0, 0, 0, 0, 0, 0, 0, 0, 0];

fn nested_composites(levels: usize) -> Vec<u8> {
    let mut wire = ONE_CHILD_COMPOSITE.repeat(levels);
    wire.extend_from_slice(&EMPTY_MESSAGE);
    wire
}

#[test]
fn deeply_nested_composites_are_rejected() {
    let err = Message::decode(nested_composites(10_000), &Registry::new())
        .expect_err("nesting too deep");
    assert!(matches!(err, DecodeError::Invalid { what: "composite", .. }));
}

#[rstest]
#[case::at_the_limit(MAX_NESTING, true)]
#[case::one_past_the_limit(MAX_NESTING + 1, false)]
fn composite_nesting_limit(#[case] levels: usize, #[case] accepted: bool) {
    let result = Message::decode(nested_composites(levels), &Registry::new());
    assert_eq!(result.is_ok(), accepted);
}

#[test]
fn encoded_nesting_at_the_limit_round_trips() {
    let mut message = Message::empty();
    for _ in 0..MAX_NESTING {
        message = Message::composite([message]);
    }
    let decoded = round_trip(&message);
    assert_eq!(decoded.kind(), MessageKind::Composite.as_u8());
}

#[test]
fn received_fragment_with_null_length_is_an_empty_window() {
    let wire = [5_u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
    let decoded = Message::decode(wire.to_vec(), &Registry::new()).expect("decode");
    let Body::Fragment(FragmentBody::Received(view)) = decoded.body() else {
        panic!("received fragment expected");
    };
    assert!(view.is_empty());
}

#[test]
fn decoded_object_is_reconstructed_through_the_registry() {
    let decoded = round_trip(&Message::object(Arc::new(Point { x: 7, y: -7 })));
    let Body::Object(body) = decoded.body() else {
        panic!("object body expected");
    };
    assert_eq!(body.object_as::<Point>(), Some(&Point { x: 7, y: -7 }));
}

#[test]
fn decoded_serializable_object_decodes_on_demand() {
    let decoded = round_trip(&Message::serializable((42_u32, String::from("answer"))));
    let Body::Serializable(body) = decoded.body() else {
        panic!("serializable body expected");
    };
    let value: (u32, String) = body.decode_object().expect("decode object");
    assert_eq!(value, (42, String::from("answer")));
}

mod composite_ops {
    use super::*;

    fn tagged(tag: u8) -> Message { Message::bytes(vec![tag]) }

    fn tag_of(message: &Message) -> u8 {
        message.array().expect("bytes").expect("buffer").as_slice()[0]
    }

    #[test]
    fn remove_at_head_preserves_order() {
        let mut body = CompositeBody::new();
        for tag in 0..5 {
            body.add(tagged(tag));
        }
        assert_eq!(tag_of(&body.remove_at_head().expect("head")), 0);
        assert_eq!(tag_of(&body.remove_at_head().expect("head")), 1);
        assert_eq!(body.iter().map(tag_of).collect::<Vec<_>>(), [2, 3, 4]);
    }

    #[test]
    fn add_at_head_becomes_index_zero() {
        let mut body: CompositeBody = [tagged(1), tagged(2)].into_iter().collect();
        body.add_at_head(tagged(0));
        assert_eq!(tag_of(body.get(0).expect("head")), 0);
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn growth_keeps_every_child() {
        let mut body = CompositeBody::new();
        body.add(tagged(1)).add(tagged(2)).add(tagged(3));
        assert_eq!((0..3).map(|i| tag_of(body.get(i).expect("child"))).collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(tag_of(&body.remove().expect("tail")), 3);
        assert!(body.get(2).is_none());
    }

    #[test]
    fn removing_from_empty_returns_none() {
        let mut body = CompositeBody::new();
        assert!(body.remove().is_none());
        assert!(body.remove_at_head().is_none());
    }
}
