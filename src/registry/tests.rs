//! Unit tests for registration rules and decoding through the registry.

use bytes::Bytes;
use rstest::{fixture, rstest};
use tracing_test::traced_test;

use super::*;
use crate::{
    error::EncodeError,
    message::Message,
    test_helpers::{POINT_KIND, Point, SEQUENCE_HEADER_KIND, SequenceHeader},
    wire::{WireSink, WireSource},
};

const COUNTER_KIND: u8 = 40;

/// Custom body carrying a single counter.
#[derive(Debug, Default)]
struct CounterBody(u64);

impl CustomBody for CounterBody {
    fn kind(&self) -> u8 { COUNTER_KIND }

    fn length(&self) -> usize { 8 }

    fn serialized_size(&self) -> usize { 8 }

    fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        out.write_u64(self.0);
        Ok(())
    }

    fn read_from(&mut self, input: &mut dyn WireSource, _: &Registry) -> Result<(), DecodeError> {
        self.0 = input.read_u64()?;
        Ok(())
    }

    fn copy_body(&self, copy_payload: bool) -> Box<dyn CustomBody> {
        Box::new(Self(if copy_payload { self.0 } else { 0 }))
    }
}

#[fixture]
fn registry() -> Registry { Registry::new() }

#[rstest]
fn built_in_kinds_are_pre_registered(registry: Registry) {
    for kind in MessageKind::ALL {
        assert!(registry.has_message(kind.as_u8()));
    }
    assert!(registry.has_header(FRAG_HEADER_KIND));
    assert!(!registry.has_message(RESERVED_KIND_THRESHOLD + 1));
}

#[rstest]
#[case(0)]
#[case(7)]
#[case(RESERVED_KIND_THRESHOLD)]
fn reserved_kinds_are_rejected(registry: Registry, #[case] kind: u8) {
    let err = registry
        .register_message(kind, CounterBody::default)
        .expect_err("reserved kind");
    assert_eq!(
        err,
        RegistryError::Reserved {
            table: "message",
            kind: u16::from(kind),
            threshold: 32,
        }
    );
}

#[rstest]
fn second_registration_of_a_kind_fails(registry: Registry) {
    registry
        .register_message(COUNTER_KIND, CounterBody::default)
        .expect("first registration");
    let err = registry
        .register_message(COUNTER_KIND, || CounterBody(5))
        .expect_err("kind already taken");
    assert!(matches!(err, RegistryError::Taken { kind: 40, .. }));

    // The original constructor is still in place.
    let Body::Custom(body) = registry.create_body(COUNTER_KIND).expect("body") else {
        panic!("custom body expected");
    };
    assert_eq!(body.length(), 8);
}

#[rstest]
fn header_and_object_tables_reject_duplicates(registry: Registry) {
    assert!(matches!(
        registry.register_header(FRAG_HEADER_KIND, SequenceHeader::default),
        Err(RegistryError::Taken { table: "header", kind: FRAG_HEADER_KIND })
    ));
    registry
        .register_object(POINT_KIND, Point::default)
        .expect("first object registration");
    assert!(registry.register_object(POINT_KIND, Point::default).is_err());
    registry
        .register_header(SEQUENCE_HEADER_KIND, SequenceHeader::default)
        .expect("header registration");
    assert!(registry.has_header(SEQUENCE_HEADER_KIND));
}

#[rstest]
fn custom_kinds_round_trip(registry: Registry) {
    registry
        .register_message(COUNTER_KIND, CounterBody::default)
        .expect("register counter");
    let message = Message::new(Body::Custom(Box::new(CounterBody(0xfeed))));
    let encoded = message.encode().expect("encode");
    assert_eq!(encoded[0], COUNTER_KIND);

    let decoded = Message::decode(encoded, &registry).expect("decode");
    let Body::Custom(body) = decoded.body() else {
        panic!("custom body expected");
    };
    let counter: &dyn std::any::Any = &**body;
    assert_eq!(counter.downcast_ref::<CounterBody>().map(|c| c.0), Some(0xfeed));
}

#[rstest]
fn unknown_kind_fails_without_disturbing_known_kinds(registry: Registry) {
    registry
        .register_message(COUNTER_KIND, CounterBody::default)
        .expect("register counter");
    let err = Message::decode(Bytes::from_static(&[99]), &registry).expect_err("unknown kind");
    assert!(matches!(err, DecodeError::UnknownMessageKind { kind: 99 }));

    let encoded = Message::new(Body::Custom(Box::new(CounterBody(1))))
        .encode()
        .expect("encode");
    assert!(Message::decode(encoded, &registry).is_ok());
}

#[test]
#[traced_test]
fn registration_is_logged() {
    let registry = Registry::new();
    registry
        .register_object(POINT_KIND, Point::default)
        .expect("register point");
    assert!(logs_contain("registered constructor"));
}

#[test]
fn global_registry_is_shared() {
    assert!(std::ptr::eq(Registry::global(), Registry::global()));
    assert!(Registry::global().has_message(MessageKind::Bytes.as_u8()));
}
