//! Test-only headers and objects shared by unit tests.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    error::DecodeError,
    header::Header,
    registry::Registry,
    streamable::Streamable,
    wire::{WireSink, WireSource},
};

pub const SEQUENCE_HEADER_KIND: u16 = 1001;
pub const POINT_KIND: u16 = 2001;

/// Header with an interior-mutable field, for observing aliasing.
#[derive(Debug, Default)]
pub struct SequenceHeader {
    pub seqno: AtomicU32,
}

impl SequenceHeader {
    pub fn new(seqno: u32) -> Self {
        Self {
            seqno: AtomicU32::new(seqno),
        }
    }

    pub fn seqno(&self) -> u32 { self.seqno.load(Ordering::Relaxed) }
}

impl Streamable for SequenceHeader {
    fn kind(&self) -> u16 { SEQUENCE_HEADER_KIND }

    fn serialized_size(&self) -> usize { 4 }

    fn write_to(&self, out: &mut dyn WireSink) { out.write_u32(self.seqno()); }

    fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
        self.seqno = AtomicU32::new(input.read_u32()?);
        Ok(())
    }
}

impl Header for SequenceHeader {}

/// Size-aware object used by object-carrying bodies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Streamable for Point {
    fn kind(&self) -> u16 { POINT_KIND }

    fn serialized_size(&self) -> usize { 8 }

    fn write_to(&self, out: &mut dyn WireSink) {
        out.write_i32(self.x);
        out.write_i32(self.y);
    }

    fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
        self.x = input.read_i32()?;
        self.y = input.read_i32()?;
        Ok(())
    }
}

/// Registry with [`SequenceHeader`] and [`Point`] registered.
pub fn test_registry() -> Registry {
    let registry = Registry::new();
    registry
        .register_header(SEQUENCE_HEADER_KIND, SequenceHeader::default)
        .expect("register sequence header");
    registry
        .register_object(POINT_KIND, Point::default)
        .expect("register point");
    registry
}
