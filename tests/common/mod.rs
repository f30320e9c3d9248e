//! Shared utilities for integration tests.
//!
//! Provides a membership header and a size-aware object registered under
//! application kinds, plus a registry fixture that knows both.

#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use groupwire::{DecodeError, Header, Registry, Streamable, WireSink, WireSource};
use rstest::fixture;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const VIEW_HEADER_KIND: u16 = 3001;
pub const STATE_KIND: u16 = 3002;

/// Header naming the view a message was sent in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewHeader {
    pub view_id: u64,
}

impl Streamable for ViewHeader {
    fn kind(&self) -> u16 { VIEW_HEADER_KIND }

    fn serialized_size(&self) -> usize { 8 }

    fn write_to(&self, out: &mut dyn WireSink) { out.write_u64(self.view_id); }

    fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
        self.view_id = input.read_u64()?;
        Ok(())
    }
}

impl Header for ViewHeader {}

/// Replicated state snapshot carried by object messages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub version: u32,
    pub entries: Vec<u8>,
}

impl Streamable for StateSnapshot {
    fn kind(&self) -> u16 { STATE_KIND }

    fn serialized_size(&self) -> usize { 4 + 4 + self.entries.len() }

    fn write_to(&self, out: &mut dyn WireSink) {
        out.write_u32(self.version);
        out.write_u32(u32::try_from(self.entries.len()).unwrap_or(u32::MAX));
        out.write_slice(&self.entries);
    }

    fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
        self.version = input.read_u32()?;
        let len = input.read_u32()? as usize;
        self.entries = input.read_bytes(len)?.to_vec();
        Ok(())
    }
}

/// Registry that knows [`ViewHeader`] and [`StateSnapshot`].
#[fixture]
pub fn registry() -> Registry {
    let registry = Registry::new();
    registry
        .register_header(VIEW_HEADER_KIND, ViewHeader::default)
        .expect("register view header");
    registry
        .register_object(STATE_KIND, StateSnapshot::default)
        .expect("register state snapshot");
    registry
}
