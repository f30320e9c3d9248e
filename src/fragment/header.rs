use super::{FragmentIndex, MessageId};
use crate::{
    error::DecodeError,
    header::Header,
    streamable::Streamable,
    wire::{BYTE_SIZE, INT_SIZE, LONG_SIZE, WireSink, WireSource},
};

/// Header kind of [`FragHeader`], registered in every
/// [`Registry`](crate::Registry).
pub const FRAG_HEADER_KIND: u16 = 52;

/// Header attached to each fragment of a split message.
///
/// Wire form: `[id:u64][frag_id:u32][num_frags:u32][needs_deserialization:u8]`.
///
/// # Examples
///
/// ```
/// use groupwire::fragment::{FragHeader, FragmentIndex, MessageId};
/// let header = FragHeader::new(MessageId::new(7), FragmentIndex::zero(), 3, true);
/// assert_eq!(header.id().get(), 7);
/// assert!(!header.is_last());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FragHeader {
    id: MessageId,
    frag_id: FragmentIndex,
    num_frags: u32,
    needs_deserialization: bool,
}

impl FragHeader {
    /// Encoded size of every fragment header.
    pub const SERIALIZED_SIZE: usize = LONG_SIZE + INT_SIZE + INT_SIZE + BYTE_SIZE;

    #[must_use]
    pub const fn new(
        id: MessageId,
        frag_id: FragmentIndex,
        num_frags: u32,
        needs_deserialization: bool,
    ) -> Self {
        Self {
            id,
            frag_id,
            num_frags,
            needs_deserialization,
        }
    }

    /// Identifier of the original message.
    #[must_use]
    pub const fn id(&self) -> MessageId { self.id }

    #[must_use]
    pub const fn frag_id(&self) -> FragmentIndex { self.frag_id }

    /// Total number of fragments of the original message.
    #[must_use]
    pub const fn num_frags(&self) -> u32 { self.num_frags }

    /// Whether reassembled bytes hold an encoded message rather than a raw
    /// payload.
    #[must_use]
    pub const fn needs_deserialization(&self) -> bool { self.needs_deserialization }

    /// Whether this header marks the final fragment.
    #[must_use]
    pub const fn is_last(&self) -> bool { self.frag_id.get().saturating_add(1) >= self.num_frags }
}

impl Streamable for FragHeader {
    fn kind(&self) -> u16 { FRAG_HEADER_KIND }

    fn serialized_size(&self) -> usize { Self::SERIALIZED_SIZE }

    fn write_to(&self, out: &mut dyn WireSink) {
        out.write_u64(self.id.get());
        out.write_u32(self.frag_id.get());
        out.write_u32(self.num_frags);
        out.write_bool(self.needs_deserialization);
    }

    fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
        self.id = MessageId::new(input.read_u64()?);
        self.frag_id = FragmentIndex::new(input.read_u32()?);
        self.num_frags = input.read_u32()?;
        self.needs_deserialization = input.read_bool()?;
        Ok(())
    }
}

impl Header for FragHeader {}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn wire_form_is_fixed_width() {
        let header = FragHeader::new(MessageId::new(0x0102), FragmentIndex::new(2), 3, true);
        let mut out = Vec::<u8>::new();
        header.write_to(&mut out);
        assert_eq!(out, [0, 0, 0, 0, 0, 0, 1, 2, 0, 0, 0, 2, 0, 0, 0, 3, 1]);
        assert_eq!(out.len(), header.serialized_size());

        let mut decoded = FragHeader::default();
        decoded.read_from(&mut Bytes::from(out)).expect("decode header");
        assert_eq!(decoded, header);
        assert!(decoded.is_last());
    }
}
