//! Network byte-order conversions for the wire primitives.
//!
//! Every multi-byte integer in the message format is big-endian. The helpers
//! below keep the Clippy expectation next to the conversion so callers in
//! [`crate::wire`] stay explicit about endianness without repeating lint
//! annotations.

macro_rules! network_order {
    ($ty:ty, $width:literal, $write:ident, $read:ident) => {
        #[doc = concat!("Serialise a `", stringify!($ty), "` in network byte order.")]
        #[must_use]
        pub fn $write(value: $ty) -> [u8; $width] {
            #[expect(
                clippy::big_endian_bytes,
                reason = "The message format is big-endian on the wire."
            )]
            value.to_be_bytes()
        }

        #[doc = concat!("Parse a network-order `", stringify!($ty), "`.")]
        #[must_use]
        pub fn $read(bytes: [u8; $width]) -> $ty {
            #[expect(
                clippy::big_endian_bytes,
                reason = "The message format is big-endian on the wire."
            )]
            <$ty>::from_be_bytes(bytes)
        }
    };
}

network_order!(u16, 2, write_network_u16, read_network_u16);
network_order!(i32, 4, write_network_i32, read_network_i32);
network_order!(u32, 4, write_network_u32, read_network_u32);
network_order!(u64, 8, write_network_u64, read_network_u64);
network_order!(u128, 16, write_network_u128, read_network_u128);
