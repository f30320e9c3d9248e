//! Persistent and transient message flag sets.
//!
//! Persistent flags travel with the message and steer protocol layers on the
//! receiving side. Transient flags are process-local markers; they are
//! encoded so a message and its copies agree, but receivers do not act on
//! them.

use derive_more::{From, Into};

macro_rules! flag_set {
    (
        $(#[$set_meta:meta])*
        $set:ident($bits:ty);
        $(#[$flag_meta:meta])*
        $flag:ident { $($(#[$variant_meta:meta])* $variant:ident = $value:expr),+ $(,)? }
    ) => {
        $(#[$flag_meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr($bits)]
        pub enum $flag {
            $($(#[$variant_meta])* $variant = $value),+
        }

        impl $flag {
            /// Every flag, lowest bit first.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The single bit this flag occupies.
            #[must_use]
            pub const fn bit(self) -> $bits { self as $bits }
        }

        $(#[$set_meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, From, Into)]
        pub struct $set($bits);

        impl $set {
            /// A set with no flags raised.
            #[must_use]
            pub const fn empty() -> Self { Self(0) }

            /// Wrap raw bits read from the wire. Unknown bits are kept.
            #[must_use]
            pub const fn from_bits(bits: $bits) -> Self { Self(bits) }

            /// Raw bits as written to the wire.
            #[must_use]
            pub const fn bits(self) -> $bits { self.0 }

            /// Whether `flag` is raised.
            #[must_use]
            pub const fn contains(self, flag: $flag) -> bool { self.0 & flag.bit() != 0 }

            /// Raise `flag`.
            pub fn set(&mut self, flag: $flag) { self.0 |= flag.bit(); }

            /// Lower `flag`.
            pub fn clear(&mut self, flag: $flag) { self.0 &= !flag.bit(); }

            /// Return a copy with `flag` raised.
            #[must_use]
            pub const fn with(self, flag: $flag) -> Self { Self(self.0 | flag.bit()) }

            /// Flags currently raised, lowest bit first.
            pub fn iter(self) -> impl Iterator<Item = $flag> {
                $flag::ALL.iter().copied().filter(move |flag| self.contains(*flag))
            }
        }

        impl From<$flag> for $set {
            fn from(flag: $flag) -> Self { Self(flag.bit()) }
        }

        impl FromIterator<$flag> for $set {
            fn from_iter<I: IntoIterator<Item = $flag>>(iter: I) -> Self {
                iter.into_iter().fold(Self::empty(), Self::with)
            }
        }
    };
}

flag_set! {
    /// Persistent flags, written as a `u16`.
    Flags(u16);
    /// A persistent flag bit.
    Flag {
        /// Deliver out of band, bypassing ordering.
        Oob = 1,
        /// Send immediately instead of bundling with other messages.
        DontBundle = 1 << 1,
        /// Exempt from flow control.
        NoFc = 1 << 2,
        /// Skip reliable delivery.
        NoReliability = 1 << 4,
        /// Skip total ordering.
        NoTotalOrder = 1 << 5,
        /// Do not forward across sites.
        NoRelay = 1 << 6,
        /// Block the sender until every receiver acknowledges.
        Rsvp = 1 << 7,
        /// Request acknowledgement without blocking the sender.
        RsvpNonBlocking = 1 << 8,
        /// Deliver even while the receiver's barrier is closed.
        SkipBarrier = 1 << 10,
    }
}

flag_set! {
    /// Process-local flags, written as a `u8`.
    TransientFlags(u8);
    /// A transient flag bit.
    TransientFlag {
        /// An out-of-band message was already delivered locally.
        OobDelivered = 1,
        /// Do not deliver a copy of a multicast back to the sender.
        DontLoopback = 1 << 1,
    }
}
