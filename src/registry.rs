//! Discriminator tables consulted when decoding.
//!
//! A [`Registry`] maps wire discriminators to zero-argument constructors:
//! message kinds (`u8`), header kinds (`u16`) and streamable object kinds
//! (`u16`). Decoding reads the discriminator, asks the registry for a fresh
//! instance and lets that instance read itself.
//!
//! Built-in message kinds and the fragment header are registered by
//! [`Registry::new`]. Applications add their own kinds at start-up, either
//! on [`Registry::global`] or on a registry they pass around explicitly.

use std::{fmt, sync::{Arc, OnceLock}};

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::debug;

use crate::{
    error::{DecodeError, RegistryError},
    fragment::{FRAG_HEADER_KIND, FragHeader},
    header::Header,
    message::{Body, CustomBody, MessageKind},
    streamable::Streamable,
};

/// Highest message discriminator reserved for built-in kinds.
///
/// Custom message kinds must be strictly greater than this value.
pub const RESERVED_KIND_THRESHOLD: u8 = 32;

type BodyConstructor = Arc<dyn Fn() -> Body + Send + Sync>;
type HeaderConstructor = Arc<dyn Fn() -> Box<dyn Header> + Send + Sync>;
type ObjectConstructor = Arc<dyn Fn() -> Box<dyn Streamable> + Send + Sync>;

/// Concurrent constructor tables for messages, headers and objects.
///
/// Registration is atomic per discriminator: a failed call leaves the table
/// untouched, and concurrent registrations of the same kind admit exactly
/// one winner.
pub struct Registry {
    messages: DashMap<u8, BodyConstructor>,
    headers: DashMap<u16, HeaderConstructor>,
    objects: DashMap<u16, ObjectConstructor>,
}

impl Registry {
    /// Create a registry holding only the built-in kinds.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            messages: DashMap::new(),
            headers: DashMap::new(),
            objects: DashMap::new(),
        };
        for kind in MessageKind::ALL {
            registry
                .messages
                .insert(kind.as_u8(), Arc::new(move || Body::blank(kind)));
        }
        registry.headers.insert(
            FRAG_HEADER_KIND,
            Arc::new(|| Box::new(FragHeader::default()) as Box<dyn Header>),
        );
        registry
    }

    /// Process-wide registry shared by callers that do not thread their own.
    #[must_use]
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Register a custom message kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Reserved`] when `kind` is not greater than
    /// [`RESERVED_KIND_THRESHOLD`], or [`RegistryError::Taken`] when another
    /// constructor already owns it.
    pub fn register_message<F, B>(&self, kind: u8, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> B + Send + Sync + 'static,
        B: CustomBody,
    {
        if kind <= RESERVED_KIND_THRESHOLD {
            return Err(RegistryError::Reserved {
                table: "message",
                kind: u16::from(kind),
                threshold: u16::from(RESERVED_KIND_THRESHOLD),
            });
        }
        let constructor: BodyConstructor = Arc::new(move || Body::Custom(Box::new(constructor())));
        insert_vacant(&self.messages, "message", kind, u16::from(kind), constructor)
    }

    /// Register a header kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Taken`] when another constructor already owns
    /// `kind`.
    pub fn register_header<F, H>(&self, kind: u16, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: Header,
    {
        let constructor: HeaderConstructor =
            Arc::new(move || Box::new(constructor()) as Box<dyn Header>);
        insert_vacant(&self.headers, "header", kind, kind, constructor)
    }

    /// Register a streamable object kind for object-carrying messages.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Taken`] when another constructor already owns
    /// `kind`.
    pub fn register_object<F, O>(&self, kind: u16, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> O + Send + Sync + 'static,
        O: Streamable,
    {
        let constructor: ObjectConstructor =
            Arc::new(move || Box::new(constructor()) as Box<dyn Streamable>);
        insert_vacant(&self.objects, "object", kind, kind, constructor)
    }

    /// Whether a message kind has a constructor.
    #[must_use]
    pub fn has_message(&self, kind: u8) -> bool { self.messages.contains_key(&kind) }

    /// Whether a header kind has a constructor.
    #[must_use]
    pub fn has_header(&self, kind: u16) -> bool { self.headers.contains_key(&kind) }

    /// Whether an object kind has a constructor.
    #[must_use]
    pub fn has_object(&self, kind: u16) -> bool { self.objects.contains_key(&kind) }

    /// Construct an empty body for message kind `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownMessageKind`] when nothing is registered.
    pub fn create_body(&self, kind: u8) -> Result<Body, DecodeError> {
        let constructor = lookup(&self.messages, kind)
            .ok_or(DecodeError::UnknownMessageKind { kind })?;
        Ok(constructor())
    }

    /// Construct a blank header for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownHeaderKind`] when nothing is registered.
    pub fn create_header(&self, kind: u16) -> Result<Box<dyn Header>, DecodeError> {
        let constructor =
            lookup(&self.headers, kind).ok_or(DecodeError::UnknownHeaderKind { kind })?;
        Ok(constructor())
    }

    /// Construct a blank streamable object for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownObjectKind`] when nothing is registered.
    pub fn create_object(&self, kind: u16) -> Result<Box<dyn Streamable>, DecodeError> {
        let constructor =
            lookup(&self.objects, kind).ok_or(DecodeError::UnknownObjectKind { kind })?;
        Ok(constructor())
    }
}

impl Default for Registry {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("messages", &self.messages.len())
            .field("headers", &self.headers.len())
            .field("objects", &self.objects.len())
            .finish()
    }
}

// Clone the constructor out so the shard lock is released before it runs.
pub(crate) fn lookup<K, C>(table: &DashMap<K, Arc<C>>, kind: K) -> Option<Arc<C>>
where
    K: Eq + std::hash::Hash,
    C: ?Sized,
{
    table.get(&kind).map(|entry| Arc::clone(entry.value()))
}

pub(crate) fn insert_vacant<K, C>(
    table: &DashMap<K, Arc<C>>,
    name: &'static str,
    key: K,
    kind: u16,
    constructor: Arc<C>,
) -> Result<(), RegistryError>
where
    K: Eq + std::hash::Hash,
    C: ?Sized,
{
    match table.entry(key) {
        Entry::Occupied(_) => Err(RegistryError::Taken { table: name, kind }),
        Entry::Vacant(slot) => {
            slot.insert(constructor);
            debug!(table = name, kind, "registered constructor");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
