//! Type-tagged plain-old-data blobs.
//!
//! An [`OpaqueValue`] stores the raw bytes of an [`OpaqueData`] value next to
//! the value's [`TypeId`]. The bytes are never interpreted by the document; a
//! read succeeds only when the requested type is exactly the stored type, so
//! an `i32` is never reinterpreted as an `f32` of the same size.

use std::any::{type_name, TypeId};
use std::fmt;

use bytemuck::{CheckedBitPattern, NoUninit};

/// Largest value, in bytes, an opaque node can hold.
pub const OPAQUE_CAPACITY: usize = 64;

/// Types an opaque node can store: plain data without padding bytes.
///
/// Every [`bytemuck::Pod`] type qualifies, as do `bool`, `char` and structs
/// deriving [`NoUninit`] and [`CheckedBitPattern`]. Reads validate the bit
/// pattern, so a `bool` field never comes back holding a value other than 0
/// or 1.
pub trait OpaqueData: NoUninit + CheckedBitPattern {}

impl<T: NoUninit + CheckedBitPattern> OpaqueData for T {}

#[derive(Clone, Copy)]
struct OpaqueTag {
    id: TypeId,
    name: &'static str,
}

/// A byte blob tagged with the type it was created from.
#[derive(Clone)]
pub struct OpaqueValue {
    tag: Option<OpaqueTag>,
    bytes: Vec<u8>,
}

impl OpaqueValue {
    /// An opaque value holding nothing. Every typed read returns the default.
    pub fn empty() -> Self {
        Self {
            tag: None,
            bytes: Vec::new(),
        }
    }

    /// Copy `value` into a new blob tagged with `T`.
    ///
    /// Types larger than [`OPAQUE_CAPACITY`] are rejected at compile time.
    pub fn new<T: OpaqueData>(value: T) -> Self {
        const {
            assert!(
                std::mem::size_of::<T>() <= OPAQUE_CAPACITY,
                "type is too large for an opaque document value"
            )
        };
        Self {
            tag: Some(OpaqueTag {
                id: TypeId::of::<T>(),
                name: type_name::<T>(),
            }),
            bytes: bytemuck::bytes_of(&value).to_vec(),
        }
    }

    /// Whether the blob holds no value at all.
    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
    }

    /// Whether the stored value was created from exactly `T`.
    pub fn holds<T: OpaqueData>(&self) -> bool {
        self.tag.is_some_and(|tag| tag.id == TypeId::of::<T>())
            && self.bytes.len() == std::mem::size_of::<T>()
    }

    /// The stored value, if it is a `T` with a valid bit pattern.
    pub fn try_get<T: OpaqueData>(&self) -> Option<T> {
        if !self.holds::<T>() {
            return None;
        }
        bytemuck::checked::try_pod_read_unaligned(&self.bytes).ok()
    }

    /// The stored value if it is a `T`, otherwise `default`.
    pub fn get<T: OpaqueData>(&self, default: T) -> T {
        self.try_get().unwrap_or(default)
    }

    /// Name of the stored type, for diagnostics.
    pub fn type_name(&self) -> Option<&'static str> {
        self.tag.map(|tag| tag.name)
    }

    /// Size of the stored value in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl Default for OpaqueValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        let same_type = match (self.tag, other.tag) {
            (Some(a), Some(b)) => a.id == b.id,
            (None, None) => true,
            _ => false,
        };
        same_type && self.bytes == other.bytes
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("type", &self.type_name())
            .field("size", &self.bytes.len())
            .finish()
    }
}
