//! Value type tags, node payloads and numeric conversions.

use std::fmt;

use crate::opaque::OpaqueValue;
use crate::store::NodeId;

/// The runtime type tag of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Number,
    String,
    Opaque,
    Array,
    Object,
}

impl ValueType {
    /// Lower-case name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Opaque => "opaque",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The content of a single node. Mirrors JSON types, plus an opaque blob.
///
/// Containers hold child handles rather than child values, so a child keeps
/// its identity when its parent's payload is swapped out and later restored.
/// Objects use `Vec<(String, NodeId)>` to keep insertion order without a map.
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Opaque(OpaqueValue),
    Array(Vec<NodeId>),
    /// Key-value pairs in insertion order.
    Object(Vec<(String, NodeId)>),
}

impl Payload {
    pub(crate) fn value_type(&self) -> ValueType {
        match self {
            Payload::Null => ValueType::Null,
            Payload::Bool(_) => ValueType::Bool,
            Payload::Number(_) => ValueType::Number,
            Payload::String(_) => ValueType::String,
            Payload::Opaque(_) => ValueType::Opaque,
            Payload::Array(_) => ValueType::Array,
            Payload::Object(_) => ValueType::Object,
        }
    }

    /// The freshly-initialized payload for `ty`.
    pub(crate) fn empty(ty: ValueType, reserve: usize) -> Payload {
        match ty {
            ValueType::Null => Payload::Null,
            ValueType::Bool => Payload::Bool(false),
            ValueType::Number => Payload::Number(0.0),
            ValueType::String => Payload::String(String::new()),
            ValueType::Opaque => Payload::Opaque(OpaqueValue::empty()),
            ValueType::Array => Payload::Array(Vec::with_capacity(reserve)),
            ValueType::Object => Payload::Object(Vec::with_capacity(reserve)),
        }
    }

    /// Handles of the direct children, in order.
    pub(crate) fn children(&self) -> Vec<NodeId> {
        match self {
            Payload::Array(items) => items.clone(),
            Payload::Object(entries) => entries.iter().map(|(_, id)| *id).collect(),
            _ => Vec::new(),
        }
    }
}

/// Numbers compare by bit pattern: `-0.0` differs from `0.0`, and a `NaN`
/// equals the identical `NaN`.
impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Null, Payload::Null) => true,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Number(a), Payload::Number(b)) => a.to_bits() == b.to_bits(),
            (Payload::String(a), Payload::String(b)) => a == b,
            (Payload::Opaque(a), Payload::Opaque(b)) => a == b,
            (Payload::Array(a), Payload::Array(b)) => a == b,
            (Payload::Object(a), Payload::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Primitive numeric types accepted by `number_set` and `number_get`.
///
/// Numbers are stored as `f64`. Reading converts with `as` semantics: float
/// to integer truncates toward zero and saturates at the target's range,
/// `f64` to `f32` rounds to the nearest representable value.
pub trait Numeric: Copy {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Numeric for $ty {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_numeric!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
