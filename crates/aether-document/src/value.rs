//! Read views and recording cursors over document nodes.
//!
//! [`Value`] borrows the document immutably and only reads. [`ValueMut`]
//! borrows it exclusively; every mutation made through it is applied to the
//! node and recorded in the document's pending undo group.

use std::fmt;

use crate::document::Document;
use crate::error::{DocumentError, Result};
use crate::json;
use crate::opaque::{OpaqueData, OpaqueValue};
use crate::store::{NodeId, NodeStore};
use crate::types::{Numeric, Payload, ValueType};
use crate::undo::Edit;

fn type_error(expected: ValueType, found: &Payload) -> DocumentError {
    DocumentError::Type {
        expected,
        found: found.value_type(),
    }
}

/// A shared view of one document node.
#[derive(Clone, Copy)]
pub struct Value<'a> {
    store: &'a NodeStore,
    id: NodeId,
}

impl<'a> Value<'a> {
    pub(crate) fn new(store: &'a NodeStore, id: NodeId) -> Result<Self> {
        if store.contains(id) {
            Ok(Self { store, id })
        } else {
            Err(DocumentError::StaleHandle(id))
        }
    }

    /// Callers guarantee `id` is live in `store`.
    pub(crate) fn new_unchecked(store: &'a NodeStore, id: NodeId) -> Self {
        debug_assert!(store.contains(id), "view of stale node {id}");
        Self { store, id }
    }

    fn child(&self, id: NodeId) -> Value<'a> {
        Value {
            store: self.store,
            id,
        }
    }

    fn payload(&self) -> &'a Payload {
        self.store.payload(self.id)
    }

    fn items(&self) -> Result<&'a [NodeId]> {
        match self.payload() {
            Payload::Array(items) => Ok(items),
            other => Err(type_error(ValueType::Array, other)),
        }
    }

    fn entries(&self) -> Result<&'a [(String, NodeId)]> {
        match self.payload() {
            Payload::Object(entries) => Ok(entries),
            other => Err(type_error(ValueType::Object, other)),
        }
    }

    /// The stable handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value_type(&self) -> ValueType {
        self.payload().value_type()
    }

    pub fn is_null(&self) -> bool {
        self.value_type() == ValueType::Null
    }

    pub fn is_bool(&self) -> bool {
        self.value_type() == ValueType::Bool
    }

    pub fn is_number(&self) -> bool {
        self.value_type() == ValueType::Number
    }

    pub fn is_string(&self) -> bool {
        self.value_type() == ValueType::String
    }

    pub fn is_opaque(&self) -> bool {
        self.value_type() == ValueType::Opaque
    }

    pub fn is_array(&self) -> bool {
        self.value_type() == ValueType::Array
    }

    pub fn is_object(&self) -> bool {
        self.value_type() == ValueType::Object
    }

    pub fn bool_get(&self) -> Result<bool> {
        match self.payload() {
            Payload::Bool(value) => Ok(*value),
            other => Err(type_error(ValueType::Bool, other)),
        }
    }

    /// The stored number converted to `T` with `as` semantics.
    pub fn number_get<T: Numeric>(&self) -> Result<T> {
        match self.payload() {
            Payload::Number(value) => Ok(T::from_f64(*value)),
            other => Err(type_error(ValueType::Number, other)),
        }
    }

    pub fn string_get(&self) -> Result<&'a str> {
        match self.payload() {
            Payload::String(value) => Ok(value),
            other => Err(type_error(ValueType::String, other)),
        }
    }

    /// The stored opaque value if it was set from exactly `T`, otherwise
    /// `default`. Only a node that is not opaque at all is an error.
    pub fn opaque_get<T: OpaqueData>(&self, default: T) -> Result<T> {
        Ok(self.opaque()?.get(default))
    }

    /// Like [`opaque_get`](Value::opaque_get), reporting a type mismatch as
    /// `None`.
    pub fn opaque_try_get<T: OpaqueData>(&self) -> Result<Option<T>> {
        Ok(self.opaque()?.try_get())
    }

    /// The raw opaque blob, for inspecting its stored type.
    pub fn opaque(&self) -> Result<&'a OpaqueValue> {
        match self.payload() {
            Payload::Opaque(value) => Ok(value),
            other => Err(type_error(ValueType::Opaque, other)),
        }
    }

    pub fn array_len(&self) -> Result<usize> {
        Ok(self.items()?.len())
    }

    pub fn array_get(&self, index: usize) -> Result<Value<'a>> {
        let items = self.items()?;
        items
            .get(index)
            .map(|id| self.child(*id))
            .ok_or(DocumentError::Bounds {
                index,
                len: items.len(),
            })
    }

    /// Array elements in order.
    pub fn array_iter(&self) -> Result<impl Iterator<Item = Value<'a>> + 'a> {
        let store = self.store;
        Ok(self.items()?.iter().map(move |id| Value { store, id: *id }))
    }

    pub fn object_len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn object_get_key(&self, index: usize) -> Result<&'a str> {
        let entries = self.entries()?;
        entries
            .get(index)
            .map(|(key, _)| key.as_str())
            .ok_or(DocumentError::Bounds {
                index,
                len: entries.len(),
            })
    }

    pub fn object_get_value(&self, index: usize) -> Result<Value<'a>> {
        let entries = self.entries()?;
        entries
            .get(index)
            .map(|(_, id)| self.child(*id))
            .ok_or(DocumentError::Bounds {
                index,
                len: entries.len(),
            })
    }

    /// The value stored under `key`, or `None` if the object has no such key.
    pub fn object_try_get(&self, key: &str) -> Result<Option<Value<'a>>> {
        Ok(self
            .entries()?
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, id)| self.child(*id)))
    }

    /// Object entries in insertion order.
    pub fn object_iter(&self) -> Result<impl Iterator<Item = (&'a str, Value<'a>)> + 'a> {
        let store = self.store;
        Ok(self
            .entries()?
            .iter()
            .map(move |(key, id)| (key.as_str(), Value { store, id: *id })))
    }

    /// Converts this subtree to JSON.
    ///
    /// # Errors
    ///
    /// Fails on opaque values and non-finite numbers, which JSON cannot
    /// represent.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        json::encode_value(*self)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("id", &self.id)
            .field("type", &self.value_type())
            .finish()
    }
}

/// An exclusive cursor on one document node.
///
/// Setters convert the node from whatever type it held before. Structural
/// operations return a cursor on the affected child, borrowed from this one,
/// so edits chain down the tree:
///
/// ```
/// use aether_document::Document;
///
/// let mut doc = Document::new("level");
/// let mut root = doc.root_mut();
/// root.object_initialize(0);
/// root.object_set("name")?.string_set("crypt");
/// root.object_set("size")?.number_set(12);
/// doc.end_undo_group();
///
/// assert_eq!(doc.root().object_get_key(1)?, "size");
/// # Ok::<(), aether_document::DocumentError>(())
/// ```
pub struct ValueMut<'a> {
    doc: &'a mut Document,
    id: NodeId,
}

impl<'a> ValueMut<'a> {
    /// Callers guarantee `id` is live in `doc`.
    pub(crate) fn new(doc: &'a mut Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn child(&mut self, id: NodeId) -> ValueMut<'_> {
        ValueMut {
            doc: &mut *self.doc,
            id,
        }
    }

    /// The stable handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// A read-only view of this node.
    pub fn view(&self) -> Value<'_> {
        Value {
            store: &self.doc.store,
            id: self.id,
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.view().value_type()
    }

    /// Installs `after` as the node's payload and records the change. An
    /// unchanged payload records nothing.
    fn replace(&mut self, after: Payload) -> &mut Self {
        let current = self.doc.store.payload_mut(self.id);
        if *current == after {
            return self;
        }
        let before = std::mem::replace(current, after);
        let recorded = current.clone();
        self.doc.log.record_replace(self.id, before, recorded);
        self
    }

    fn items_mut(&mut self) -> Result<&mut Vec<NodeId>> {
        match self.doc.store.payload_mut(self.id) {
            Payload::Array(items) => Ok(items),
            other => Err(type_error(ValueType::Array, other)),
        }
    }

    fn entries_mut(&mut self) -> Result<&mut Vec<(String, NodeId)>> {
        match self.doc.store.payload_mut(self.id) {
            Payload::Object(entries) => Ok(entries),
            other => Err(type_error(ValueType::Object, other)),
        }
    }

    /// Resets the node to the empty value of `ty`. Re-initializing a node
    /// that already has type `ty` still clears its content.
    pub fn initialize(&mut self, ty: ValueType) -> &mut Self {
        self.replace(Payload::empty(ty, 0))
    }

    pub fn bool_set(&mut self, value: bool) -> &mut Self {
        self.replace(Payload::Bool(value))
    }

    /// Stores `value` as an `f64`.
    pub fn number_set<T: Numeric>(&mut self, value: T) -> &mut Self {
        self.replace(Payload::Number(value.to_f64()))
    }

    pub fn string_set(&mut self, value: &str) -> &mut Self {
        if matches!(self.doc.store.payload(self.id), Payload::String(current) if current == value)
        {
            return self;
        }
        self.replace(Payload::String(value.to_owned()))
    }

    /// Stores a copy of `value` tagged with its type.
    pub fn opaque_set<T: OpaqueData>(&mut self, value: T) -> &mut Self {
        self.replace(Payload::Opaque(OpaqueValue::new(value)))
    }

    /// Converts the node to an empty array. `reserve` is a capacity hint.
    pub fn array_initialize(&mut self, reserve: usize) -> &mut Self {
        self.replace(Payload::empty(ValueType::Array, reserve))
    }

    /// Converts the node to an empty object. `reserve` is a capacity hint.
    pub fn object_initialize(&mut self, reserve: usize) -> &mut Self {
        self.replace(Payload::empty(ValueType::Object, reserve))
    }

    pub fn array_len(&self) -> Result<usize> {
        self.view().array_len()
    }

    pub fn array_get_mut(&mut self, index: usize) -> Result<ValueMut<'_>> {
        let items = self.items_mut()?;
        let id = *items.get(index).ok_or(DocumentError::Bounds {
            index,
            len: items.len(),
        })?;
        Ok(self.child(id))
    }

    /// Appends a null element and returns a cursor on it.
    pub fn array_append(&mut self) -> Result<ValueMut<'_>> {
        let len = self.items_mut()?.len();
        self.array_insert(len)
    }

    /// Inserts a null element at `index`, shifting later elements right.
    /// `index` may equal the length.
    pub fn array_insert(&mut self, index: usize) -> Result<ValueMut<'_>> {
        let len = self.items_mut()?.len();
        if index > len {
            return Err(DocumentError::Bounds { index, len });
        }
        let child = self.doc.store.alloc(Payload::Null);
        self.items_mut()?.insert(index, child);
        self.doc.log.record_structural(Edit::ArrayInsert {
            node: self.id,
            index,
            child,
        });
        Ok(self.child(child))
    }

    /// Removes the element at `index`. Undo restores the same element with
    /// its whole subtree.
    pub fn array_remove(&mut self, index: usize) -> Result<()> {
        let items = self.items_mut()?;
        if index >= items.len() {
            return Err(DocumentError::Bounds {
                index,
                len: items.len(),
            });
        }
        let child = items.remove(index);
        self.doc.log.record_structural(Edit::ArrayRemove {
            node: self.id,
            index,
            child,
        });
        Ok(())
    }

    pub fn object_len(&self) -> Result<usize> {
        self.view().object_len()
    }

    /// Returns the entry for `key`, appending a null entry when the key is
    /// absent. Existing entries keep their position.
    pub fn object_set(&mut self, key: &str) -> Result<ValueMut<'_>> {
        let entries = self.entries_mut()?;
        let index = entries.len();
        let existing = entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, id)| *id);
        if let Some(id) = existing {
            return Ok(self.child(id));
        }
        let child = self.doc.store.alloc(Payload::Null);
        self.entries_mut()?.push((key.to_owned(), child));
        self.doc.log.record_structural(Edit::ObjectInsert {
            node: self.id,
            index,
            key: key.to_owned(),
            child,
        });
        Ok(self.child(child))
    }

    pub fn object_try_get_mut(&mut self, key: &str) -> Result<Option<ValueMut<'_>>> {
        let found = self
            .entries_mut()?
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, id)| *id);
        Ok(found.map(|id| self.child(id)))
    }

    pub fn object_get_value_mut(&mut self, index: usize) -> Result<ValueMut<'_>> {
        let entries = self.entries_mut()?;
        let id = entries
            .get(index)
            .map(|(_, id)| *id)
            .ok_or(DocumentError::Bounds {
                index,
                len: entries.len(),
            })?;
        Ok(self.child(id))
    }

    /// Removes the entry for `key`. Returns `false`, recording nothing, if
    /// there is no such entry.
    pub fn object_remove(&mut self, key: &str) -> Result<bool> {
        let entries = self.entries_mut()?;
        let Some(index) = entries.iter().position(|(existing, _)| existing == key) else {
            return Ok(false);
        };
        let (key, child) = entries.remove(index);
        self.doc.log.record_structural(Edit::ObjectRemove {
            node: self.id,
            index,
            key,
            child,
        });
        Ok(true)
    }

    /// Replaces this node's content with `value`.
    ///
    /// The import goes through the recording setters, so one undo reverts it
    /// like any other edit in the group.
    pub fn set_json(&mut self, value: &serde_json::Value) -> Result<&mut Self> {
        json::decode_into(self, value)?;
        Ok(self)
    }
}

impl fmt::Debug for ValueMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueMut")
            .field("id", &self.id)
            .field("type", &self.value_type())
            .finish()
    }
}
