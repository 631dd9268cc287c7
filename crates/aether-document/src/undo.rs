//! Undo groups and the undo/redo log.
//!
//! Every mutation of a document is recorded as an [`UndoAction`] in the
//! pending group. Closing the group moves it onto the undo stack:
//!
//! ```text
//! end_undo_group()        undo()                   redo()
//! ┌──────────────┐       ┌──────────────┐         ┌──────────────┐
//! │ undo: g1 g2  │  ──►  │ undo: g1     │   ──►   │ undo: g1 g2  │
//! │ redo:        │       │ redo: g2     │         │ redo:        │
//! └──────────────┘       └──────────────┘         └──────────────┘
//! ```
//!
//! Undo runs a group's actions last to first; redo runs them first to last.
//! Committing a new group discards the redo stack.

use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::config::UndoConfig;
use crate::error::{DocumentError, Result};
use crate::store::{NodeId, NodeStore};
use crate::types::{Payload, ValueType};

/// A caller-supplied side effect replayed by undo or redo.
pub type UndoCallback = Box<dyn FnMut()>;

/// A reversible change to the node store.
///
/// Removed and replaced content is not copied: the detached nodes stay in
/// the store, so undo reattaches the very same nodes with their handles and
/// descendants intact.
#[derive(Debug)]
pub(crate) enum Edit {
    Replace {
        node: NodeId,
        before: Payload,
        after: Payload,
    },
    ArrayInsert {
        node: NodeId,
        index: usize,
        child: NodeId,
    },
    ArrayRemove {
        node: NodeId,
        index: usize,
        child: NodeId,
    },
    ObjectInsert {
        node: NodeId,
        index: usize,
        key: String,
        child: NodeId,
    },
    ObjectRemove {
        node: NodeId,
        index: usize,
        key: String,
        child: NodeId,
    },
}

impl Edit {
    fn label(&self) -> &'static str {
        match self {
            Edit::Replace { after, .. } => match after.value_type() {
                ValueType::Null => "set null",
                ValueType::Bool => "set bool",
                ValueType::Number => "set number",
                ValueType::String => "set string",
                ValueType::Opaque => "set opaque",
                ValueType::Array => "initialize array",
                ValueType::Object => "initialize object",
            },
            Edit::ArrayInsert { .. } => "array insert",
            Edit::ArrayRemove { .. } => "array remove",
            Edit::ObjectInsert { .. } => "object insert",
            Edit::ObjectRemove { .. } => "object remove",
        }
    }

    /// Handles this edit may bring back into the tree.
    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        match self {
            Edit::Replace {
                node,
                before,
                after,
            } => {
                out.push(*node);
                out.extend(before.children());
                out.extend(after.children());
            }
            Edit::ArrayInsert { node, child, .. }
            | Edit::ArrayRemove { node, child, .. }
            | Edit::ObjectInsert { node, child, .. }
            | Edit::ObjectRemove { node, child, .. } => {
                out.push(*node);
                out.push(*child);
            }
        }
    }

    fn undo(&self, store: &mut NodeStore) -> Result<()> {
        match self {
            Edit::Replace { node, before, .. } => replace(store, *node, before),
            Edit::ArrayInsert { node, child, .. } => array_detach(store, *node, *child),
            Edit::ArrayRemove { node, index, child } => {
                array_attach(store, *node, *index, *child)
            }
            Edit::ObjectInsert { node, child, .. } => object_detach(store, *node, *child),
            Edit::ObjectRemove {
                node,
                index,
                key,
                child,
            } => object_attach(store, *node, *index, key, *child),
        }
    }

    fn redo(&self, store: &mut NodeStore) -> Result<()> {
        match self {
            Edit::Replace { node, after, .. } => replace(store, *node, after),
            Edit::ArrayInsert { node, index, child } => {
                array_attach(store, *node, *index, *child)
            }
            Edit::ArrayRemove { node, child, .. } => array_detach(store, *node, *child),
            Edit::ObjectInsert {
                node,
                index,
                key,
                child,
            } => object_attach(store, *node, *index, key, *child),
            Edit::ObjectRemove { node, child, .. } => object_detach(store, *node, *child),
        }
    }
}

fn replace(store: &mut NodeStore, node: NodeId, payload: &Payload) -> Result<()> {
    let slot = store
        .get_mut(node)
        .ok_or(DocumentError::StaleHandle(node))?;
    *slot = payload.clone();
    Ok(())
}

fn array_items(store: &mut NodeStore, node: NodeId) -> Result<&mut Vec<NodeId>> {
    match store.get_mut(node) {
        Some(Payload::Array(items)) => Ok(items),
        Some(other) => Err(DocumentError::Type {
            expected: ValueType::Array,
            found: other.value_type(),
        }),
        None => Err(DocumentError::StaleHandle(node)),
    }
}

fn object_entries(store: &mut NodeStore, node: NodeId) -> Result<&mut Vec<(String, NodeId)>> {
    match store.get_mut(node) {
        Some(Payload::Object(entries)) => Ok(entries),
        Some(other) => Err(DocumentError::Type {
            expected: ValueType::Object,
            found: other.value_type(),
        }),
        None => Err(DocumentError::StaleHandle(node)),
    }
}

fn array_attach(store: &mut NodeStore, node: NodeId, index: usize, child: NodeId) -> Result<()> {
    let items = array_items(store, node)?;
    if index > items.len() {
        return Err(DocumentError::Bounds {
            index,
            len: items.len(),
        });
    }
    items.insert(index, child);
    Ok(())
}

fn array_detach(store: &mut NodeStore, node: NodeId, child: NodeId) -> Result<()> {
    let items = array_items(store, node)?;
    let position = items
        .iter()
        .position(|id| *id == child)
        .ok_or(DocumentError::HistoryMismatch(node))?;
    items.remove(position);
    Ok(())
}

fn object_attach(
    store: &mut NodeStore,
    node: NodeId,
    index: usize,
    key: &str,
    child: NodeId,
) -> Result<()> {
    let entries = object_entries(store, node)?;
    if index > entries.len() {
        return Err(DocumentError::Bounds {
            index,
            len: entries.len(),
        });
    }
    if entries.iter().any(|(existing, _)| existing == key) {
        return Err(DocumentError::HistoryMismatch(node));
    }
    entries.insert(index, (key.to_owned(), child));
    Ok(())
}

fn object_detach(store: &mut NodeStore, node: NodeId, child: NodeId) -> Result<()> {
    let entries = object_entries(store, node)?;
    let position = entries
        .iter()
        .position(|(_, id)| *id == child)
        .ok_or(DocumentError::HistoryMismatch(node))?;
    entries.remove(position);
    Ok(())
}

pub(crate) enum ActionKind {
    Edit(Edit),
    /// Index into the owning group's callback list.
    Callback(usize),
}

/// The side effects registered by one callback action.
struct CallbackPair {
    undo: UndoCallback,
    redo: UndoCallback,
}

impl fmt::Debug for CallbackPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackPair")
    }
}

/// One reversible step inside an undo group.
pub(crate) struct UndoAction {
    label: Cow<'static, str>,
    kind: ActionKind,
}

impl UndoAction {
    fn edit(edit: Edit) -> Self {
        Self {
            label: Cow::Borrowed(edit.label()),
            kind: ActionKind::Edit(edit),
        }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for UndoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("UndoAction");
        out.field("label", &self.label);
        match &self.kind {
            ActionKind::Edit(edit) => out.field("edit", edit),
            ActionKind::Callback(slot) => out.field("callback", slot),
        };
        out.finish()
    }
}

/// An ordered list of actions that undo and redo as one step.
#[derive(Debug, Default)]
pub(crate) struct UndoGroup {
    actions: Vec<UndoAction>,
    callbacks: Vec<CallbackPair>,
}

impl UndoGroup {
    pub(crate) fn len(&self) -> usize {
        self.actions.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn labels(&self) -> Vec<&str> {
        self.actions.iter().rev().map(UndoAction::label).collect()
    }

    /// Runs undo callbacks last to first. Returns the number of edits that no
    /// longer matched the tree and were skipped.
    pub(crate) fn undo(&mut self, store: &mut NodeStore) -> usize {
        let mut skipped = 0;
        for action in self.actions.iter_mut().rev() {
            match &mut action.kind {
                ActionKind::Edit(edit) => {
                    if let Err(err) = edit.undo(store) {
                        tracing::warn!(action = %action.label, error = %err, "skipping undo of stale edit");
                        skipped += 1;
                    }
                }
                ActionKind::Callback(slot) => {
                    if let Some(pair) = self.callbacks.get_mut(*slot) {
                        (pair.undo)();
                    }
                }
            }
        }
        skipped
    }

    /// Runs redo callbacks first to last. Returns the number of edits that
    /// no longer matched the tree and were skipped.
    pub(crate) fn redo(&mut self, store: &mut NodeStore) -> usize {
        let mut skipped = 0;
        for action in self.actions.iter_mut() {
            match &mut action.kind {
                ActionKind::Edit(edit) => {
                    if let Err(err) = edit.redo(store) {
                        tracing::warn!(action = %action.label, error = %err, "skipping redo of stale edit");
                        skipped += 1;
                    }
                }
                ActionKind::Callback(slot) => {
                    if let Some(pair) = self.callbacks.get_mut(*slot) {
                        (pair.redo)();
                    }
                }
            }
        }
        skipped
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        for action in &self.actions {
            if let ActionKind::Edit(edit) = &action.kind {
                edit.collect_nodes(out);
            }
        }
    }
}

/// What a call to [`UndoLog::commit`] changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Commit {
    pub(crate) actions: usize,
    pub(crate) dropped_redo: usize,
    pub(crate) evicted: usize,
}

impl Commit {
    /// Whether history was discarded, leaving detached nodes to reclaim.
    pub(crate) fn discarded_history(&self) -> bool {
        self.dropped_redo > 0 || self.evicted > 0
    }
}

/// Undo and redo stacks plus the group being composed.
pub(crate) struct UndoLog {
    /// Committed groups, newest at the back.
    undo_stack: VecDeque<UndoGroup>,
    /// Undone groups, most recently undone at the back.
    redo_stack: Vec<UndoGroup>,
    pending: UndoGroup,
    /// Index in `pending` of the open replace action for each node, while
    /// further sets on that node may still merge into it.
    open_replaces: HashMap<NodeId, usize>,
    config: UndoConfig,
}

impl fmt::Debug for UndoLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoLog")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("pending", &self.pending.len())
            .field("config", &self.config)
            .finish()
    }
}

impl UndoLog {
    pub(crate) fn new(config: UndoConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            pending: UndoGroup::default(),
            open_replaces: HashMap::new(),
            config,
        }
    }

    pub(crate) fn config(&self) -> &UndoConfig {
        &self.config
    }

    pub(crate) fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub(crate) fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn next_undo(&self) -> Option<&UndoGroup> {
        self.undo_stack.back()
    }

    pub(crate) fn next_redo(&self) -> Option<&UndoGroup> {
        self.redo_stack.last()
    }

    /// Records that `node` changed from `before` to `after`.
    ///
    /// While the pending group still holds an open replace for `node`, the
    /// new value is folded into it: the group keeps the value from before the
    /// first set and the value after the last one. Sets that bring the node
    /// back to its value from before the first set leave no action behind.
    pub(crate) fn record_replace(&mut self, node: NodeId, before: Payload, after: Payload) {
        if self.config.coalesce_sets {
            if let Some(&index) = self.open_replaces.get(&node) {
                if let Some(UndoAction {
                    kind:
                        ActionKind::Edit(Edit::Replace {
                            before: first,
                            after: open,
                            ..
                        }),
                    ..
                }) = self.pending.actions.get_mut(index)
                {
                    if *first != after {
                        *open = after;
                        return;
                    }
                    self.drop_open_replace(node, index);
                    return;
                }
            }
            self.open_replaces.insert(node, self.pending.actions.len());
        }
        self.pending
            .actions
            .push(UndoAction::edit(Edit::Replace { node, before, after }));
    }

    /// Forgets an open replace whose sets ended where they started.
    fn drop_open_replace(&mut self, node: NodeId, index: usize) {
        self.pending.actions.remove(index);
        self.open_replaces.remove(&node);
        for open in self.open_replaces.values_mut() {
            if *open > index {
                *open -= 1;
            }
        }
    }

    /// Records a change to the children of a container. A later set on the
    /// same container starts a new replace action, so replay never applies a
    /// structural edit to a payload of the wrong shape.
    pub(crate) fn record_structural(&mut self, edit: Edit) {
        let node = match &edit {
            Edit::Replace { node, .. }
            | Edit::ArrayInsert { node, .. }
            | Edit::ArrayRemove { node, .. }
            | Edit::ObjectInsert { node, .. }
            | Edit::ObjectRemove { node, .. } => *node,
        };
        self.open_replaces.remove(&node);
        self.pending.actions.push(UndoAction::edit(edit));
    }

    /// Appends a callback action and returns its redo callback.
    pub(crate) fn push_callback(
        &mut self,
        label: String,
        undo: UndoCallback,
        redo: UndoCallback,
    ) -> &mut dyn FnMut() {
        let slot = self.pending.callbacks.len();
        self.pending.actions.push(UndoAction {
            label: Cow::Owned(label),
            kind: ActionKind::Callback(slot),
        });
        self.pending.callbacks.push(CallbackPair { undo, redo });
        self.pending.callbacks[slot].redo.as_mut()
    }

    /// Closes the pending group. An empty group changes nothing; otherwise
    /// the redo stack is discarded and the depth limit enforced.
    pub(crate) fn commit(&mut self) -> Commit {
        if self.pending.is_empty() {
            return Commit::default();
        }
        let group = std::mem::take(&mut self.pending);
        self.open_replaces.clear();

        let mut commit = Commit {
            actions: group.len(),
            dropped_redo: self.redo_stack.len(),
            evicted: 0,
        };
        self.redo_stack.clear();
        self.undo_stack.push_back(group);

        while self.config.exceeds_depth(self.undo_stack.len()) {
            if self.undo_stack.pop_front().is_none() {
                break;
            }
            commit.evicted += 1;
        }
        commit
    }

    /// Drops the pending group without running it. Returns how many actions
    /// were dropped.
    pub(crate) fn abandon_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending = UndoGroup::default();
        self.open_replaces.clear();
        dropped
    }

    pub(crate) fn pop_undo(&mut self) -> Option<UndoGroup> {
        self.undo_stack.pop_back()
    }

    pub(crate) fn push_undo(&mut self, group: UndoGroup) {
        self.undo_stack.push_back(group);
    }

    pub(crate) fn pop_redo(&mut self) -> Option<UndoGroup> {
        self.redo_stack.pop()
    }

    pub(crate) fn push_redo(&mut self, group: UndoGroup) {
        self.redo_stack.push(group);
    }

    /// Discards all history without running any callbacks.
    pub(crate) fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.abandon_pending();
    }

    /// Every node handle some recorded action may restore.
    pub(crate) fn referenced_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for group in self
            .undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .chain(std::iter::once(&self.pending))
        {
            group.collect_nodes(&mut out);
        }
        out
    }
}
