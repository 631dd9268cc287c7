//! The document façade: a root node plus its undo history.

use std::fmt;

use crate::config::UndoConfig;
use crate::error::{DocumentError, Result};
use crate::store::{NodeId, NodeStore};
use crate::types::Payload;
use crate::undo::{UndoCallback, UndoLog};
use crate::value::{Value, ValueMut};

/// A dynamically typed tree with transactional undo and redo.
///
/// Edits made through [`root_mut`](Document::root_mut) or
/// [`get_mut`](Document::get_mut) accumulate in a pending group until
/// [`end_undo_group`](Document::end_undo_group) commits them as one undo step.
///
/// ```
/// use aether_document::Document;
///
/// let mut doc = Document::new("settings");
/// doc.root_mut().string_set("initial");
/// doc.end_undo_group();
/// doc.root_mut().string_set("changed");
/// doc.end_undo_group();
///
/// assert!(doc.undo());
/// assert_eq!(doc.root().string_get()?, "initial");
/// assert!(doc.redo());
/// assert_eq!(doc.root().string_get()?, "changed");
/// # Ok::<(), aether_document::DocumentError>(())
/// ```
pub struct Document {
    tag: String,
    pub(crate) store: NodeStore,
    root: NodeId,
    pub(crate) log: UndoLog,
}

impl Document {
    /// An empty (`Null`) document with unlimited history.
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_config(tag, UndoConfig::default())
    }

    pub fn with_config(tag: impl Into<String>, config: UndoConfig) -> Self {
        let mut store = NodeStore::new();
        let root = store.alloc(Payload::Null);
        Self {
            tag: tag.into(),
            store,
            root,
            log: UndoLog::new(config),
        }
    }

    /// Loads a document from JSON. The import is not undoable: the new
    /// document starts with an empty history.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid JSON.
    pub fn from_json_str(tag: impl Into<String>, json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let mut doc = Self::new(tag);
        doc.root_mut().set_json(&value)?;
        doc.log.clear();
        Ok(doc)
    }

    /// The name given at construction, for diagnostics.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn config(&self) -> &UndoConfig {
        self.log.config()
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> Value<'_> {
        // The root is a sweep root, so it is always live.
        Value::new_unchecked(&self.store, self.root)
    }

    pub fn root_mut(&mut self) -> ValueMut<'_> {
        let root = self.root;
        ValueMut::new(self, root)
    }

    /// Whether `id` still refers to a node of this document.
    pub fn contains(&self, id: NodeId) -> bool {
        self.store.contains(id)
    }

    /// Resolves a handle taken earlier, for example inside an undo callback.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::StaleHandle`] once the node has been
    /// discarded along with the history that could restore it.
    pub fn get(&self, id: NodeId) -> Result<Value<'_>> {
        Value::new(&self.store, id)
    }

    /// Mutable counterpart of [`get`](Document::get).
    pub fn get_mut(&mut self, id: NodeId) -> Result<ValueMut<'_>> {
        if !self.store.contains(id) {
            return Err(DocumentError::StaleHandle(id));
        }
        Ok(ValueMut::new(self, id))
    }

    /// Commits the pending edits as one undo step. Does nothing, and keeps
    /// the redo history, when nothing is pending.
    pub fn end_undo_group(&mut self) {
        let commit = self.log.commit();
        if commit.actions == 0 {
            return;
        }
        tracing::debug!(
            tag = %self.tag,
            actions = commit.actions,
            undo_depth = self.log.undo_depth(),
            "committed undo group"
        );
        if commit.evicted > 0 {
            tracing::trace!(
                tag = %self.tag,
                evicted = commit.evicted,
                max_undo_groups = self.log.config().max_undo_groups,
                "evicted oldest undo groups"
            );
        }
        if commit.discarded_history() {
            self.collect_garbage();
        }
    }

    /// Reverts the most recent undo group. Returns `false` if there is
    /// nothing to undo.
    ///
    /// Uncommitted edits are discarded from the history first; their effects
    /// remain in the document.
    pub fn undo(&mut self) -> bool {
        self.abandon_pending("undo");
        let Some(mut group) = self.log.pop_undo() else {
            return false;
        };
        let skipped = group.undo(&mut self.store);
        tracing::debug!(
            tag = %self.tag,
            actions = group.len(),
            skipped,
            "undo"
        );
        self.log.push_redo(group);
        true
    }

    /// Reapplies the most recently undone group. Returns `false` if there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.abandon_pending("redo");
        let Some(mut group) = self.log.pop_redo() else {
            return false;
        };
        let skipped = group.redo(&mut self.store);
        tracing::debug!(
            tag = %self.tag,
            actions = group.len(),
            skipped,
            "redo"
        );
        self.log.push_undo(group);
        true
    }

    fn abandon_pending(&mut self, during: &str) {
        let dropped = self.log.abandon_pending();
        if dropped > 0 {
            tracing::warn!(
                tag = %self.tag,
                dropped,
                during,
                "discarding uncommitted edits from history; call end_undo_group first"
            );
            self.collect_garbage();
        }
    }

    /// Discards all history without running any callbacks. The document
    /// content is unchanged.
    pub fn clear_undo(&mut self) {
        self.log.clear();
        self.collect_garbage();
    }

    /// Number of committed groups available to [`undo`](Document::undo).
    pub fn undo_stack_size(&self) -> usize {
        self.log.undo_depth()
    }

    /// Number of groups available to [`redo`](Document::redo).
    pub fn redo_stack_size(&self) -> usize {
        self.log.redo_depth()
    }

    /// Number of recorded actions not yet committed.
    pub fn pending_action_count(&self) -> usize {
        self.log.pending_len()
    }

    pub fn can_undo(&self) -> bool {
        self.log.undo_depth() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.log.redo_depth() > 0
    }

    /// Action labels of the group [`undo`](Document::undo) would revert,
    /// most recent first.
    pub fn undo_labels(&self) -> Vec<&str> {
        self.log
            .next_undo()
            .map(|group| group.labels())
            .unwrap_or_default()
    }

    /// Action labels of the group [`redo`](Document::redo) would reapply,
    /// most recent first.
    pub fn redo_labels(&self) -> Vec<&str> {
        self.log
            .next_redo()
            .map(|group| group.labels())
            .unwrap_or_default()
    }

    /// Registers an external side effect in the pending group.
    ///
    /// `undo` and `redo` replay in lockstep with the group's document edits:
    /// last to first on undo, first to last on redo. The returned reference is
    /// the stored redo callback; call it to apply the effect now.
    ///
    /// ```
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use aether_document::Document;
    ///
    /// let mut doc = Document::new("scene");
    /// let meshes = Rc::new(Cell::new(0));
    /// let (up, down) = (Rc::clone(&meshes), Rc::clone(&meshes));
    /// (doc.add_undo_group_action(
    ///     "load mesh",
    ///     move || down.set(down.get() - 1),
    ///     move || up.set(up.get() + 1),
    /// ))();
    /// doc.end_undo_group();
    /// assert_eq!(meshes.get(), 1);
    ///
    /// doc.undo();
    /// assert_eq!(meshes.get(), 0);
    /// ```
    pub fn add_undo_group_action(
        &mut self,
        label: impl Into<String>,
        undo: impl FnMut() + 'static,
        redo: impl FnMut() + 'static,
    ) -> &mut dyn FnMut() {
        let undo: UndoCallback = Box::new(undo);
        let redo: UndoCallback = Box::new(redo);
        self.log.push_callback(label.into(), undo, redo)
    }

    /// Number of nodes held by the document, including detached nodes kept
    /// alive by the history.
    pub fn node_count(&self) -> usize {
        self.store.live_count()
    }

    /// Serializes the whole document.
    ///
    /// # Errors
    ///
    /// Fails on opaque values and non-finite numbers.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.root().to_json()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }

    /// Frees nodes that neither the tree nor the remaining history can reach.
    fn collect_garbage(&mut self) {
        let roots = std::iter::once(self.root).chain(self.log.referenced_nodes());
        let freed = self.store.sweep(roots);
        if freed > 0 {
            tracing::debug!(
                tag = %self.tag,
                freed,
                live = self.store.live_count(),
                "swept detached nodes"
            );
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("tag", &self.tag)
            .field("root", &self.root)
            .field("nodes", &self.store.live_count())
            .field("log", &self.log)
            .finish()
    }
}
