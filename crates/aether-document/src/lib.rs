//! # aether-document
//!
//! A dynamically typed, JSON-like document tree with transactional undo and
//! redo.
//!
//! Every node holds one of null, bool, number, string, an opaque
//! plain-old-data blob, an array or an object. Each mutation is recorded in
//! the document's pending undo group; [`Document::end_undo_group`] commits
//! the group as one step, and [`Document::undo`] / [`Document::redo`] replay
//! whole groups. Repeated sets of the same node within a group coalesce into a
//! single action.
//!
//! ## Quick start
//!
//! ```rust
//! use aether_document::Document;
//!
//! let mut doc = Document::new("level");
//! let mut root = doc.root_mut();
//! root.array_initialize(4);
//! root.array_append()?.string_set("first");
//! root.array_append()?.string_set("third");
//! doc.end_undo_group();
//!
//! doc.root_mut().array_insert(1)?.string_set("second");
//! doc.end_undo_group();
//! assert_eq!(doc.to_json_string()?, r#"["first","second","third"]"#);
//!
//! doc.undo();
//! assert_eq!(doc.to_json_string()?, r#"["first","third"]"#);
//! # Ok::<(), aether_document::DocumentError>(())
//! ```
//!
//! ## Node handles
//!
//! Nodes are addressed by [`NodeId`] handles that survive edits anywhere else
//! in the tree as well as undo and redo. Undo callbacks registered with
//! [`Document::add_undo_group_action`] cannot borrow the document, so
//! external systems capture handles and resolve them later with
//! [`Document::get`].
//!
//! ## Modules
//!
//! - [`document`]: the [`Document`] façade and undo control
//! - [`value`]: [`Value`] read views and [`ValueMut`] recording cursors
//! - [`opaque`]: type-tagged plain-old-data blobs
//! - [`config`]: [`UndoConfig`] history limits
//! - [`error`]: error types

pub mod config;
pub mod document;
pub mod error;
mod json;
pub mod opaque;
mod store;
pub mod types;
mod undo;
pub mod value;

pub use config::UndoConfig;
pub use document::Document;
pub use error::{DocumentError, Result};
pub use opaque::{OpaqueData, OpaqueValue, OPAQUE_CAPACITY};
pub use store::NodeId;
pub use types::{Numeric, ValueType};
pub use value::{Value, ValueMut};
