//! The virtual namespace: projection tree, path templates, and the view
//! builder that populates the tree from the database.
//!
//! - [`tree`]: arena of nodes, case-insensitive naming, directory-size
//!   counters used to synthesize link counts.
//! - [`template`]: `%`-placeholder path templates expanded per track.
//! - [`views`]: drives the templates (and the playlist collection) over the
//!   whole database and over single tracks.

pub mod template;
pub mod tree;
pub mod views;

pub use template::{PathTemplate, TemplateError};
pub use tree::{Node, NodeId, NodeKind, Tree};
pub use views::ViewBuilder;
