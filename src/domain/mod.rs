//! Domain layer: page hierarchy, reference patterns and link rewriting
//!
//! This layer does no filesystem I/O of its own; page content arrives through
//! the [`PageSource`] trait.

pub mod arena;
pub mod dedup;
pub mod error;
pub mod issue;
pub mod patterns;
pub mod rewrite;
pub mod tree;

pub use arena::{Direction, NodeData, NodeStatus, TreeArena, TreeNode};
pub use dedup::{dedup_name, DedupScope};
pub use error::{DomainError, DomainResult};
pub use issue::{Issue, MISSING_HOME_PAGE};
pub use rewrite::RewriteOptions;
pub use tree::{FileEntry, ImageEntry, PageSource, WikiTree};
