use generational_arena::{Arena, Index};
use std::fmt;
use std::path::PathBuf;
use tracing::instrument;

/// Parse state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    /// Placeholder created by the parent, not parsed yet
    #[default]
    Pending,
    /// Parsed and registered in the file map
    Parsed,
    /// Source file could not be read; skipped by the output pass
    Unreadable,
}

/// Data payload for tree nodes representing export pages.
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    /// Source identifier as referenced by the parent's bullet list
    pub identifier: String,
    /// Resolved display name (`.md` appended for leaves)
    pub name: String,
    /// Output path: a directory for index pages, a file for leaves
    pub output_path: PathBuf,
    pub status: NodeStatus,
}

impl NodeData {
    pub fn placeholder(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.output_path.display())
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    /// Page data for this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root.
    /// Non-owning: the arena owns every node.
    pub parent: Option<Index>,
    /// Child indices in bullet order; None until the node is known to be an index
    pub children: Option<Vec<Index>>,
}

impl TreeNode {
    /// Unset and empty child lists are both leaves.
    pub fn is_leaf(&self) -> bool {
        self.children.as_ref().map_or(true, |c| c.is_empty())
    }
}

/// Walk direction for [`TreeArena::relative_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Each traversed index contributes its name
    Descend,
    /// Each traversed index contributes `..`
    Ascend,
}

/// Arena-based tree structure for the page hierarchy.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
#[derive(Debug)]
pub struct TreeArena {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the root node, None for empty trees
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Insert a node; with a parent it is appended to the parent's child list,
    /// without one it becomes the root.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: None,
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.get_or_insert_with(Vec::new).push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn is_leaf(&self, idx: Index) -> bool {
        self.get_node(idx).map_or(true, TreeNode::is_leaf)
    }

    /// Pre-order, left-to-right traversal from the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Output paths of all parsed leaf pages, in traversal order.
    pub fn leaf_paths(&self) -> Vec<PathBuf> {
        self.iter()
            .filter(|(idx, node)| Some(*idx) != self.root && node.is_leaf())
            .filter(|(_, node)| node.data.status == NodeStatus::Parsed)
            .map(|(_, node)| node.data.output_path.clone())
            .collect()
    }

    /// Relative path from `from` down to `target`.
    ///
    /// `from` must be `target` itself or one of its ancestors. Every index
    /// strictly between them contributes one segment: its name when
    /// descending, `..` when ascending. The result is therefore the location
    /// of `target`'s directory seen from `from`'s directory (descending), or
    /// the climb from `target`'s directory back to `from`'s (ascending).
    /// Returns None when `target` is not below `from`.
    #[instrument(level = "trace", skip(self))]
    pub fn relative_path(
        &self,
        from: Index,
        target: Index,
        direction: Direction,
    ) -> Option<PathBuf> {
        self.descend(from, target, direction, PathBuf::new(), true)
    }

    fn descend(
        &self,
        current: Index,
        target: Index,
        direction: Direction,
        acc: PathBuf,
        is_start: bool,
    ) -> Option<PathBuf> {
        if current == target {
            return Some(acc);
        }
        let node = self.get_node(current)?;
        let children = node.children.as_deref().filter(|c| !c.is_empty())?;

        let acc = if is_start {
            acc
        } else {
            match direction {
                Direction::Descend => acc.join(&node.data.name),
                Direction::Ascend => acc.join(".."),
            }
        };

        children
            .iter()
            .find_map(|&child| self.descend(child, target, direction, acc.clone(), false))
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().flatten().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn named(name: &str) -> NodeData {
        NodeData {
            identifier: name.to_string(),
            name: name.to_string(),
            output_path: PathBuf::from(name),
            status: NodeStatus::Parsed,
        }
    }

    //      root
    //      /  \
    //   dir1  other.md
    //   /  \
    // a.md  sub
    //        |
    //       b.md
    fn sample() -> (TreeArena, Index, Index, Index, Index, Index) {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(named(""), None);
        let dir1 = tree.insert_node(named("dir1"), Some(root));
        let _other = tree.insert_node(named("other.md"), Some(root));
        let a = tree.insert_node(named("a.md"), Some(dir1));
        let sub = tree.insert_node(named("sub"), Some(dir1));
        let b = tree.insert_node(named("b.md"), Some(sub));
        (tree, root, dir1, a, sub, b)
    }

    #[test]
    fn test_is_leaf_for_unset_and_empty_children() {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(named("root"), None);
        assert!(tree.is_leaf(root));

        tree.get_node_mut(root).unwrap().children = Some(Vec::new());
        assert!(tree.is_leaf(root));

        tree.insert_node(named("child"), Some(root));
        assert!(!tree.is_leaf(root));
    }

    #[test]
    fn test_descending_path_goes_through_directory_names() {
        let (tree, root, _, a, _, b) = sample();
        assert_eq!(
            tree.relative_path(root, a, Direction::Descend).unwrap(),
            Path::new("dir1")
        );
        assert_eq!(
            tree.relative_path(root, b, Direction::Descend).unwrap(),
            Path::new("dir1/sub")
        );
    }

    #[test]
    fn test_ascending_path_uses_parent_markers() {
        let (tree, root, dir1, a, _, b) = sample();
        assert_eq!(
            tree.relative_path(root, a, Direction::Ascend).unwrap(),
            Path::new("..")
        );
        assert_eq!(
            tree.relative_path(dir1, a, Direction::Ascend).unwrap(),
            Path::new("")
        );
        assert_eq!(
            tree.relative_path(dir1, b, Direction::Ascend).unwrap(),
            Path::new("..")
        );
    }

    #[test]
    fn test_same_node_yields_empty_path() {
        let (tree, _, dir1, _, _, _) = sample();
        assert_eq!(
            tree.relative_path(dir1, dir1, Direction::Descend).unwrap(),
            PathBuf::new()
        );
    }

    #[test]
    fn test_unreachable_target_is_none() {
        let (tree, _, _, a, sub, b) = sample();
        assert!(tree.relative_path(sub, a, Direction::Ascend).is_none());
        assert!(tree.relative_path(a, b, Direction::Descend).is_none());
    }

    #[test]
    fn test_iter_is_preorder_left_to_right() {
        let (tree, _, _, _, _, _) = sample();
        let names: Vec<_> = tree.iter().map(|(_, n)| n.data.name.clone()).collect();
        assert_eq!(names, vec!["", "dir1", "a.md", "sub", "b.md", "other.md"]);
        assert_eq!(tree.len(), 6);
    }
}
