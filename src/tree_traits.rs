//! Rendering of the page hierarchy as a terminal tree
//!
//! The dry run prints the planned output layout through [`TreeNodeConvert`].

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{NodeStatus, TreeArena, WikiTree};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// Label of a node: its resolved name, directories with a trailing `/`.
fn label(arena: &TreeArena, idx: Index) -> String {
    match arena.get_node(idx) {
        Some(node) if node.data.status == NodeStatus::Unreadable => {
            format!("{} (unreadable)", node.data.identifier)
        }
        Some(node) if !node.is_leaf() => format!("{}/", node.data.name),
        Some(node) => node.data.name.clone(),
        None => String::new(),
    }
}

fn build_tree(arena: &TreeArena, node_idx: Index, parent_tree: &mut Tree<String>) {
    let Some(children) = arena.get_node(node_idx).and_then(|n| n.children.as_ref()) else {
        return;
    };
    for &child_idx in children {
        let mut child_tree = Tree::new(label(arena, child_idx));
        build_tree(arena, child_idx, &mut child_tree);
        parent_tree.push(child_tree);
    }
}

impl TreeNodeConvert for TreeArena {
    fn to_tree_string(&self) -> Tree<String> {
        match self.root() {
            Some(root_idx) => {
                let mut tree = Tree::new(".".to_string());
                build_tree(self, root_idx, &mut tree);
                tree
            }
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

impl TreeNodeConvert for WikiTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let mut tree = self.arena().to_tree_string();
        if let Some(out) = self.output_root() {
            tree.root = out.display().to_string();
        }
        tree
    }
}
