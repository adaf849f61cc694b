//! The page hierarchy of one export and the maps built while parsing it.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeData, NodeStatus, TreeArena};
use crate::domain::dedup::{dedup_name, DedupScope};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::issue::Issue;
use crate::domain::patterns::{classify, display_name, is_file_name};
use crate::domain::rewrite::RewriteOptions;

/// Where page content comes from, keyed by source identifier.
pub trait PageSource {
    fn read_page(&self, identifier: &str) -> io::Result<String>;
}

impl PageSource for HashMap<String, String> {
    fn read_page(&self, identifier: &str) -> io::Result<String> {
        self.get(identifier).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no page {}", identifier))
        })
    }
}

/// File map entry: where a source page ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub output_path: PathBuf,
    pub node: Index,
}

/// Image map entry: the index page whose directory receives the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub owner_path: PathBuf,
    pub owner: Index,
}

/// Coordinator of one conversion run.
///
/// `parse` builds the complete hierarchy; only afterwards may the rewrite
/// methods be used, since image ownership is known only once every page has
/// been visited.
#[derive(Debug)]
pub struct WikiTree {
    source_root: PathBuf,
    output_root: Option<PathBuf>,
    start_file: String,
    pub(crate) arena: TreeArena,
    pub(crate) file_map: HashMap<String, FileEntry>,
    pub(crate) image_map: HashMap<String, ImageEntry>,
    pub(crate) issues: Vec<Issue>,
    pub(crate) options: RewriteOptions,
}

impl WikiTree {
    /// `output_root` of None is a dry run: paths are relative to the output root.
    pub fn new(
        source_root: impl Into<PathBuf>,
        output_root: Option<PathBuf>,
        start_file: impl Into<String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            output_root,
            start_file: start_file.into(),
            arena: TreeArena::new(),
            file_map: HashMap::new(),
            image_map: HashMap::new(),
            issues: Vec::new(),
            options: RewriteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RewriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    pub fn is_dry_run(&self) -> bool {
        self.output_root.is_none()
    }

    pub fn start_file(&self) -> &str {
        &self.start_file
    }

    pub fn arena(&self) -> &TreeArena {
        &self.arena
    }

    pub fn file_map(&self) -> &HashMap<String, FileEntry> {
        &self.file_map
    }

    pub fn image_map(&self) -> &HashMap<String, ImageEntry> {
        &self.image_map
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn push_issue(&mut self, issue: Issue) {
        debug!("issue: {}", issue);
        self.issues.push(issue);
    }

    /// Output path of the root index: the output directory, or empty in a dry run.
    pub fn root_path(&self) -> PathBuf {
        self.output_root.clone().unwrap_or_default()
    }

    /// Node registered for a source identifier.
    pub fn node_for(&self, identifier: &str) -> Option<Index> {
        self.file_map.get(identifier).map(|e| e.node)
    }

    /// Build the hierarchy starting at the start file.
    ///
    /// Fails only when the start file is unreadable or not a navigation
    /// index; unreadable child pages are recorded as issues.
    #[instrument(level = "debug", skip(self, source), fields(start = %self.start_file))]
    pub fn parse(&mut self, source: &dyn PageSource) -> DomainResult<()> {
        let start = self.start_file.clone();
        let root = self
            .arena
            .insert_node(NodeData::placeholder(start.clone()), None);
        let root_path = self.root_path();
        let images = self.parse_node(source, root, &start, true, &root_path, None)?;
        debug!(
            "parsed {} nodes, {} files, {} images ({} at root level)",
            self.arena.len(),
            self.file_map.len(),
            self.image_map.len(),
            images.len()
        );
        Ok(())
    }

    /// Parse one page and everything below it; returns the local image
    /// references found in its subtree.
    fn parse_node(
        &mut self,
        source: &dyn PageSource,
        node: Index,
        identifier: &str,
        is_root: bool,
        parent_path: &Path,
        scope: Option<&mut DedupScope>,
    ) -> DomainResult<Vec<String>> {
        let read = if is_root || is_file_name(identifier) {
            source.read_page(identifier)
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "reference points outside the export directory",
            ))
        };
        let content = match read {
            Ok(content) => content,
            Err(e) if is_root => {
                return Err(DomainError::RootUnreadable {
                    identifier: identifier.to_string(),
                    source: e,
                })
            }
            Err(e) => {
                warn!("cannot read page {}: {}", identifier, e);
                if let Some(n) = self.arena.get_node_mut(node) {
                    n.data.name = display_name(identifier);
                    n.data.status = NodeStatus::Unreadable;
                }
                self.push_issue(Issue::UnreadablePage {
                    identifier: identifier.to_string(),
                    reason: e.to_string(),
                });
                return Ok(Vec::new());
            }
        };

        let classified = classify(&content);
        if is_root && !classified.is_index() {
            return Err(DomainError::RootNotIndex(identifier.to_string()));
        }

        let (name, path) = if is_root {
            (String::new(), parent_path.to_path_buf())
        } else {
            let mut name = dedup_name(scope, &display_name(identifier));
            if !classified.is_index() {
                name.push_str(".md");
            }
            let path = parent_path.join(&name);
            (name, path)
        };
        if let Some(n) = self.arena.get_node_mut(node) {
            n.data.name = name;
            n.data.output_path = path.clone();
            n.data.status = NodeStatus::Parsed;
        }
        if !is_root {
            self.file_map
                .entry(identifier.to_string())
                .or_insert_with(|| FileEntry {
                    output_path: path.clone(),
                    node,
                });
        }
        debug!("{} -> {}", identifier, path.display());

        match classified.children {
            Some(children) if !children.is_empty() => {
                self.parse_children(source, node, &path, &children)
            }
            _ => Ok(unique(classified.images)),
        }
    }

    /// Parse the children of an index page and attribute their images.
    ///
    /// An image first seen here, or returned by more than one child, is owned
    /// by this index so that it sits in the nearest directory shared by every
    /// page that uses it.
    fn parse_children(
        &mut self,
        source: &dyn PageSource,
        node: Index,
        path: &Path,
        identifiers: &[String],
    ) -> DomainResult<Vec<String>> {
        let children: Vec<Index> = identifiers
            .iter()
            .map(|id| {
                self.arena
                    .insert_node(NodeData::placeholder(id.clone()), Some(node))
            })
            .collect();

        let mut scope = DedupScope::new();
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for (child, identifier) in children.into_iter().zip(identifiers) {
            let refs = self.parse_node(source, child, identifier, false, path, Some(&mut scope))?;
            for image in refs {
                if seen.contains(&image) || !self.image_map.contains_key(&image) {
                    self.image_map.insert(
                        image.clone(),
                        ImageEntry {
                            owner_path: path.to_path_buf(),
                            owner: node,
                        },
                    );
                }
                if seen.insert(image.clone()) {
                    images.push(image);
                }
            }
        }
        Ok(images)
    }
}

/// Drop repeated entries, keeping first occurrences in order.
fn unique(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
