//! Export conversion service
//!
//! Runs the two phases of a conversion: parse the whole export into a
//! [`WikiTree`], then materialise the output tree (directories, images,
//! rewritten pages) from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::patterns::bare_target;
use crate::domain::{Issue, NodeStatus, PageSource, RewriteOptions, WikiTree};
use crate::infrastructure::traits::{ExportSource, FileSystem};

/// Counters of one output pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub directories: usize,
    pub pages: usize,
    pub images: usize,
}

/// A page scheduled for the output pass.
struct PlannedPage {
    node: Index,
    identifier: String,
    output_path: PathBuf,
    is_index: bool,
}

/// Service converting a wiki export into a docs tree.
pub struct ConvertService {
    fs: Arc<dyn FileSystem>,
    options: RewriteOptions,
    home_page: String,
}

impl ConvertService {
    /// Create a new conversion service.
    pub fn new(fs: Arc<dyn FileSystem>, options: RewriteOptions, home_page: String) -> Self {
        Self {
            fs,
            options,
            home_page,
        }
    }

    /// Parse the export below `input`, starting at `start_file`.
    ///
    /// `output` of None plans a dry run.
    #[instrument(level = "debug", skip(self))]
    pub fn parse(
        &self,
        input: &Path,
        output: Option<PathBuf>,
        start_file: &str,
    ) -> ApplicationResult<WikiTree> {
        if !self.fs.is_dir(input) {
            return Err(ApplicationError::InputNotFound(input.to_path_buf()));
        }
        let mut tree =
            WikiTree::new(input, output, start_file).with_options(self.options.clone());
        let source = ExportSource::new(self.fs.as_ref(), input);
        tree.parse(&source)?;
        info!(
            "parsed {} pages ({} images) from {}",
            tree.file_map().len(),
            tree.image_map().len(),
            input.display()
        );
        Ok(tree)
    }

    /// Parse and write in one go.
    pub fn convert(
        &self,
        input: &Path,
        output: Option<PathBuf>,
        start_file: &str,
    ) -> ApplicationResult<(WikiTree, ConvertSummary)> {
        let mut tree = self.parse(input, output, start_file)?;
        let summary = self.write_output(&mut tree)?;
        Ok((tree, summary))
    }

    /// Materialise a fully parsed tree.
    ///
    /// Directory creation failures abort; everything else (unreadable
    /// pages, failed copies, unresolved references) lands in the tree's
    /// issue list. In a dry run pages are rewritten in memory only.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn write_output(&self, tree: &mut WikiTree) -> ApplicationResult<ConvertSummary> {
        let mut summary = ConvertSummary::default();
        let dry_run = tree.is_dry_run();
        let root_path = tree.root_path();

        if !dry_run {
            self.fs
                .create_dir_all(&root_path)
                .with_path_context("create output directory", &root_path)?;
            summary.directories += 1;
        }

        let planned = plan(tree);
        for page in planned.iter().filter(|p| p.is_index) {
            if !dry_run {
                self.fs
                    .create_dir_all(&page.output_path)
                    .with_path_context("create directory", &page.output_path)?;
            }
            summary.directories += 1;
        }

        if !dry_run {
            summary.images = self.copy_images(tree);
        }

        let source_root = tree.source_root().to_path_buf();
        for page in planned.iter().filter(|p| !p.is_index) {
            if self.write_page(tree, &source_root, page, dry_run) {
                summary.pages += 1;
            }
        }

        self.check_home_page(tree, &planned);
        info!(
            "{} directories, {} pages, {} images, {} issues",
            summary.directories,
            summary.pages,
            summary.images,
            tree.issues().len()
        );
        Ok(summary)
    }

    /// Copy every attributed image next to its owning index.
    fn copy_images(&self, tree: &mut WikiTree) -> usize {
        let mut images: Vec<(String, PathBuf)> = tree
            .image_map()
            .iter()
            .map(|(reference, entry)| (reference.clone(), entry.owner_path.clone()))
            .collect();
        images.sort();

        let mut copied = 0;
        for (reference, owner_path) in images {
            let file = bare_target(&reference);
            let from = tree.source_root().join(file);
            let to = owner_path.join(file);
            debug!("copy image {} -> {}", from.display(), to.display());

            let result = self
                .fs
                .ensure_parent(&to)
                .and_then(|_| self.fs.copy(&from, &to))
                .describe_err();
            match result {
                Ok(_) => copied += 1,
                Err(reason) => {
                    warn!("cannot copy image {}: {}", reference, reason);
                    tree.push_issue(Issue::ImageCopyFailed {
                        image: reference,
                        reason,
                    });
                }
            }
        }
        copied
    }

    /// Rewrite one leaf page; returns whether it was produced.
    fn write_page(
        &self,
        tree: &mut WikiTree,
        source_root: &Path,
        page: &PlannedPage,
        dry_run: bool,
    ) -> bool {
        let source = ExportSource::new(self.fs.as_ref(), source_root);
        let content = match source.read_page(&page.identifier) {
            Ok(content) => content,
            Err(e) => {
                tree.push_issue(Issue::UnreadablePage {
                    identifier: page.identifier.clone(),
                    reason: e.to_string(),
                });
                return false;
            }
        };

        let fixed = tree.fix_lines(&content, page.node);
        if dry_run {
            return true;
        }

        let result = self
            .fs
            .ensure_parent(&page.output_path)
            .and_then(|_| self.fs.write(&page.output_path, &fixed))
            .describe_err();
        match result {
            Ok(()) => {
                debug!("wrote {}", page.output_path.display());
                true
            }
            Err(reason) => {
                tree.push_issue(Issue::PageWriteFailed {
                    page: page.output_path.clone(),
                    reason,
                });
                false
            }
        }
    }

    /// The home page must be produced by this run; a file left in the
    /// output directory by an earlier run does not count.
    fn check_home_page(&self, tree: &mut WikiTree, planned: &[PlannedPage]) {
        let home = tree.root_path().join(&self.home_page);
        if !planned.iter().any(|p| !p.is_index && p.output_path == home) {
            tree.push_issue(Issue::MissingHomePage);
        }
    }
}

/// Parsed pages below the root, in pre-order.
fn plan(tree: &WikiTree) -> Vec<PlannedPage> {
    let root = tree.arena().root();
    tree.arena()
        .iter()
        .filter(|(idx, node)| Some(*idx) != root && node.data.status == NodeStatus::Parsed)
        .map(|(idx, node)| PlannedPage {
            node: idx,
            identifier: node.data.identifier.clone(),
            output_path: node.data.output_path.clone(),
            is_index: !node.is_leaf(),
        })
        .collect()
}
