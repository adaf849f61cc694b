//! Line-level reference patterns of the wiki export.
//!
//! Two patterns drive tree construction: the child-list bullet
//! (`- [label](<identifier?n>)`) that marks navigation index pages, and the
//! inline image (`![alt](target)`). A third, generic link pattern is used by
//! the rewrite pass only; its text may hold one or more images, so a linked
//! image `[![alt](pic.png)](url)` is matched as a single link.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

static CHILD_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[(.*?)\]\(<(.*?)\?n>\)\s*$").unwrap());

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").unwrap());

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| {
        Regex::new(r"(!?)\[((?:!\[[^\]]*\]\([^)]*\)|[^\]])*)\]\(([^)]*)\)").unwrap()
    });

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+) ([^ ]+)\.md$").unwrap());

/// Result of classifying one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Child identifiers in bullet order; `None` for a content (leaf) page
    pub children: Option<Vec<String>>,
    /// Local image references, in order of appearance
    pub images: Vec<String>,
}

impl Classified {
    pub fn is_index(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// One link occurrence within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch<'a> {
    /// Byte range of the whole `[text](target)` construct
    pub start: usize,
    pub end: usize,
    pub is_image: bool,
    pub text: &'a str,
    pub target: &'a str,
}

/// Extract the child identifier from a bullet line, if the whole line is one.
pub fn child_ref(line: &str) -> Option<&str> {
    CHILD_REF_RE
        .captures(line)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
}

pub fn is_web_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Whether a local reference resolves below the directory it is joined to:
/// not empty, not absolute and without `..` components.
pub fn is_contained(target: &str) -> bool {
    let bare = bare_target(target);
    !bare.is_empty()
        && Path::new(bare)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Whether an identifier names a single file of the export directory.
pub fn is_file_name(identifier: &str) -> bool {
    let mut components = Path::new(identifier).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Image targets of a line, order preserved.
///
/// Web-absolute targets and targets escaping the export directory are left
/// out; the rewrite pass reports them.
pub fn get_img_refs(line: &str) -> Vec<String> {
    IMAGE_RE
        .captures_iter(line)
        .filter_map(|caps| caps.get(2))
        .map(|m| m.as_str())
        .filter(|target| !is_web_url(target) && is_contained(target))
        .map(str::to_string)
        .collect()
}

/// All `[text](target)` and `![alt](target)` occurrences, left to right.
pub fn find_links(line: &str) -> Vec<LinkMatch<'_>> {
    LINK_RE
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(LinkMatch {
                start: whole.start(),
                end: whole.end(),
                is_image: !caps.get(1)?.as_str().is_empty(),
                text: caps.get(2)?.as_str(),
                target: caps.get(3)?.as_str(),
            })
        })
        .collect()
}

/// Classify a page as navigation index or content leaf.
///
/// Leading and trailing blank lines are ignored. Any other line that is not a
/// child bullet locks the page to leaf and drops the references collected so
/// far. Lines not consumed as bullets are scanned for images either way.
pub fn classify(content: &str) -> Classified {
    let lines: Vec<&str> = content.lines().map(str::trim_end).collect();
    let last_content = lines.iter().rposition(|l| !l.is_empty());

    let mut refs: Option<Vec<String>> = Some(Vec::new());
    let mut images = Vec::new();
    let mut seen_content = false;

    for (i, line) in lines.iter().enumerate() {
        if let Some(collected) = refs.as_mut() {
            let leading_blank = !seen_content && line.is_empty();
            let trailing_blank = last_content.is_some_and(|last| i > last);
            if leading_blank || trailing_blank {
                continue;
            }
            seen_content = true;
            match child_ref(line) {
                Some(identifier) => {
                    collected.push(identifier.to_string());
                    continue;
                }
                None => refs = None,
            }
        }
        images.extend(get_img_refs(line));
    }

    Classified {
        children: refs.filter(|r| !r.is_empty()),
        images,
    }
}

/// Display name of an identifier: `<label> <id>.md` keeps `<label>`,
/// anything else is used verbatim.
pub fn display_name(identifier: &str) -> String {
    NAME_RE
        .captures(identifier)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| identifier.to_string())
}

/// Strip `<...>` wrapping and a trailing `?query` from a link target.
pub fn bare_target(target: &str) -> &str {
    let target = target.trim();
    let target = target
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(target);
    match target.find('?') {
        Some(pos) => &target[..pos],
        None => target,
    }
}
