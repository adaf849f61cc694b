//! Link and image rewriting for leaf pages.

use std::path::{Path, PathBuf};

use generational_arena::Index;
use tracing::trace;

use crate::domain::arena::Direction;
use crate::domain::issue::Issue;
use crate::domain::patterns::{bare_target, find_links, is_contained, is_web_url, LinkMatch};
use crate::domain::tree::WikiTree;
use crate::util::path::to_link;

/// Knobs of the rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Link target substituted for anything that cannot be resolved
    pub placeholder: String,
    /// Image markup; `{src}` and `{alt}` are replaced
    pub image_template: String,
    /// URL prefix of the hosted wiki app
    pub wiki_app_prefix: String,
    /// Image hosts whose links are known to expire
    pub broken_image_hosts: Vec<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            placeholder: "#unresolved".into(),
            image_template: r#"<p align="center"><img src="{src}" alt="{alt}"></p>"#.into(),
            wiki_app_prefix: "https://app.nuclino.com/".into(),
            broken_image_hosts: vec!["files.nuclino.com".into()],
        }
    }
}

impl RewriteOptions {
    pub fn render_image(&self, src: &str, alt: &str) -> String {
        self.image_template
            .replace("{src}", src)
            .replace("{alt}", &alt.replace('"', "&quot;"))
    }

    /// Whether `url` points at one of the expiring image hosts (or a subdomain).
    pub fn is_broken_host(&self, url: &str) -> bool {
        let Some(rest) = url.split_once("://").map(|(_, rest)| rest) else {
            return false;
        };
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = host.rsplit('@').next().unwrap_or(host);
        let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
        self.broken_image_hosts.iter().any(|h| {
            let h = h.to_ascii_lowercase();
            host == h || host.ends_with(&format!(".{}", h))
        })
    }

    pub fn is_wiki_app_link(&self, target: &str) -> bool {
        !self.wiki_app_prefix.is_empty() && target.trim().starts_with(&self.wiki_app_prefix)
    }
}

impl WikiTree {
    fn page_path(&self, leaf: Index) -> PathBuf {
        self.arena
            .get_node(leaf)
            .map(|n| n.data.output_path.clone())
            .unwrap_or_default()
    }

    /// Title of a leaf: its resolved name without the `.md` suffix.
    pub fn page_title(&self, leaf: Index) -> String {
        self.arena
            .get_node(leaf)
            .map(|n| {
                n.data
                    .name
                    .strip_suffix(".md")
                    .unwrap_or(&n.data.name)
                    .to_string()
            })
            .unwrap_or_default()
    }

    /// Rewrite every link of one line of `leaf`'s content.
    ///
    /// Non-link text is kept verbatim; unresolved references become the
    /// placeholder and are recorded as issues.
    pub fn fix_line(&mut self, line: &str, leaf: Index) -> String {
        let page = self.page_path(leaf);
        self.fix_text(line, leaf, &page, false)
    }

    /// `in_link` is set for the text of a link: images there are emitted as
    /// plain Markdown so the enclosing link survives.
    fn fix_text(&mut self, text: &str, leaf: Index, page: &Path, in_link: bool) -> String {
        let mut fixed = String::with_capacity(text.len());
        let mut last = 0;

        for link in find_links(text) {
            fixed.push_str(&text[last..link.start]);
            let original = &text[link.start..link.end];
            let replacement = if link.is_image {
                self.fix_image(&link, leaf, page, in_link)
            } else {
                self.fix_link(&link, leaf, page)
            };
            match replacement {
                Some(r) => {
                    trace!("{} -> {}", original, r);
                    fixed.push_str(&r);
                }
                None => fixed.push_str(original),
            }
            last = link.end;
        }
        fixed.push_str(&text[last..]);
        fixed
    }

    fn fix_image(
        &mut self,
        link: &LinkMatch<'_>,
        leaf: Index,
        page: &Path,
        in_link: bool,
    ) -> Option<String> {
        let target = link.target;
        let unresolved = format!("![{}]({})", link.text, self.options.placeholder);

        if is_web_url(target) {
            let issue = if self.options.is_broken_host(target) {
                Issue::PossiblyBrokenImage {
                    url: target.to_string(),
                    page: page.to_path_buf(),
                }
            } else {
                Issue::ExternalImage {
                    url: target.to_string(),
                    page: page.to_path_buf(),
                }
            };
            self.push_issue(issue);
            return None;
        }

        if !is_contained(target) {
            self.push_issue(Issue::ImageOutsideExport {
                image: target.to_string(),
                page: page.to_path_buf(),
            });
            return Some(unresolved);
        }

        let Some(owner) = self.image_map.get(target).map(|e| e.owner) else {
            self.push_issue(Issue::UnknownLocalImage {
                image: target.to_string(),
                page: page.to_path_buf(),
            });
            return Some(unresolved);
        };

        match self.arena.relative_path(owner, leaf, Direction::Ascend) {
            Some(up) => {
                let src = to_link(&up.join(bare_target(target)));
                if in_link {
                    Some(format!("![{}]({})", link.text, src))
                } else {
                    Some(self.options.render_image(&src, link.text))
                }
            }
            None => {
                self.push_issue(Issue::UnresolvedImagePath {
                    image: target.to_string(),
                    page: page.to_path_buf(),
                });
                Some(unresolved)
            }
        }
    }

    fn fix_link(&mut self, link: &LinkMatch<'_>, leaf: Index, page: &Path) -> Option<String> {
        let text = if link.text.contains("![") {
            self.fix_text(link.text, leaf, page, true)
        } else {
            link.text.to_string()
        };
        match self.fix_link_target(link.target, page) {
            Some(target) => Some(format!("[{}]({})", text, target)),
            None if text != link.text => Some(format!("[{}]({})", text, link.target)),
            None => None,
        }
    }

    /// New target of a plain link, or None to keep it.
    fn fix_link_target(&mut self, target: &str, page: &Path) -> Option<String> {
        if self.options.is_wiki_app_link(target) {
            self.push_issue(Issue::WikiAppLink {
                url: target.trim().to_string(),
                page: page.to_path_buf(),
            });
            return Some(self.options.placeholder.clone());
        }
        if is_web_url(target) {
            return None;
        }

        let entry = self.file_map.get(bare_target(target))?;
        let page_dir = page.parent().unwrap_or(Path::new(""));
        let relative = pathdiff::diff_paths(&entry.output_path, page_dir)?;
        Some(to_link(&relative))
    }

    /// Make sure the page starts with `# <title>`; returns whether a heading
    /// was inserted.
    pub fn pre_fix_lines(&self, lines: &mut Vec<String>, leaf: Index) -> bool {
        let heading = format!("# {}", self.page_title(leaf));
        let has_heading = lines
            .first()
            .is_some_and(|first| first.trim_end() == heading);
        if !has_heading {
            lines.insert(0, heading);
        }
        !has_heading
    }

    /// Full rewrite of a leaf page: heading check, then every line fixed.
    pub fn fix_lines(&mut self, content: &str, leaf: Index) -> String {
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        let skip = usize::from(self.pre_fix_lines(&mut lines, leaf));

        let mut fixed: Vec<String> = lines[..skip].to_vec();
        for line in &lines[skip..] {
            fixed.push(self.fix_line(line, leaf));
        }
        let mut text = fixed.join("\n");
        text.push('\n');
        text
    }
}
