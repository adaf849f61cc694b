//! Recoverable problems collected during a run.

use std::fmt;
use std::path::PathBuf;

/// Fixed report line when the output root has no landing page.
pub const MISSING_HOME_PAGE: &str = "There is no index.md file in the root!";

/// A human-readable diagnostic; never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A referenced page could not be read
    UnreadablePage { identifier: String, reason: String },
    /// Image is known but no path leads from its owner to the page
    UnresolvedImagePath { image: String, page: PathBuf },
    /// Local image that no parsed page introduced
    UnknownLocalImage { image: String, page: PathBuf },
    /// Local image that is absolute or climbs out with `..`
    ImageOutsideExport { image: String, page: PathBuf },
    /// External image on a host known to expire links
    PossiblyBrokenImage { url: String, page: PathBuf },
    /// Any other external image; kept as is
    ExternalImage { url: String, page: PathBuf },
    /// Link into the hosted wiki app, cannot be mapped to a page
    WikiAppLink { url: String, page: PathBuf },
    /// Image reference could not be copied to the output tree
    ImageCopyFailed { image: String, reason: String },
    /// Page could not be written to the output tree
    PageWriteFailed { page: PathBuf, reason: String },
    MissingHomePage,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::UnreadablePage { identifier, reason } => {
                write!(f, "Could not read page '{}': {}", identifier, reason)
            }
            Issue::UnresolvedImagePath { image, page } => write!(
                f,
                "No relative path to image '{}' from {}",
                image,
                page.display()
            ),
            Issue::UnknownLocalImage { image, page } => {
                write!(f, "Unknown local image '{}' in {}", image, page.display())
            }
            Issue::ImageOutsideExport { image, page } => write!(
                f,
                "Image '{}' in {} points outside the export, not copied",
                image,
                page.display()
            ),
            Issue::PossiblyBrokenImage { url, page } => write!(
                f,
                "Possibly broken image (expiring host) '{}' in {}",
                url,
                page.display()
            ),
            Issue::ExternalImage { url, page } => write!(
                f,
                "External image '{}' in {}, check it still loads",
                url,
                page.display()
            ),
            Issue::WikiAppLink { url, page } => write!(
                f,
                "Wiki app link '{}' in {} needs a manual fix",
                url,
                page.display()
            ),
            Issue::ImageCopyFailed { image, reason } => {
                write!(f, "Could not copy image '{}': {}", image, reason)
            }
            Issue::PageWriteFailed { page, reason } => {
                write!(f, "Could not write {}: {}", page.display(), reason)
            }
            Issue::MissingHomePage => f.write_str(MISSING_HOME_PAGE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_home_page_message_is_fixed() {
        assert_eq!(
            Issue::MissingHomePage.to_string(),
            "There is no index.md file in the root!"
        );
    }

    #[test]
    fn test_messages_name_the_reference() {
        let issue = Issue::UnknownLocalImage {
            image: "pic.png".into(),
            page: PathBuf::from("docs/a.md"),
        };
        let msg = issue.to_string();
        assert!(msg.contains("pic.png"));
        assert!(msg.contains("docs/a.md"));
    }
}
