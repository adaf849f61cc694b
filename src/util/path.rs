use std::path::{Component, Path};

/// Render a relative path as a Markdown link target (always `/`-separated).
pub fn to_link(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::CurDir => None,
            Component::ParentDir => Some("..".to_string()),
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect();
    normalize_path_separator(&parts.join("/"))
}

/// Expand `~` and `$VAR` in a user supplied path.
pub fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

// Helper function for cross-platform path comparison
pub fn normalize_path_separator(s: &str) -> String {
    s.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_to_link_uses_forward_slashes() {
        assert_eq!(to_link(&PathBuf::from("..").join("..").join("a.png")), "../../a.png");
        assert_eq!(to_link(Path::new("./dir/a b.md")), "dir/a b.md");
        assert_eq!(to_link(Path::new("")), "");
    }

    #[test]
    fn test_expand_path_keeps_plain_paths() {
        assert_eq!(expand_path("docs/out"), "docs/out");
    }
}
