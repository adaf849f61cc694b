//! Tests for ConvertService against real temp directories
//!
//! Export layout used by most tests:
//! - `index.md` lists `Guide 01.md` (an index) and `index 02.md` (home page)
//! - `Guide 01.md` lists `setup 1a.md` twice plus `Usage 03.md`
//! - both leaves under Guide use `diagram.png`
//!
//! Identifiers are `<label> <id>.md`; only the last token is the id, so
//! `setup 1a.md` is named `setup` (a literal `Guide setup.md` would be named
//! `Guide`).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use wiki2docs::application::services::ConvertService;
use wiki2docs::application::ApplicationError;
use wiki2docs::domain::{DomainError, Issue, RewriteOptions};
use wiki2docs::infrastructure::traits::RealFileSystem;
use wiki2docs::util::testing;

fn service() -> ConvertService {
    ConvertService::new(
        Arc::new(RealFileSystem),
        RewriteOptions::default(),
        "index.md".to_string(),
    )
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[fixture]
fn export() -> TempDir {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("export");
    fs::create_dir_all(&src).unwrap();

    write(
        &src,
        "index.md",
        "- [Guide](<Guide 01.md?n>)\n- [Home](<index 02.md?n>)\n",
    );
    write(
        &src,
        "Guide 01.md",
        "- [setup](<setup 1a.md?n>)\n- [setup](<setup 1a.md?n>)\n- [Usage](<Usage 03.md?n>)\n",
    );
    write(
        &src,
        "setup 1a.md",
        "Intro text\n![diagram](diagram.png)\nSee [usage](<Usage 03.md?n>)\n",
    );
    write(
        &src,
        "Usage 03.md",
        "# Usage\n![diagram](diagram.png)\n[app](https://app.nuclino.com/ws/item)\n",
    );
    write(&src, "index 02.md", "# index\nWelcome\n");
    fs::write(src.join("diagram.png"), [0x89, b'P', b'N', b'G']).unwrap();
    temp
}

fn paths(temp: &TempDir) -> (PathBuf, PathBuf) {
    (temp.path().join("export"), temp.path().join("docs"))
}

// ============================================================
// full conversion
// ============================================================

#[rstest]
fn given_export_when_convert_then_builds_directory_tree(export: TempDir) {
    let (src, out) = paths(&export);

    let (tree, summary) = service().convert(&src, Some(out.clone()), "index.md").unwrap();

    assert!(out.join("Guide").is_dir());
    assert!(out.join("Guide/setup.md").is_file());
    assert!(out.join("Guide/setup_1.md").is_file());
    assert!(out.join("Guide/Usage.md").is_file());
    assert!(out.join("index.md").is_file());
    assert_eq!(summary.directories, 2);
    assert_eq!(summary.pages, 4);
    assert_eq!(summary.images, 1);
    assert_eq!(tree.output_root(), Some(out.as_path()));
}

#[rstest]
fn given_page_without_heading_when_convert_then_heading_inserted_and_links_fixed(
    export: TempDir,
) {
    let (src, out) = paths(&export);

    service().convert(&src, Some(out.clone()), "index.md").unwrap();

    let setup = fs::read_to_string(out.join("Guide/setup.md")).unwrap();
    assert_eq!(
        setup,
        "# setup\n\
         Intro text\n\
         <p align=\"center\"><img src=\"diagram.png\" alt=\"diagram\"></p>\n\
         See [usage](Usage.md)\n"
    );
}

#[rstest]
fn given_page_with_heading_when_convert_then_not_duplicated(export: TempDir) {
    let (src, out) = paths(&export);

    service().convert(&src, Some(out.clone()), "index.md").unwrap();

    let usage = fs::read_to_string(out.join("Guide/Usage.md")).unwrap();
    assert_eq!(usage.matches("# Usage").count(), 1);
    assert!(usage.starts_with("# Usage\n"));
    assert!(usage.contains("[app](#unresolved)"));
}

#[rstest]
fn given_shared_image_when_convert_then_copied_next_to_common_index(export: TempDir) {
    let (src, out) = paths(&export);

    service().convert(&src, Some(out.clone()), "index.md").unwrap();

    let copied = fs::read(out.join("Guide/diagram.png")).unwrap();
    assert_eq!(copied, vec![0x89, b'P', b'N', b'G']);
    assert!(!out.join("diagram.png").exists());
}

#[rstest]
fn given_duplicate_page_when_convert_then_second_copy_rewritten(export: TempDir) {
    let (src, out) = paths(&export);

    service().convert(&src, Some(out.clone()), "index.md").unwrap();

    let second = fs::read_to_string(out.join("Guide/setup_1.md")).unwrap();
    assert_eq!(
        second,
        "# setup_1\n\
         Intro text\n\
         <p align=\"center\"><img src=\"diagram.png\" alt=\"diagram\"></p>\n\
         See [usage](Usage.md)\n"
    );
}

#[rstest]
fn given_image_only_in_second_same_named_page_when_convert_then_resolved_next_to_it(
    export: TempDir,
) {
    let (src, out) = paths(&export);
    write(
        &src,
        "Guide 01.md",
        "- [setup](<setup 1a.md?n>)\n- [setup](<setup 2b.md?n>)\n- [Usage](<Usage 03.md?n>)\n",
    );
    write(&src, "setup 2b.md", "Second\n![pic](pic.png)\n");
    fs::write(src.join("pic.png"), b"PIC").unwrap();

    let (tree, _) = service().convert(&src, Some(out.clone()), "index.md").unwrap();

    let second = fs::read_to_string(out.join("Guide/setup_1.md")).unwrap();
    assert_eq!(
        second,
        "# setup_1\nSecond\n<p align=\"center\"><img src=\"pic.png\" alt=\"pic\"></p>\n"
    );
    assert_eq!(fs::read(out.join("Guide/pic.png")).unwrap(), b"PIC");
    let first = fs::read_to_string(out.join("Guide/setup.md")).unwrap();
    assert!(!first.contains("pic.png"));
    assert_eq!(tree.issues().len(), 1, "issues: {:?}", tree.issues());
}

#[rstest]
fn given_image_only_below_second_same_named_index_when_convert_then_copied_into_it(
    export: TempDir,
) {
    let (src, out) = paths(&export);
    write(
        &src,
        "Guide 01.md",
        "- [setup](<setup 1a.md?n>)\n- [setup](<setup 2b.md?n>)\n",
    );
    write(&src, "setup 2b.md", "- [Step](<Step 4c.md?n>)\n");
    write(&src, "Step 4c.md", "![pic](pic.png)\n");
    fs::write(src.join("pic.png"), b"PIC").unwrap();

    service().convert(&src, Some(out.clone()), "index.md").unwrap();

    assert!(out.join("Guide/setup.md").is_file());
    assert!(out.join("Guide/setup_1").is_dir());
    let step = fs::read_to_string(out.join("Guide/setup_1/Step.md")).unwrap();
    assert_eq!(
        step,
        "# Step\n<p align=\"center\"><img src=\"pic.png\" alt=\"pic\"></p>\n"
    );
    assert_eq!(fs::read(out.join("Guide/setup_1/pic.png")).unwrap(), b"PIC");
    assert!(!out.join("Guide/pic.png").exists());
}

#[rstest]
fn given_home_page_linking_into_subdirectory_when_convert_then_link_descends(export: TempDir) {
    let (src, out) = paths(&export);
    write(
        &src,
        "index 02.md",
        "# index\nStart with [usage](<Usage 03.md?n>) or [setup](<setup 1a.md?n>)\n",
    );

    service().convert(&src, Some(out.clone()), "index.md").unwrap();

    let home = fs::read_to_string(out.join("index.md")).unwrap();
    assert_eq!(
        home,
        "# index\nStart with [usage](Guide/Usage.md) or [setup](Guide/setup.md)\n"
    );
}

#[rstest]
fn given_wiki_app_link_when_convert_then_single_issue(export: TempDir) {
    let (src, out) = paths(&export);

    let (tree, _) = service().convert(&src, Some(out), "index.md").unwrap();

    assert_eq!(tree.issues().len(), 1, "issues: {:?}", tree.issues());
    assert!(matches!(
        &tree.issues()[0],
        Issue::WikiAppLink { url, .. } if url == "https://app.nuclino.com/ws/item"
    ));
}

// ============================================================
// recoverable problems
// ============================================================

#[rstest]
fn given_no_home_page_when_convert_then_reports_missing_index(export: TempDir) {
    let (src, out) = paths(&export);
    write(&src, "index.md", "- [Guide](<Guide 01.md?n>)\n");

    let (tree, _) = service().convert(&src, Some(out), "index.md").unwrap();

    let messages: Vec<String> = tree.issues().iter().map(|i| i.to_string()).collect();
    assert!(messages.contains(&"There is no index.md file in the root!".to_string()));
}

#[rstest]
fn given_stale_home_page_in_output_when_convert_then_still_reports_missing(export: TempDir) {
    let (src, out) = paths(&export);
    write(&src, "index.md", "- [Guide](<Guide 01.md?n>)\n");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("index.md"), "stale").unwrap();

    let (tree, _) = service().convert(&src, Some(out), "index.md").unwrap();

    assert!(tree.issues().contains(&Issue::MissingHomePage));
}

#[rstest]
#[case::absolute(true)]
#[case::parent_dir(false)]
fn given_image_outside_export_when_convert_then_left_alone_and_reported(
    export: TempDir,
    #[case] absolute: bool,
) {
    let (src, out) = paths(&export);
    let outside = export.path().join("precious.png");
    fs::write(&outside, b"PRECIOUS-BYTES").unwrap();
    let reference = if absolute {
        outside.display().to_string()
    } else {
        "../precious.png".to_string()
    };
    write(&src, "setup 1a.md", &format!("Intro\n![x]({})\n", reference));

    let (tree, _) = service().convert(&src, Some(out.clone()), "index.md").unwrap();

    assert_eq!(fs::read(&outside).unwrap(), b"PRECIOUS-BYTES");
    assert!(!out.join("precious.png").exists());
    assert!(!out.join("Guide/precious.png").exists());
    let setup = fs::read_to_string(out.join("Guide/setup.md")).unwrap();
    assert_eq!(setup, "# setup\nIntro\n![x](#unresolved)\n");
    assert!(tree.issues().iter().any(
        |i| matches!(i, Issue::ImageOutsideExport { image, .. } if *image == reference)
    ));
}

#[rstest]
fn given_child_reference_outside_export_when_convert_then_not_read(export: TempDir) {
    let (src, out) = paths(&export);
    fs::write(export.path().join("Secret 09.md"), "# secret\n").unwrap();
    write(
        &src,
        "index.md",
        "- [Guide](<Guide 01.md?n>)\n- [Home](<index 02.md?n>)\n- [Secret](<../Secret 09.md?n>)\n",
    );

    let (tree, summary) = service().convert(&src, Some(out.clone()), "index.md").unwrap();

    assert!(!out.join("Secret.md").exists());
    assert_eq!(summary.pages, 4);
    assert!(tree.issues().iter().any(
        |i| matches!(i, Issue::UnreadablePage { identifier, .. } if identifier == "../Secret 09.md")
    ));
}

#[rstest]
fn given_unreadable_child_when_convert_then_issue_and_rest_written(export: TempDir) {
    let (src, out) = paths(&export);
    fs::remove_file(src.join("Usage 03.md")).unwrap();

    let (tree, summary) = service().convert(&src, Some(out.clone()), "index.md").unwrap();

    assert!(tree
        .issues()
        .iter()
        .any(|i| matches!(i, Issue::UnreadablePage { identifier, .. } if identifier == "Usage 03.md")));
    assert!(!out.join("Guide/Usage.md").exists());
    assert!(out.join("Guide/setup.md").is_file());
    assert_eq!(summary.pages, 3);
}

#[rstest]
fn given_missing_image_file_when_convert_then_copy_failure_reported(export: TempDir) {
    let (src, out) = paths(&export);
    fs::remove_file(src.join("diagram.png")).unwrap();

    let (tree, summary) = service().convert(&src, Some(out), "index.md").unwrap();

    assert_eq!(summary.images, 0);
    assert!(tree
        .issues()
        .iter()
        .any(|i| matches!(i, Issue::ImageCopyFailed { image, .. } if image == "diagram.png")));
}

#[rstest]
fn given_expiring_image_host_when_convert_then_kept_and_reported(export: TempDir) {
    let (src, out) = paths(&export);
    write(
        &src,
        "index 02.md",
        "# index\n![shot](https://files.nuclino.com/abc/shot.png)\n",
    );

    let (tree, _) = service().convert(&src, Some(out.clone()), "index.md").unwrap();

    let home = fs::read_to_string(out.join("index.md")).unwrap();
    assert!(home.contains("![shot](https://files.nuclino.com/abc/shot.png)"));
    assert!(tree
        .issues()
        .iter()
        .any(|i| matches!(i, Issue::PossiblyBrokenImage { .. })));
}

// ============================================================
// fatal errors
// ============================================================

#[rstest]
fn given_root_without_bullets_when_convert_then_fails(export: TempDir) {
    let (src, out) = paths(&export);
    write(&src, "index.md", "# Home\nJust text\n");

    let err = service().convert(&src, Some(out.clone()), "index.md").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::RootNotIndex(_))
    ));
    assert!(!out.exists());
}

#[rstest]
fn given_missing_start_file_when_convert_then_fails(export: TempDir) {
    let (src, out) = paths(&export);

    let err = service().convert(&src, Some(out), "start.md").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::RootUnreadable { .. })
    ));
}

#[test]
fn given_missing_input_dir_when_convert_then_input_not_found() {
    let temp = TempDir::new().unwrap();

    let err = service()
        .convert(&temp.path().join("nope"), None, "index.md")
        .unwrap_err();

    assert!(matches!(err, ApplicationError::InputNotFound(_)));
}

// ============================================================
// dry run
// ============================================================

#[rstest]
fn given_dry_run_when_convert_then_nothing_written(export: TempDir) {
    let (src, out) = paths(&export);

    let (tree, summary) = service().convert(&src, None, "index.md").unwrap();

    assert!(!out.exists());
    assert!(tree.is_dry_run());
    assert_eq!(summary.pages, 4);
    assert_eq!(summary.images, 0);
    assert_eq!(
        tree.arena().leaf_paths(),
        vec![
            PathBuf::from("Guide/setup.md"),
            PathBuf::from("Guide/setup_1.md"),
            PathBuf::from("Guide/Usage.md"),
            PathBuf::from("index.md"),
        ]
    );
    // home page is planned, so only the app link is reported
    assert_eq!(tree.issues().len(), 1);
}
