use canonfile_core::{ContentHash, HashAlgorithm, MediaType, OrganizeConfig};
use canonfile_organize::{ItemOutcome, Organizer, OrganizeReport};
use canonfile_scan::{CaptureTimeReader, Fingerprinter, TypeSniffer, normalized_extension};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Treats `.jpg` as JPEG and `.mov` as video, everything else as not media.
struct ExtensionSniffer;

impl TypeSniffer for ExtensionSniffer {
    fn sniff(&self, path: &Path) -> Option<MediaType> {
        match normalized_extension(path)?.as_str() {
            "jpg" | "jpeg" => Some(MediaType::image("jpeg")),
            "mov" => Some(MediaType::video("mov")),
            _ => None,
        }
    }
}

/// Like [`ExtensionSniffer`], but panics on `boom.jpg`.
struct PanickingSniffer;

impl TypeSniffer for PanickingSniffer {
    fn sniff(&self, path: &Path) -> Option<MediaType> {
        if path.ends_with("boom.jpg") {
            panic!("corrupt header");
        }
        ExtensionSniffer.sniff(path)
    }
}

/// Reports the same capture time (or none) for every file.
struct FixedClock(Option<NaiveDateTime>);

impl CaptureTimeReader for FixedClock {
    fn capture_time(&self, _path: &Path) -> Option<NaiveDateTime> {
        self.0
    }
}

struct Tree {
    _temp: TempDir,
    src: PathBuf,
    dst: PathBuf,
}

fn tree(files: &[(&str, &str)]) -> Tree {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("inbox");
    let dst = temp.path().join("library");
    fs::create_dir_all(&src).unwrap();
    for (name, contents) in files {
        let path = src.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    Tree {
        _temp: temp,
        src,
        dst,
    }
}

fn config(tree: &Tree) -> OrganizeConfig {
    OrganizeConfig::builder()
        .source(&tree.src)
        .destination(&tree.dst)
        .dry_run(false)
        .shuffle_seed(7u64)
        .build()
        .unwrap()
}

fn run(config: OrganizeConfig, clock: Option<NaiveDateTime>) -> OrganizeReport {
    Organizer::with_probes(config, ExtensionSniffer, FixedClock(clock))
        .run()
        .unwrap()
}

fn digest(contents: &[u8]) -> ContentHash {
    Fingerprinter::new(HashAlgorithm::Sha256).digest_bytes(contents)
}

/// Every regular file below `root`, relative to it, sorted.
fn listing(root: &Path) -> Vec<PathBuf> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                out.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

fn may_10_1432() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 5, 10)
        .unwrap()
        .and_hms_opt(14, 32, 0)
        .unwrap()
}

#[test]
fn test_undated_file_goes_to_anarchs() {
    let contents = "Z".repeat(500);
    let t = tree(&[("IMG_0001.jpg", contents.as_str())]);

    let report = run(config(&t), None);

    let expected = PathBuf::from("Anarchs").join(format!(
        "{}.jpeg",
        digest(contents.as_bytes()).prefix_hex(8)
    ));
    assert_eq!(listing(&t.dst), vec![expected]);
    assert!(listing(&t.src).is_empty());
    assert_eq!(report.counts.placed, 1);
    assert!(report.is_success());
}

#[test]
fn test_dated_file_goes_to_month_bucket() {
    let contents = "sunset over the bay";
    let t = tree(&[("DSC_1234.jpg", contents)]);

    run(config(&t), Some(may_10_1432()));

    let expected = PathBuf::from("2023May").join(format!(
        "10_1432_{}.jpeg",
        digest(contents.as_bytes()).prefix_hex(4)
    ));
    assert_eq!(listing(&t.dst), vec![expected]);
}

#[test]
fn test_undated_video_goes_to_videos() {
    let t = tree(&[("clip.MOV", "moov")]);

    run(config(&t), None);

    let files = listing(&t.dst);
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("Videos"));
    assert_eq!(files[0].extension().unwrap(), "mov");
}

#[test]
fn test_identical_files_collapse_to_one() {
    let t = tree(&[
        ("a.jpg", "same bytes"),
        ("nested/b.jpg", "same bytes"),
        ("nested/deeper/c.jpg", "same bytes"),
    ]);
    let mut cfg = config(&t);
    cfg.delete_duplicates = true;
    cfg.workers = 3;

    let report = run(cfg, None);

    assert_eq!(listing(&t.dst).len(), 1);
    assert!(listing(&t.src).is_empty());
    assert_eq!(report.counts.placed, 1);
    assert_eq!(report.counts.duplicates, 2);
    assert_eq!(report.counts.removed, 2);
}

#[test]
fn test_duplicates_kept_without_deletion() {
    let t = tree(&[("a.jpg", "same bytes"), ("b.jpg", "same bytes")]);

    let report = run(config(&t), None);

    assert_eq!(listing(&t.dst).len(), 1);
    assert_eq!(listing(&t.src).len(), 1);
    assert_eq!(report.counts.duplicates, 1);
    assert_eq!(report.counts.removed, 0);
}

#[test]
fn test_dry_run_mutates_nothing() {
    let t = tree(&[
        ("a.jpg", "one"),
        ("b.jpg", "two"),
        ("c.jpg", "two"),
        ("notes.txt", "not media"),
    ]);
    let before = listing(&t.src);
    let mut cfg = config(&t);
    cfg.dry_run = true;
    cfg.delete_duplicates = true;

    let report = run(cfg, Some(may_10_1432()));

    assert_eq!(listing(&t.src), before);
    assert!(!t.dst.exists());
    assert!(report.dry_run);
    assert_eq!(report.counts.skipped, 1);
    assert_eq!(report.counts.removed, 0);
    assert_eq!(report.items.len(), 4);
}

#[test]
fn test_copy_mode_keeps_sources() {
    let t = tree(&[("a.jpg", "one"), ("b.jpg", "two")]);
    let mut cfg = config(&t);
    cfg.copy = true;

    let report = run(cfg, None);

    assert_eq!(listing(&t.src).len(), 2);
    assert_eq!(listing(&t.dst).len(), 2);
    assert_eq!(report.counts.placed, 2);
}

#[test]
fn test_non_media_is_skipped() {
    let t = tree(&[("README.txt", "hello"), ("a.jpg", "img")]);

    let report = run(config(&t), None);

    assert_eq!(report.counts.skipped, 1);
    assert!(t.src.join("README.txt").exists());
    let skipped = report
        .items
        .iter()
        .find(|item| item.source.ends_with("README.txt"))
        .unwrap();
    assert!(matches!(skipped.outcome, ItemOutcome::Skipped { .. }));
}

#[test]
fn test_many_workers_one_bucket() {
    let mut owned = Vec::new();
    for i in 0..40 {
        let contents = format!("photo number {i}");
        owned.push((format!("first/{i:02}.jpg"), contents.clone()));
        owned.push((format!("second/{i:02}.jpg"), contents));
    }
    let files: Vec<(&str, &str)> = owned
        .iter()
        .map(|(name, contents)| (name.as_str(), contents.as_str()))
        .collect();
    let t = tree(&files);
    let mut cfg = config(&t);
    cfg.workers = 8;
    cfg.delete_duplicates = true;
    cfg.shuffle_seed = None;

    let report = run(cfg, None);

    assert_eq!(listing(&t.dst).len(), 40);
    assert!(listing(&t.src).is_empty());
    assert_eq!(report.counts.placed, 40);
    assert_eq!(report.counts.duplicates, 40);
    assert!(report.is_success());
}

#[test]
fn test_rerun_over_organized_tree_is_a_no_op() {
    let t = tree(&[("a.jpg", "one"), ("b.jpg", "two")]);
    run(config(&t), None);
    let organized = listing(&t.dst);

    let mut cfg = config(&t);
    cfg.source = t.dst.clone();
    cfg.delete_duplicates = true;
    let report = run(cfg, None);

    assert_eq!(listing(&t.dst), organized);
    assert_eq!(report.counts.already_in_place, 2);
    assert_eq!(report.counts.removed, 0);
}

#[test]
fn test_unwritable_destination_aborts_batch() {
    let t = tree(&[("a.jpg", "one"), ("b.jpg", "two"), ("c.jpg", "three")]);
    fs::write(&t.dst, "a file, not a directory").unwrap();
    let mut cfg = config(&t);
    cfg.workers = 1;

    let report = run(cfg, None);

    assert!(report.aborted);
    assert!(!report.is_success());
    assert_eq!(report.counts.failed, 1);
    assert_eq!(report.unprocessed, 2);
    assert_eq!(listing(&t.src).len(), 3);
}

#[test]
fn test_worker_panic_is_recorded_against_its_file() {
    let t = tree(&[("a.jpg", "one"), ("boom.jpg", "two"), ("c.jpg", "three")]);
    let mut cfg = config(&t);
    cfg.workers = 1;

    let report = Organizer::with_probes(cfg, PanickingSniffer, FixedClock(None))
        .run()
        .unwrap();

    assert!(report.aborted);
    assert_eq!(report.counts.failed, 1);
    assert!(report.failures[0].path.ends_with("boom.jpg"));
    assert!(report.failures[0].message.contains("corrupt header"));
    assert_eq!(
        report.items.len() + report.counts.failed + report.unprocessed,
        report.files_found
    );
    assert_eq!(report.counts.placed, report.items.len());
}

#[test]
fn test_fail_fast_stops_after_first_failure() {
    let t = tree(&[("a.jpg", "one"), ("b.jpg", "two")]);
    fs::write(&t.dst, b"blocker").unwrap();
    let mut cfg = config(&t);
    cfg.workers = 1;
    cfg.fail_fast = true;

    let report = run(cfg, None);

    assert!(report.aborted);
    assert_eq!(report.counts.failed + report.unprocessed, 2);
}

#[test]
fn test_progress_is_broadcast() {
    let t = tree(&[("a.jpg", "one"), ("b.jpg", "two"), ("c.txt", "three")]);
    let organizer = Organizer::with_probes(config(&t), ExtensionSniffer, FixedClock(None));
    let mut rx = organizer.subscribe();

    let report = organizer.run().unwrap();

    let mut last = None;
    while let Ok(snapshot) = rx.try_recv() {
        last = Some(snapshot);
    }
    let last = last.unwrap();
    assert_eq!(last.files_completed, report.files_found);
    assert_eq!(last.files_total, 3);
    assert_eq!(last.percentage(), 100.0);
}

#[test]
fn test_missing_source_is_an_error() {
    let temp = TempDir::new().unwrap();
    let cfg = OrganizeConfig::new(temp.path().join("nope"), temp.path().join("dst"));

    assert!(
        Organizer::with_probes(cfg, ExtensionSniffer, FixedClock(None))
            .run()
            .is_err()
    );
}
