use canonfile_analyze::{ApproximateMatcher, Candidate, MatchConfig, match_ratio};
use canonfile_core::HashAlgorithm;
use canonfile_scan::Fingerprinter;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BLOCK: usize = 16;

/// `count` blocks where block `k` is filled with byte `k`.
fn content(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|k| std::iter::repeat_n(k as u8, BLOCK))
        .collect()
}

/// Copy of `base` with the first `changed` blocks overwritten.
fn altered(base: &[u8], changed: usize) -> Vec<u8> {
    let mut out = base.to_vec();
    for byte in &mut out[..changed * BLOCK] {
        *byte = 0xEE;
    }
    out
}

fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn config(root: &Path) -> MatchConfig {
    MatchConfig::builder()
        .root(root)
        .block_size(BLOCK)
        .build()
        .unwrap()
}

#[test]
fn test_identical_videos_match_and_earlier_is_deleted() {
    let temp = TempDir::new().unwrap();
    let data = content(100);
    let a = write(temp.path(), "a.mp4", &data);
    let b = write(temp.path(), "b.mp4", &data);

    let mut cfg = config(temp.path());
    cfg.delete_duplicates = true;
    let report = ApproximateMatcher::new(cfg).run().unwrap();

    assert_eq!(report.pairs.len(), 1);
    let pair = &report.pairs[0];
    assert_eq!(pair.ratio, 100.0);
    assert!(pair.earlier.ends_with("a.mp4"));
    assert!(pair.later.ends_with("b.mp4"));
    assert!(pair.deleted);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.potential_savings, data.len() as u64);
    assert!(!a.exists());
    assert!(b.exists());
}

#[test]
fn test_ninety_percent_is_not_a_match() {
    let temp = TempDir::new().unwrap();
    let data = content(100);
    let a = write(temp.path(), "a.mov", &data);
    let b = write(temp.path(), "b.mov", &altered(&data, 10));

    let mut cfg = config(temp.path());
    cfg.delete_duplicates = true;
    let report = ApproximateMatcher::new(cfg).run().unwrap();

    assert!(!report.has_matches());
    assert_eq!(report.near_misses.len(), 1);
    assert_eq!(report.near_misses[0].ratio, 90.0);
    assert_eq!(report.deleted, 0);
    assert_eq!(report.potential_savings, 0);
    assert!(a.exists() && b.exists());
}

#[test]
fn test_exactly_threshold_matches() {
    let temp = TempDir::new().unwrap();
    let data = content(20);
    write(temp.path(), "a.mp4", &data);
    write(temp.path(), "b.mp4", &altered(&data, 1));

    let report = ApproximateMatcher::new(config(temp.path())).run().unwrap();

    assert_eq!(report.pairs.len(), 1);
    assert_eq!(report.pairs[0].ratio, 95.0);
    assert!(!report.pairs[0].deleted);
}

#[test]
fn test_just_below_threshold_does_not_match() {
    let temp = TempDir::new().unwrap();
    let data = vec![7u8; 10_000];
    let mut other = data.clone();
    for byte in &mut other[..501] {
        *byte = 8;
    }
    write(temp.path(), "a.mp4", &data);
    write(temp.path(), "b.mp4", &other);

    let mut cfg = config(temp.path());
    cfg.block_size = 1;
    let report = ApproximateMatcher::new(cfg).run().unwrap();

    assert!(!report.has_matches());
    assert_eq!(report.near_misses[0].ratio, 94.99);
}

#[test]
fn test_greedy_pairing() {
    let temp = TempDir::new().unwrap();
    let data = content(8);
    let a = write(temp.path(), "a.mp4", &data);
    let b = write(temp.path(), "b.mp4", &data);
    let c = write(temp.path(), "c.mp4", &data);

    let mut cfg = config(temp.path());
    cfg.delete_duplicates = true;
    let report = ApproximateMatcher::new(cfg).run().unwrap();

    // a pairs with b only; b then pairs with c.
    assert_eq!(report.pairs.len(), 2);
    assert!(report.pairs[0].earlier.ends_with("a.mp4"));
    assert!(report.pairs[0].later.ends_with("b.mp4"));
    assert!(report.pairs[1].earlier.ends_with("b.mp4"));
    assert!(report.pairs[1].later.ends_with("c.mp4"));
    assert_eq!(report.potential_savings, 2 * data.len() as u64);
    assert!(!a.exists() && !b.exists() && c.exists());
}

#[test]
fn test_pairs_follow_discovery_order_across_sizes() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.mp4", b"xyz");
    write(temp.path(), "b.mp4", b"pq");
    write(temp.path(), "c.mp4", b"pq");
    write(temp.path(), "d.mp4", b"xyz");
    write(temp.path(), "e.mp4", b"xyz");

    let mut cfg = config(temp.path());
    cfg.block_size = 1;
    let report = ApproximateMatcher::new(cfg).run().unwrap();

    let order: Vec<(String, String)> = report
        .pairs
        .iter()
        .map(|pair| {
            (
                pair.earlier.file_name().unwrap().to_string_lossy().into_owned(),
                pair.later.file_name().unwrap().to_string_lossy().into_owned(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            ("a.mp4".to_string(), "d.mp4".to_string()),
            ("b.mp4".to_string(), "c.mp4".to_string()),
            ("d.mp4".to_string(), "e.mp4".to_string()),
        ]
    );
}

#[test]
fn test_only_equal_sizes_are_compared() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.mp4", &content(3));
    write(temp.path(), "b.mp4", &content(4));
    write(temp.path(), "c.mp4", &content(5));

    let report = ApproximateMatcher::new(config(temp.path())).run().unwrap();

    assert_eq!(report.files_analyzed, 3);
    assert_eq!(report.files_fingerprinted, 0);
    assert!(report.near_misses.is_empty());
}

#[test]
fn test_block_digests_computed_once_per_file() {
    let temp = TempDir::new().unwrap();
    let data = content(10);
    write(temp.path(), "a.mp4", &data);
    write(temp.path(), "b.mp4", &altered(&data, 5));
    write(temp.path(), "c.mp4", &altered(&data, 7));

    let report = ApproximateMatcher::new(config(temp.path())).run().unwrap();

    assert_eq!(report.near_misses.len(), 3);
    assert_eq!(report.files_fingerprinted, 3);
}

#[test]
fn test_empty_files_never_match() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.mp4", b"");
    write(temp.path(), "b.mp4", b"");

    let report = ApproximateMatcher::new(config(temp.path())).run().unwrap();

    assert!(!report.has_matches());
    assert_eq!(report.near_misses.len(), 1);
    assert_eq!(report.near_misses[0].ratio, 0.0);
}

#[test]
fn test_unreadable_candidate_is_reported_and_skipped() {
    let temp = TempDir::new().unwrap();
    let data = content(4);
    let a = write(temp.path(), "a.mp4", &data);
    let b = write(temp.path(), "b.mp4", &data);
    let size = data.len() as u64;

    let matcher = ApproximateMatcher::new(config(temp.path()));
    let report = matcher.find_matches(vec![
        Candidate::new(temp.path().join("gone.mp4"), size),
        Candidate::new(&a, size),
        Candidate::new(&b, size),
    ]);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].path.ends_with("gone.mp4"));
    assert_eq!(report.pairs.len(), 1);
    assert_eq!(report.pairs[0].earlier, a);
}

#[test]
fn test_ratio_laws_on_real_files() {
    let temp = TempDir::new().unwrap();
    let data = content(12);
    let a = write(temp.path(), "a.bin", &data);
    let b = write(temp.path(), "b.bin", &altered(&data, 3));
    let short = write(temp.path(), "c.bin", &content(11));

    for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
        let fp = Fingerprinter::new(algorithm).with_block_size(BLOCK);
        let da = fp.block_digests(&a).unwrap();
        let db = fp.block_digests(&b).unwrap();
        let dc = fp.block_digests(&short).unwrap();

        assert_eq!(match_ratio(&da, &da), 100.0);
        assert_eq!(match_ratio(&da, &db), 75.0);
        assert_eq!(match_ratio(&da, &db), match_ratio(&db, &da));
        assert_eq!(match_ratio(&da, &dc), 0.0);
    }
}

#[test]
fn test_missing_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = ApproximateMatcher::new(config(&temp.path().join("missing"))).run();
    assert!(result.is_err());
}
