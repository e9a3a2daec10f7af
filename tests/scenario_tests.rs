//! End-to-end scenarios: a directory on disk, the finder, the report.

use dupfind::duplicates::{DuplicateFinder, GroupCollection};
use dupfind::output::{write_text_report, Report};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn scan(dir: &TempDir) -> GroupCollection {
    let finder = DuplicateFinder::with_defaults();
    let (files, _) = finder.enumerate(dir.path()).unwrap();

    let (staged, _) = finder.find_duplicates_from_files(files.clone()).unwrap();
    let (reference, _) = finder.find_duplicates_baseline(files).unwrap();
    assert_eq!(staged, reference, "staged and reference groupers disagree");

    staged
}

fn render(groups: &GroupCollection) -> String {
    let mut out = Vec::new();
    write_text_report(groups, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_two_identical_one_different() {
    let dir = tempdir().unwrap();
    let a = create_test_file(dir.path(), "a", b"AAA");
    let b = create_test_file(dir.path(), "b", b"AAA");
    create_test_file(dir.path(), "c", b"BBB");

    let groups = scan(&dir);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups.groups()[0].paths(), vec![a.clone(), b.clone()]);

    let report = Report::build(&groups).unwrap();
    assert_eq!(report.most_duplicated.representative, a);
    assert_eq!(report.most_duplicated.copies, vec![b.clone()]);
    assert_eq!(report.most_reclaimable.representative, a);
    assert_eq!(report.most_reclaimable.reclaimable, 3);
}

#[test]
fn test_empty_directory() {
    let dir = tempdir().unwrap();

    let groups = scan(&dir);

    assert!(groups.is_empty());
    assert_eq!(render(&groups), "No duplicates found\n");
}

#[test]
fn test_unique_sizes_are_filtered_out() {
    let dir = tempdir().unwrap();
    let first = create_test_file(dir.path(), "ten_a", b"0123456789");
    let second = create_test_file(dir.path(), "ten_b", b"0123456789");
    create_test_file(dir.path(), "twenty_a", &[b'a'; 20]);
    create_test_file(dir.path(), "twenty_b", &[b'b'; 20]);
    create_test_file(dir.path(), "twenty_c", &[b'c'; 20]);

    let groups = scan(&dir);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups.groups()[0].paths(), vec![first, second]);
    assert_eq!(groups.groups()[0].size, 10);
}

#[test]
fn test_most_copies_and_most_space_differ() {
    let dir = tempdir().unwrap();
    let a1 = create_test_file(dir.path(), "a/1", &[b'a'; 100]);
    create_test_file(dir.path(), "a/2", &[b'a'; 100]);
    create_test_file(dir.path(), "a/3", &[b'a'; 100]);
    let b1 = create_test_file(dir.path(), "b/1", &[b'b'; 1000]);
    let b2 = create_test_file(dir.path(), "b/2", &[b'b'; 1000]);

    let groups = scan(&dir);
    assert_eq!(groups.len(), 2);

    let report = Report::build(&groups).unwrap();
    assert_eq!(report.most_duplicated.representative, a1);
    assert_eq!(report.most_duplicated.copies.len(), 2);
    assert_eq!(report.most_duplicated.reclaimable, 200);
    assert_eq!(report.most_reclaimable.representative, b1);
    assert_eq!(report.most_reclaimable.copies, vec![b2.clone()]);
    assert_eq!(report.most_reclaimable.reclaimable, 1000);

    let text = render(&groups);
    assert!(text.starts_with("== == Duplicate File Finder Report == ==\n"));
    assert!(text.contains(&format!(
        "The file with the most duplicates is: {}\nHere are its 2 copies:\n",
        a1.display()
    )));
    assert!(text.contains(&format!(
        "The most disk space 1000 could be recovered, by deleting copies of this file: {}\nHere are its 1 copies:\n{}\n",
        b1.display(),
        b2.display()
    )));
}

#[test]
fn test_staged_search_compares_less() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        create_test_file(dir.path(), &format!("unique_{:02}", i), &vec![b'u'; i + 1]);
    }
    create_test_file(dir.path(), "dup_1", b"duplicate content");
    create_test_file(dir.path(), "dup_2", b"duplicate content");

    let finder = DuplicateFinder::with_defaults();
    let (files, _) = finder.enumerate(dir.path()).unwrap();

    let (staged, summary) = finder.find_duplicates_from_files(files.clone()).unwrap();
    let (reference, stats) = finder.find_duplicates_baseline(files).unwrap();

    assert!(staged.same_partition(&reference));
    assert_eq!(summary.comparisons, 1);
    assert!(summary.comparisons < stats.comparisons);
}
