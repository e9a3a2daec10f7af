use dupfind::duplicates::{DuplicateFinder, FinderConfig};
use dupfind::scanner::WalkerConfig;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert_eq!(summary.comparisons, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();

    // Same size, different content
    for name in ["a.txt", "b.txt", "c.txt"] {
        File::create(dir.path().join(name))
            .unwrap()
            .write_all(format!("content {}", &name[..1]).as_bytes())
            .unwrap();
    }

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.eliminated_by_size, 0);
    assert_eq!(summary.eliminated_by_prehash, 3);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();

    File::create(dir.path().join("a.txt"))
        .unwrap()
        .write_all(b"duplicate")
        .unwrap();
    File::create(dir.path().join("b.txt"))
        .unwrap()
        .write_all(b"duplicate")
        .unwrap();
    File::create(dir.path().join("c.txt"))
        .unwrap()
        .write_all(b"unique")
        .unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups.groups()[0].files.len(), 2);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.total_size, 24);
    assert_eq!(summary.eliminated_by_size, 1);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 9);
    assert_eq!(summary.comparisons, 1);
}

#[test]
fn test_scan_without_prehash() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"one").unwrap();
    fs::write(dir.path().join("b"), b"two").unwrap();
    fs::write(dir.path().join("c"), b"one").unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_prehash(false));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.eliminated_by_prehash, 0);
    assert!(summary.comparisons >= 2);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub1 = dir.path().join("sub1");
    let sub2 = dir.path().join("sub1/sub2");
    fs::create_dir_all(&sub2).unwrap();

    fs::write(dir.path().join("root.txt"), b"shared").unwrap();
    fs::write(sub1.join("one.txt"), b"shared").unwrap();
    fs::write(sub2.join("two.txt"), b"shared").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups.groups()[0].len(), 3);
    assert_eq!(summary.reclaimable_space, 12);
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("visible.txt"), b"same").unwrap();
    fs::write(dir.path().join(".hidden.txt"), b"same").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups.len(), 1);

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        skip_hidden: true,
        ..Default::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_scan_does_not_read_gitignore() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".gitignore"), "*.jpg\n").unwrap();
    let a = dir.path().join("a.jpg");
    let b = dir.path().join("b.jpg");
    fs::write(&a, b"same").unwrap();
    fs::write(&b, b"same").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.groups()[0].paths(), vec![a, b]);
}

#[cfg(unix)]
#[test]
fn test_scan_symlinks() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let target = outside.path().join("target.txt");
    fs::write(&target, b"linked").unwrap();
    fs::write(dir.path().join("copy.txt"), b"linked").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    // Links are not followed by default
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        follow_symlinks: true,
        ..Default::default()
    });
    let (groups, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.groups()[0].len(), 2);
}

#[cfg(unix)]
#[test]
fn test_scan_link_is_not_a_copy_of_its_target() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("target.txt");
    fs::write(&target, b"only one file").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("alias.txt")).unwrap();

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        follow_symlinks: true,
        ..Default::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.reclaimable_space, 0);
}
