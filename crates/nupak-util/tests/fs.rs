use nupak_util::fs::{find_ancestor_with, write_atomic};
use tempfile::TempDir;

#[test]
fn test_find_ancestor_with_direct() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("nupak.dependencies"), "").unwrap();
    let result = find_ancestor_with(tmp.path(), "nupak.dependencies");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_nested() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("nupak.dependencies"), "").unwrap();
    let nested = tmp.path().join("a").join("b").join("c");
    std::fs::create_dir_all(&nested).unwrap();
    let result = find_ancestor_with(&nested, "nupak.dependencies");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_not_found() {
    let tmp = TempDir::new().unwrap();
    let result = find_ancestor_with(tmp.path(), "NonExistent.file");
    assert_eq!(result, None);
}

#[test]
fn test_write_atomic_creates_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nupak.lock");
    write_atomic(&path, b"NUGET\n").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "NUGET\n");
}

#[test]
fn test_write_atomic_replaces_existing() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nupak.lock");
    std::fs::write(&path, "old contents that are longer").unwrap();
    write_atomic(&path, b"new").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");

    let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}
