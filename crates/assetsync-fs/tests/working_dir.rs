//! Bare file names resolve against the working directory. Kept in its own
//! test binary because it changes the process-wide current directory.

use assetsync_fs::{AtomicFile, AtomicWriteOptions, atomic_read, atomic_write, list_dir};
use tempfile::tempdir;

#[tokio::test]
async fn test_bare_names_write_into_working_dir() {
    let dir = tempdir().unwrap();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    atomic_write(".assetsync-state.json", b"{}", AtomicWriteOptions::new()).unwrap();

    let mut file = AtomicFile::create("index.html", AtomicWriteOptions::new())
        .await
        .unwrap();
    file.write_chunk(b"<html></html>").await.unwrap();
    file.commit().await.unwrap();

    std::env::set_current_dir(previous).unwrap();

    assert_eq!(atomic_read(dir.path().join(".assetsync-state.json")).unwrap(), b"{}");
    assert_eq!(atomic_read(dir.path().join("index.html")).unwrap(), b"<html></html>");
    let names: Vec<_> = list_dir(dir.path()).unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, [".assetsync-state.json", "index.html"]);
}
