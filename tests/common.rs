//! Test utilities & fixtures.
//! Provides access to the sample world under `tests/test-data-world`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use starmud::world::{WorldStore, YamlGateway};

/// Return the path to the static world fixture directory.
/// Tests that save must work on a copy from [`writable_fixture`].
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test-data-world")
}

fn copy_tree(src: &Path, dst: &Path) {
    std::fs::create_dir_all(dst).unwrap();
    for entry in std::fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Return a writable copy (temp dir) of the whole fixture world.
#[allow(dead_code)]
pub fn writable_fixture() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    copy_tree(&fixture_root(), tmp.path());
    tmp
}

/// Store over `root/data` and `root/docs`, nothing loaded.
#[allow(dead_code)]
pub fn store_at(root: &Path) -> WorldStore {
    WorldStore::new(Arc::new(YamlGateway::new(
        root.join("data"),
        root.join("docs"),
    )))
}

/// Store over a fresh copy of the fixture world, already loaded.
#[allow(dead_code)]
pub fn loaded_store() -> (tempfile::TempDir, WorldStore) {
    let tmp = writable_fixture();
    let store = store_at(tmp.path());
    store.load().expect("fixture world loads");
    (tmp, store)
}

/// Store over an empty temp dir.
#[allow(dead_code)]
pub fn empty_store() -> (tempfile::TempDir, WorldStore) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = store_at(tmp.path());
    (tmp, store)
}
