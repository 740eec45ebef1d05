use crate::store::fs::FileStore;
use std::path::PathBuf;
use tempfile::TempDir;

/// A file store in a throwaway data directory.
pub struct TestEnv {
    // Held so the directory outlives the store.
    pub _temp_dir: TempDir,
    pub store: FileStore,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            store: FileStore::new(root.clone()),
            _temp_dir: temp_dir,
            root,
        }
    }

    /// A second handle on the same directory, as another process would open it.
    pub fn reopen(&self) -> FileStore {
        FileStore::new(self.root.clone())
    }
}
