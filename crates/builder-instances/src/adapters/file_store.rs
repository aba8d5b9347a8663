//! # File Instance Store
//!
//! ```text
//! <root>/
//! ├── instances/
//! │   ├── b1          one JSON NodeGroup per instance
//! │   └── b2
//! ├── current         {"name": "b1"}
//! └── .lock           held exclusively while a mutation runs
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{validate_name, InstanceError, NodeGroup};
use crate::ports::InstanceStore;

const INSTANCES_DIR: &str = "instances";
const CURRENT_FILE: &str = "current";
const LOCK_FILE: &str = ".lock";

#[derive(Debug, Serialize, Deserialize)]
struct CurrentPointer {
    name: String,
}

/// Exclusive lock on a store directory, released on drop.
///
/// Serializes mutations from concurrent `buildctl` processes.
struct StoreLock {
    file: fs::File,
}

impl StoreLock {
    fn acquire(root: &Path) -> Result<Self, InstanceError> {
        let path = root.join(LOCK_FILE);
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| store_error(&path, e))?;
        file.lock_exclusive().map_err(|e| store_error(&path, e))?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Instance store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileInstanceStore {
    root: PathBuf,
}

impl FileInstanceStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, InstanceError> {
        let root = root.into();
        let instances = root.join(INSTANCES_DIR);
        fs::create_dir_all(&instances).map_err(|e| store_error(&instances, e))?;
        debug!(root = %root.display(), "Opened instance store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn instance_path(&self, name: &str) -> Result<PathBuf, InstanceError> {
        validate_name(name)?;
        Ok(self.root.join(INSTANCES_DIR).join(name))
    }

    fn lock(&self) -> Result<StoreLock, InstanceError> {
        StoreLock::acquire(&self.root)
    }

    fn current_path(&self) -> PathBuf {
        self.root.join(CURRENT_FILE)
    }

    fn read_group(path: &Path) -> Result<NodeGroup, InstanceError> {
        let data = fs::read(path).map_err(|e| store_error(path, e))?;
        serde_json::from_slice(&data).map_err(|e| InstanceError::Serialization {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn current_name(&self) -> Result<Option<String>, InstanceError> {
        let path = self.current_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_error(&path, e)),
        };
        let pointer: CurrentPointer =
            serde_json::from_slice(&data).map_err(|e| InstanceError::Serialization {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(pointer.name))
    }

    /// Write through a temporary file so readers never see a partial record.
    fn write_atomic(path: &Path, data: &[u8]) -> Result<(), InstanceError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{}.tmp", file_name));
        fs::write(&tmp, data).map_err(|e| store_error(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| store_error(path, e))
    }
}

impl InstanceStore for FileInstanceStore {
    fn get(&self, name: &str) -> Result<NodeGroup, InstanceError> {
        let path = self.instance_path(name)?;
        if !path.is_file() {
            return Err(InstanceError::NotFound(name.to_string()));
        }
        Self::read_group(&path)
    }

    fn current(&self) -> Result<Option<NodeGroup>, InstanceError> {
        let Some(name) = self.current_name()? else {
            return Ok(None);
        };
        match self.get(&name) {
            Ok(group) => Ok(Some(group)),
            Err(InstanceError::NotFound(_)) | Err(InstanceError::InvalidName(_)) => {
                debug!(instance = %name, "Current pointer refers to a missing instance");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn set_current(&mut self, name: &str) -> Result<(), InstanceError> {
        let _lock = self.lock()?;
        if !self.instance_path(name)?.is_file() {
            return Err(InstanceError::NotFound(name.to_string()));
        }
        let pointer = CurrentPointer {
            name: name.to_string(),
        };
        let data = serde_json::to_vec(&pointer).map_err(|e| InstanceError::Serialization {
            path: self.current_path().display().to_string(),
            reason: e.to_string(),
        })?;
        Self::write_atomic(&self.current_path(), &data)
    }

    fn save(&mut self, group: &NodeGroup) -> Result<(), InstanceError> {
        let path = self.instance_path(&group.name)?;
        let _lock = self.lock()?;
        let data = serde_json::to_vec_pretty(group).map_err(|e| InstanceError::Serialization {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::write_atomic(&path, &data)
    }

    fn remove(&mut self, name: &str) -> Result<(), InstanceError> {
        let path = self.instance_path(name)?;
        let _lock = self.lock()?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(InstanceError::NotFound(name.to_string()))
            }
            Err(e) => return Err(store_error(&path, e)),
        }

        if self.current_name()?.as_deref() == Some(name) {
            let current = self.current_path();
            fs::remove_file(&current).map_err(|e| store_error(&current, e))?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<NodeGroup>, InstanceError> {
        let dir = self.root.join(INSTANCES_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| store_error(&dir, e))?;

        let mut groups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| store_error(&dir, e))?;
            let path = entry.path();
            let valid = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| validate_name(n).is_ok());
            if path.is_file() && valid {
                groups.push(Self::read_group(&path)?);
            }
        }
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }
}

fn store_error(path: &Path, e: io::Error) -> InstanceError {
    InstanceError::Store {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Node;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileInstanceStore) {
        let dir = TempDir::new().unwrap();
        let store = FileInstanceStore::open(dir.path().join("cfg")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_save_get_list() {
        let (_dir, mut store) = store();
        let b1 = NodeGroup::new("b1", "local").with_node(Node::new("b10", "unix:///run/b1.sock"));
        store.save(&b1).unwrap();
        store.save(&NodeGroup::new("a.0", "local")).unwrap();

        assert_eq!(store.get("b1").unwrap(), b1);
        let names: Vec<_> = store.list().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["a.0", "b1"]);
    }

    #[test]
    fn test_missing_and_invalid_names() {
        let (_dir, store) = store();
        assert_eq!(store.get("ghost"), Err(InstanceError::NotFound("ghost".into())));
        assert_eq!(
            store.get("../escape"),
            Err(InstanceError::InvalidName("../escape".into()))
        );
    }

    #[test]
    fn test_current_pointer_lifecycle() {
        let (_dir, mut store) = store();
        assert_eq!(store.current().unwrap(), None);

        store.save(&NodeGroup::new("b1", "local")).unwrap();
        store.set_current("b1").unwrap();
        assert_eq!(store.current().unwrap().unwrap().name, "b1");

        store.remove("b1").unwrap();
        assert_eq!(store.current().unwrap(), None);
        assert!(!store.root().join(CURRENT_FILE).exists());
        assert_eq!(store.remove("b1"), Err(InstanceError::NotFound("b1".into())));
    }

    #[test]
    fn test_corrupt_record() {
        let (_dir, store) = store();
        fs::write(store.root().join(INSTANCES_DIR).join("bad"), b"{not json").unwrap();
        assert!(matches!(
            store.get("bad"),
            Err(InstanceError::Serialization { .. })
        ));
    }

    #[test]
    fn test_mutations_wait_for_lock() {
        let (_dir, mut store) = store();
        let held = StoreLock::acquire(store.root()).unwrap();

        let other = fs::File::open(store.root().join(LOCK_FILE)).unwrap();
        assert!(other.try_lock_exclusive().is_err());
        drop(held);
        assert!(other.try_lock_exclusive().is_ok());
        FileExt::unlock(&other).unwrap();

        store.save(&NodeGroup::new("b1", "local")).unwrap();
        assert!(store.get("b1").is_ok());
    }

    #[test]
    fn test_reopen_sees_same_data() {
        let (dir, mut store) = store();
        store.save(&NodeGroup::new("b1", "local")).unwrap();
        store.set_current("b1").unwrap();

        let reopened = FileInstanceStore::open(dir.path().join("cfg")).unwrap();
        assert_eq!(reopened.current().unwrap().unwrap().name, "b1");
    }
}
