//! File-based storage for native platforms.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::elements::Node;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each board as a pretty-printed JSON element array in one directory.
pub struct FileStorage {
    base_path: PathBuf,
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io(format!("Failed to {} {}: {}", action, path.display(), err))
}

impl FileStorage {
    /// Create the storage, creating `base_path` if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_path).map_err(|e| io_error("create", &base_path, e))?;
        Ok(Self { base_path })
    }

    fn board_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, children: &[Node]) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.board_path(id);
        let json = serde_json::to_string_pretty(children).map_err(|e| StorageError::Serialization(e.to_string()));
        Box::pin(async move { fs::write(&path, json?).map_err(|e| io_error("write", &path, e)) })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Vec<Node>>> {
        let path = self.board_path(id);
        let id_owned = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id_owned));
            }
            let json = fs::read_to_string(&path).map_err(|e| io_error("read", &path, e))?;
            serde_json::from_str(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.board_path(id);
        Box::pin(async move {
            match fs::remove_file(&path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_error("delete", &path, e)),
                _ => Ok(()),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            let entries = match fs::read_dir(&base) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(io_error("list", &base, e)),
            };
            Ok(entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|e| e == "json"))
                .filter_map(|path| path.file_stem().and_then(|n| n.to_str()).map(str::to_string))
                .collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.board_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Arrow, BoardElement, ElementKind, Frame, Geometry};
    use crate::geometry::BBox;
    use crate::storage::block_on;
    use kurbo::Point;
    use tempfile::tempdir;

    fn children() -> Vec<Node> {
        let mut frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "Ideas");
        frame.children.push(
            BoardElement::with_id("r1", ElementKind::Geometry(Geometry::rect(BBox::new(10.0, 10.0, 50.0, 50.0)))).into_node(),
        );
        vec![
            BoardElement::with_id("f", ElementKind::Frame(frame)).into_node(),
            BoardElement::with_id("a", ElementKind::Arrow(Arrow::between(Point::ZERO, Point::new(5.0, 5.0)))).into_node(),
        ]
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("board", &children())).unwrap();
        let loaded = block_on(storage.load("board")).unwrap();
        assert_eq!(loaded, children());
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list_and_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("b1", &children())).unwrap();
        block_on(storage.save("b2", &[])).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut list = block_on(storage.list()).unwrap();
        list.sort();
        assert_eq!(list, ["b1", "b2"]);

        block_on(storage.delete("b1")).unwrap();
        assert!(!block_on(storage.exists("b1")).unwrap());
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("team/board:1", &children())).unwrap();
        assert!(dir.path().join("team_board_1.json").exists());
        assert_eq!(block_on(storage.load("team/board:1")).unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        assert!(matches!(block_on(storage.load("bad")), Err(StorageError::Serialization(_))));
    }
}
