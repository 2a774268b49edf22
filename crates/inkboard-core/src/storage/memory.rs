//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::elements::Node;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for tests and scratch boards.
#[derive(Default)]
pub struct MemoryStorage {
    boards: RwLock<HashMap<String, Vec<Node>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, children: &[Node]) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        // Nodes are shared, so this copies pointers rather than elements
        let children = children.to_vec();
        Box::pin(async move {
            let mut boards = self.boards.write().map_err(lock_error)?;
            boards.insert(id, children);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Vec<Node>>> {
        let id = id.to_string();
        Box::pin(async move {
            let boards = self.boards.read().map_err(lock_error)?;
            boards.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut boards = self.boards.write().map_err(lock_error)?;
            boards.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let boards = self.boards.read().map_err(lock_error)?;
            Ok(boards.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let boards = self.boards.read().map_err(lock_error)?;
            Ok(boards.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{BoardElement, ElementKind, Geometry};
    use crate::geometry::BBox;
    use crate::storage::block_on;

    fn children() -> Vec<Node> {
        vec![BoardElement::with_id("r1", ElementKind::Geometry(Geometry::rect(BBox::new(0.0, 0.0, 10.0, 10.0)))).into_node()]
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        block_on(storage.save("board", &children())).unwrap();
        let loaded = block_on(storage.load("board")).unwrap();
        assert_eq!(loaded, children());
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        assert!(!block_on(storage.exists("board")).unwrap());
        block_on(storage.save("board", &children())).unwrap();
        assert!(block_on(storage.exists("board")).unwrap());
        block_on(storage.delete("board")).unwrap();
        assert!(!block_on(storage.exists("board")).unwrap());
    }

    #[test]
    fn test_list() {
        let storage = MemoryStorage::new();
        block_on(storage.save("b1", &children())).unwrap();
        block_on(storage.save("b2", &[])).unwrap();

        let mut list = block_on(storage.list()).unwrap();
        list.sort();
        assert_eq!(list, ["b1", "b2"]);
    }
}
