//! Flat-file document store
//!
//! The store root is a single directory; every regular, non-hidden file in
//! it is a document. There is no locking: `create` checks then writes, and
//! two concurrent creates of one name can both succeed, the later write
//! winning. `write` and `delete` are last-writer-wins.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::document::{DocumentName, RenderedDocument};
use super::error::{StoreError, StoreResult};
use super::render::RendererRegistry;

/// CRUD over a collection of named documents.
///
/// Every operation parses its name with [`DocumentName::parse`] first, so
/// a traversal attempt fails with [`StoreError::InvalidName`] before any
/// filesystem access. I/O failures are propagated, never retried.
pub trait DocumentStore: Send + Sync {
    /// Base names of all documents, in directory iteration order
    fn list(&self) -> StoreResult<Vec<String>>;

    /// Check presence without reading content
    fn exists(&self, name: &str) -> StoreResult<bool>;

    /// Raw bytes of a document
    fn load(&self, name: &str) -> StoreResult<Vec<u8>>;

    /// Create a document. Fails with `AlreadyExists` if the name is taken.
    /// The name is expected to have passed validation already.
    fn create(&self, name: &str, content: &[u8]) -> StoreResult<()>;

    /// Create-or-replace with a full overwrite
    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()>;

    /// Remove a document permanently
    fn delete(&self, name: &str) -> StoreResult<()>;

    /// Renderers used by [`DocumentStore::read`]
    fn renderers(&self) -> &RendererRegistry;

    /// Load a document and render it by extension
    fn read(&self, name: &str) -> StoreResult<RenderedDocument> {
        let content = self.load(name)?;
        let parsed = DocumentName::parse(name)?;
        self.renderers()
            .render(&parsed, &content)
            .ok_or_else(|| StoreError::UnsupportedType {
                name: name.to_string(),
            })
    }
}

/// Document store backed by a local directory
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
    renderers: RendererRegistry,
}

impl FsDocumentStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>, renderers: RendererRegistry) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::info!("Document store rooted at {}", root.display());
        Ok(Self { root, renderers })
    }

    fn resolve(&self, name: &str) -> StoreResult<(DocumentName, PathBuf)> {
        let parsed = DocumentName::parse(name)?;
        let path = parsed.path_in(&self.root);
        Ok((parsed, path))
    }

    fn is_document(path: &Path) -> bool {
        path.is_file()
    }
}

impl DocumentStore for FsDocumentStore {
    fn list(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            // Skip hidden files
            if file_name.starts_with('.') {
                continue;
            }
            names.push(file_name);
        }

        Ok(names)
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        let (_, path) = self.resolve(name)?;
        Ok(Self::is_document(&path))
    }

    fn load(&self, name: &str) -> StoreResult<Vec<u8>> {
        let (parsed, path) = self.resolve(name)?;
        if !Self::is_document(&path) {
            return Err(StoreError::NotFound(parsed.to_string()));
        }
        Ok(fs::read(&path)?)
    }

    fn create(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        let (parsed, path) = self.resolve(name)?;
        if path.exists() {
            return Err(StoreError::AlreadyExists(parsed.to_string()));
        }

        fs::write(&path, content)?;
        tracing::info!("Created document: {}", parsed);
        Ok(())
    }

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        let (parsed, path) = self.resolve(name)?;
        fs::write(&path, content)?;
        tracing::info!("Saved document: {} ({} bytes)", parsed, content.len());
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<()> {
        let (parsed, path) = self.resolve(name)?;
        if !Self::is_document(&path) {
            return Err(StoreError::NotFound(parsed.to_string()));
        }

        fs::remove_file(&path)?;
        tracing::info!("Deleted document: {}", parsed);
        Ok(())
    }

    fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use tempfile::TempDir;

    use super::*;
    use crate::core::document::MediaType;

    fn store() -> (TempDir, FsDocumentStore) {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::open(dir.path(), RendererRegistry::default()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("data");
        let store = FsDocumentStore::open(&root, RendererRegistry::default()).unwrap();
        assert!(root.is_dir());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_document_lifecycle() {
        let (_dir, store) = store();

        store.create("test.txt", b"").unwrap();
        assert!(store.list().unwrap().contains(&"test.txt".to_string()));

        store.write("test.txt", b"new content").unwrap();
        let rendered = store.read("test.txt").unwrap();
        assert_eq!(rendered.media_type, MediaType::TEXT_PLAIN);
        assert_eq!(rendered.body, b"new content".to_vec());

        store.delete("test.txt").unwrap();
        assert!(matches!(store.read("test.txt"), Err(StoreError::NotFound(n)) if n == "test.txt"));
    }

    #[test]
    fn test_create_then_read_renders_by_extension() {
        let (_dir, store) = store();
        let registry = RendererRegistry::default();

        for name in ["x.txt", "x.md"] {
            store.create(name, b"X").unwrap();
            let expected = registry
                .render(&DocumentName::parse(name).unwrap(), b"X")
                .unwrap();
            assert_eq!(store.read(name).unwrap(), expected);
        }
    }

    #[test]
    fn test_markdown_read() {
        let (_dir, store) = store();
        store.create("about.md", b"# Title").unwrap();

        let rendered = store.read("about.md").unwrap();
        assert_eq!(rendered.media_type, MediaType::TEXT_HTML);
        assert!(String::from_utf8(rendered.body).unwrap().contains("<h1>Title</h1>"));
    }

    #[test]
    fn test_create_existing_fails() {
        let (_dir, store) = store();
        store.create("a.md", b"first").unwrap();

        let err = store.create("a.md", b"second").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.load("a.md").unwrap(), b"first".to_vec());
    }

    #[test]
    fn test_write_is_create_or_replace() {
        let (_dir, store) = store();

        store.write("fresh.txt", b"one").unwrap();
        assert!(store.exists("fresh.txt").unwrap());

        store.write("fresh.txt", b"two").unwrap();
        assert_eq!(store.load("fresh.txt").unwrap(), b"two".to_vec());
    }

    #[test]
    fn test_write_twice_is_idempotent() {
        let (_dir, store) = store();

        store.write("same.md", b"*same*").unwrap();
        let first_bytes = store.load("same.md").unwrap();
        let first_read = store.read("same.md").unwrap();

        store.write("same.md", b"*same*").unwrap();
        assert_eq!(store.load("same.md").unwrap(), first_bytes);
        assert_eq!(store.read("same.md").unwrap(), first_read);
    }

    #[test]
    fn test_delete_missing() {
        let (_dir, store) = store();
        assert!(matches!(store.delete("ghost.txt"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_unsupported_type() {
        let (dir, store) = store();
        fs::write(dir.path().join("data.csv"), "a,b").unwrap();

        assert!(store.list().unwrap().contains(&"data.csv".to_string()));
        assert!(matches!(
            store.read("data.csv"),
            Err(StoreError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_list_skips_hidden_and_directories() {
        let (dir, store) = store();
        fs::write(dir.path().join(".secret"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        store.create("visible.txt", b"").unwrap();

        assert_eq!(store.list().unwrap(), vec!["visible.txt".to_string()]);
        assert!(!store.exists("nested").unwrap());
    }

    #[test]
    fn test_traversal_rejected_before_filesystem() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("data");
        let store = FsDocumentStore::open(&root, RendererRegistry::default()).unwrap();
        fs::write(dir.path().join("outside.txt"), "private").unwrap();

        assert!(matches!(store.read("../outside.txt"), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.delete("../outside.txt"), Err(StoreError::InvalidName(_))));
        assert!(matches!(
            store.write("../outside.txt", b"owned"),
            Err(StoreError::InvalidName(_))
        ));
        assert_eq!(fs::read(dir.path().join("outside.txt")).unwrap(), b"private".to_vec());
    }

    #[test]
    fn test_concurrent_create_is_not_exclusive() {
        // Known race: both creators may pass the existence check. Only assert
        // that the document ends up present with one of the two bodies.
        let (_dir, store) = store();
        let store = Arc::new(store);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [b"left".to_vec(), b"rght".to_vec()]
            .into_iter()
            .map(|body| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.create("race.txt", &body).is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert!(successes >= 1);
        let body = store.load("race.txt").unwrap();
        assert!(body == b"left".to_vec() || body == b"rght".to_vec());
    }
}
