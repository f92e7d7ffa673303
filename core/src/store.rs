//! Storage of full documents by id. The index only keeps ids and vectors; matches are
//! joined back to their documents here.

use crate::error::Result;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    /// Free-form metadata carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<serde_json::Value>,
}

impl Document {
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), tags: None }
    }
}

pub trait DocumentStore: Send + Sync {
    /// Store `doc`, replacing any document with the same id.
    fn put(&mut self, doc: &Document) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<Document>>;

    fn len(&self) -> usize;

    /// Make every `put` so far durable.
    fn flush(&self) -> Result<()>;
}

/// Documents kept in a sled tree, JSON-encoded and keyed by id.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl DocumentStore for SledStore {
    fn put(&mut self, doc: &Document) -> Result<()> {
        let bytes = serde_json::to_vec(doc)?;
        self.db.insert(doc.id.as_bytes(), bytes)?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Document>> {
        match self.db.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn len(&self) -> usize { self.db.len() }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: HashMap<DocId, Document>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

impl DocumentStore for MemoryStore {
    fn put(&mut self, doc: &Document) -> Result<()> {
        self.docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Document>> { Ok(self.docs.get(id).cloned()) }

    fn len(&self) -> usize { self.docs.len() }

    fn flush(&self) -> Result<()> { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sled_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let mut doc = Document::new("d1", "hello ball");
        doc.tags = Some(serde_json::json!({ "lang": "en" }));
        {
            let mut store = SledStore::open(dir.path().join("docs")).unwrap();
            store.put(&doc).unwrap();
            store.put(&Document::new("d2", "ski")).unwrap();
            store.flush().unwrap();
            assert_eq!(store.len(), 2);
        }
        let store = SledStore::open(dir.path().join("docs")).unwrap();
        assert_eq!(store.get("d1").unwrap(), Some(doc));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn memory_store_replaces_by_id() {
        let mut store = MemoryStore::new();
        store.put(&Document::new("a", "one")).unwrap();
        store.put(&Document::new("a", "two")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().unwrap().text, "two");
    }
}
