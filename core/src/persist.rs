use crate::error::{IndexError, Result};
use crate::vectorizer::CountVectorizer;
use crate::{DocId, InvertedIndex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Bumped whenever the layout of a persisted blob changes.
pub const FORMAT_VERSION: u32 = 1;

pub const DEFAULT_INDEX_FILE: &str = "inverted_index.bin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_terms: usize,
    pub dim: usize,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn describe(index: &InvertedIndex<DocId>, dim: usize) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self { num_docs: index.num_docs(), num_terms: index.num_terms(), dim, created_at, version: FORMAT_VERSION }
    }
}

/// File layout of a workspace directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
    index_file_name: String,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_index_file(root, DEFAULT_INDEX_FILE)
    }

    pub fn with_index_file<P: AsRef<Path>>(root: P, index_file_name: &str) -> Self {
        Self { root: root.as_ref().to_path_buf(), index_file_name: index_file_name.to_string() }
    }

    pub fn index(&self) -> PathBuf { self.root.join(&self.index_file_name) }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs") }

    /// True when a persisted index is present.
    pub fn has_index(&self) -> bool { self.index().is_file() }
}

fn write_blob<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(value).map_err(|e| IndexError::serialization(path, e))?;
    let mut f = File::create(path)?;
    f.write_all(&bytes)?;
    f.sync_all()?;
    Ok(())
}

fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => IndexError::serialization(path, "file is missing"),
        _ => IndexError::Io(e),
    })?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    bincode::deserialize(&buf).map_err(|e| IndexError::serialization(path, e))
}

/// Versioned wrapper so a blob written by an incompatible build is refused up front.
#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    payload: T,
}

pub fn save_index(paths: &IndexPaths, index: &InvertedIndex<DocId>) -> Result<()> {
    write_blob(&paths.index(), &Envelope { version: FORMAT_VERSION, payload: index })
}

/// Restore an index and check it against the vocabulary it will be queried with.
pub fn load_index(paths: &IndexPaths, expected_dim: usize) -> Result<InvertedIndex<DocId>> {
    let path = paths.index();
    let envelope: Envelope<InvertedIndex<DocId>> = read_blob(&path)?;
    if envelope.version != FORMAT_VERSION {
        return Err(IndexError::serialization(
            &path,
            format!("format version {} is not supported (expected {FORMAT_VERSION})", envelope.version),
        ));
    }
    let index = envelope.payload;
    if let Some(dim) = index.dim() {
        if dim != expected_dim {
            return Err(IndexError::serialization(
                &path,
                format!("index dimension {dim} does not match vocabulary size {expected_dim}"),
            ));
        }
    }
    index.validate().map_err(|reason| IndexError::serialization(&path, reason))?;
    tracing::debug!(path = %path.display(), num_docs = index.num_docs(), "index loaded");
    Ok(index)
}

pub fn save_vocabulary(paths: &IndexPaths, vectorizer: &CountVectorizer) -> Result<()> {
    write_blob(&paths.vocabulary(), &Envelope { version: FORMAT_VERSION, payload: vectorizer })
}

pub fn load_vocabulary(paths: &IndexPaths) -> Result<CountVectorizer> {
    let path = paths.vocabulary();
    let envelope: Envelope<CountVectorizer> = read_blob(&path)?;
    if envelope.version != FORMAT_VERSION {
        return Err(IndexError::serialization(&path, format!("format version {} is not supported", envelope.version)));
    }
    Ok(envelope.payload)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let mut f = File::open(&path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    serde_json::from_str(&buf).map_err(|e| IndexError::serialization(&path, e))
}
