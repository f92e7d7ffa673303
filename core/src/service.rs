//! Glue between raw text, the vectorizer, the inverted index and the document store.

use crate::config::ServiceConfig;
use crate::error::{IndexError, IndexWarning};
use crate::persist::{self, IndexPaths, MetaFile};
use crate::selection::ScoredMatch;
use crate::store::{Document, DocumentStore, MemoryStore, SledStore};
use crate::tokenizer::Tokenizer;
use crate::vectorizer::CountVectorizer;
use crate::{DocId, InvertedIndex, SparseVector};
use anyhow::{bail, Context, Result};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// One writer at a time, any number of concurrent searches between writes.
pub type SharedService = Arc<RwLock<IndexService>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub score: f64,
    #[serde(flatten)]
    pub document: Document,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub matches: Vec<Match>,
}

pub struct IndexService {
    config: ServiceConfig,
    paths: Option<IndexPaths>,
    vectorizer: CountVectorizer,
    index: InvertedIndex<DocId>,
    store: Box<dyn DocumentStore>,
}

fn empty_index(config: &ServiceConfig, dim: usize) -> InvertedIndex<DocId> {
    InvertedIndex::with_dimension(dim)
        .with_df_mode(config.df_mode)
        .with_selection(config.selection)
}

impl IndexService {
    /// Service without a workspace: nothing is read from or written to disk.
    pub fn in_memory(config: ServiceConfig) -> Self {
        Self::with_store(config, Box::new(MemoryStore::new()))
    }

    /// Service without a workspace that keeps its documents in `store`.
    pub fn with_store(config: ServiceConfig, store: Box<dyn DocumentStore>) -> Self {
        let vectorizer = CountVectorizer::fit(Tokenizer::new(config.stemming), &config.corpus);
        let index = empty_index(&config, vectorizer.dim());
        Self { config, paths: None, vectorizer, index, store }
    }

    /// Open the workspace at `root`, restoring a persisted vocabulary and index if present.
    pub fn open<P: AsRef<Path>>(root: P, config: ServiceConfig) -> Result<Self> {
        let paths = IndexPaths::with_index_file(root, &config.index_file_name);
        std::fs::create_dir_all(&paths.root)
            .with_context(|| format!("creating workspace {}", paths.root.display()))?;

        let vectorizer = if paths.vocabulary().is_file() {
            persist::load_vocabulary(&paths).context("loading vocabulary")?
        } else {
            CountVectorizer::fit(Tokenizer::new(config.stemming), &config.corpus)
        };

        let index = if paths.has_index() {
            let mut index = persist::load_index(&paths, vectorizer.dim()).context("loading index")?;
            index.set_selection(config.selection);
            if index.df_mode() != config.df_mode {
                tracing::warn!(stored = ?index.df_mode(), configured = ?config.df_mode, "keeping df mode of the stored index");
            }
            index
        } else {
            empty_index(&config, vectorizer.dim())
        };

        let store = SledStore::open(paths.docs()).context("opening document store")?;
        tracing::info!(
            root = %paths.root.display(),
            num_docs = index.num_docs(),
            vocabulary = vectorizer.dim(),
            "workspace opened"
        );
        Ok(Self { config, paths: Some(paths), vectorizer, index, store: Box::new(store) })
    }

    pub fn into_shared(self) -> SharedService { Arc::new(RwLock::new(self)) }

    pub fn config(&self) -> &ServiceConfig { &self.config }

    pub fn index(&self) -> &InvertedIndex<DocId> { &self.index }

    pub fn vectorizer(&self) -> &CountVectorizer { &self.vectorizer }

    pub fn document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.store.get(id)?)
    }

    /// Warning that applies to searches right now, if any.
    pub fn status(&self) -> Option<IndexWarning> {
        self.index.is_empty().then_some(IndexWarning::EmptyIndex)
    }

    /// Add pre-computed vectors. Stops at the first invalid vector; earlier ones stay indexed.
    pub fn index_vectors<I>(&mut self, batch: I) -> Result<usize, IndexError>
    where
        I: IntoIterator<Item = (DocId, SparseVector)>,
    {
        let mut added = 0;
        for (doc_id, vector) in batch {
            self.index.add(doc_id, vector)?;
            added += 1;
        }
        Ok(added)
    }

    /// Vectorize, store and index each document. A document is only indexed once the
    /// store has accepted it, so every match can be joined back to its document.
    pub fn index_documents(&mut self, docs: &[Document]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        for doc in docs {
            let vector = self.vectorizer.transform(&doc.text);
            self.store
                .put(doc)
                .with_context(|| format!("storing document {}", doc.id))?;
            self.index
                .add(doc.id.clone(), vector)
                .with_context(|| format!("indexing document {}", doc.id))?;
        }
        tracing::info!(batch = docs.len(), num_docs = self.index.num_docs(), "indexed documents");
        Ok(docs.len())
    }

    /// Rank stored documents against a query vector. An empty index yields no matches.
    pub fn search_vector(&self, query: &SparseVector, top_k: Option<usize>) -> Vec<ScoredMatch<DocId>> {
        if let Some(warning) = self.status() {
            tracing::warn!(%warning, "searching an empty index");
            return Vec::new();
        }
        self.index.match_query(query, top_k)
    }

    /// Vectorize each query, rank, and join the matches with their stored documents.
    ///
    /// `top_k` falls back to the configured default; `Some(0)` returns every candidate.
    pub fn search_texts<S: AsRef<str>>(&self, queries: &[S], top_k: Option<usize>) -> Result<Vec<QueryResult>> {
        let top_k = top_k.unwrap_or(self.config.default_top_k);
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let query = query.as_ref();
            let vector = self.vectorizer.transform(query);
            let mut matches = Vec::new();
            for hit in self.search_vector(&vector, Some(top_k)) {
                match self.store.get(&hit.doc_id)? {
                    Some(document) => matches.push(Match { score: hit.score, document }),
                    None => tracing::warn!(doc_id = %hit.doc_id, "matched document missing from store"),
                }
            }
            results.push(QueryResult { query: query.to_string(), matches });
        }
        Ok(results)
    }

    /// Recompute the IDF cache; returns the number of terms it covers.
    pub fn refresh_idf_cache(&mut self) -> usize {
        self.index.cache_idfs();
        self.index.num_terms()
    }

    /// Refresh the IDF cache, then write vocabulary, index, meta and documents to the workspace.
    pub fn persist(&mut self) -> Result<MetaFile> {
        let Some(paths) = &self.paths else {
            bail!("in-memory service has no workspace to persist to");
        };
        self.index.cache_idfs();
        persist::save_vocabulary(paths, &self.vectorizer).context("saving vocabulary")?;
        persist::save_index(paths, &self.index).context("saving index")?;
        let meta = MetaFile::describe(&self.index, self.vectorizer.dim());
        persist::save_meta(paths, &meta).context("saving meta")?;
        self.store.flush().context("flushing document store")?;
        tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index persisted");
        Ok(meta)
    }

    /// Persist and release the workspace.
    pub fn close(mut self) -> Result<MetaFile> {
        self.persist()
    }
}
