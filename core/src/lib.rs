//! Sparse-vector inverted index with TF-IDF style top-k retrieval, plus the glue to
//! feed it from text and keep it on disk.

pub mod config;
pub mod error;
pub mod index;
pub mod persist;
pub mod selection;
pub mod service;
pub mod store;
pub mod tokenizer;
pub mod vector;
pub mod vectorizer;

pub use config::ServiceConfig;
pub use error::{IndexError, IndexWarning, InvalidVector};
pub use index::{DfMode, DocId, InvertedIndex, TermId, Weight};
pub use selection::{ScoredMatch, SelectionStrategy};
pub use service::{IndexService, Match, QueryResult, SharedService};
pub use store::{Document, DocumentStore, MemoryStore, SledStore};
pub use vector::SparseVector;
pub use vectorizer::CountVectorizer;
