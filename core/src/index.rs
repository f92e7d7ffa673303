use crate::error::{IndexError, InvalidVector};
use crate::selection::{ScoredMatch, SelectionStrategy};
use crate::vector::SparseVector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

pub type TermId = u32;
pub type DocId = String;
/// Value of a single term inside a sparse vector.
pub type Weight = f32;

/// What `cache_idfs` uses as a term's document frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DfMode {
    /// Sum of the term's values over every `add`. Counts, not documents, so a term
    /// seen 3 times in one document contributes 3.
    #[default]
    AccumulatedValues,
    /// Number of distinct documents in the term's posting set.
    DistinctDocuments,
}

/// Sparse-vector inverted index with TF-IDF style scoring.
///
/// Owns posting sets, per-term frequency totals, the stored vector of every document
/// and a cache of per-term IDF values that is refreshed by [`InvertedIndex::cache_idfs`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "D: Serialize + Eq + Hash",
    deserialize = "D: Deserialize<'de> + Eq + Hash"
))]
pub struct InvertedIndex<D = DocId> {
    postings: HashMap<TermId, HashSet<D>>,
    document_frequencies: HashMap<TermId, f64>,
    vectors: HashMap<D, SparseVector>,
    idfs: HashMap<TermId, f64>,
    dim: Option<usize>,
    df_mode: DfMode,
    selection: SelectionStrategy,
}

impl<D> Default for InvertedIndex<D> {
    fn default() -> Self {
        Self {
            postings: HashMap::new(),
            document_frequencies: HashMap::new(),
            vectors: HashMap::new(),
            idfs: HashMap::new(),
            dim: None,
            df_mode: DfMode::default(),
            selection: SelectionStrategy::default(),
        }
    }
}

impl<D> InvertedIndex<D>
where
    D: Eq + Hash + Ord + Clone,
{
    pub fn new() -> Self { Self::default() }

    /// Index whose vectors must all have dimension `dim`.
    pub fn with_dimension(dim: usize) -> Self {
        Self { dim: Some(dim), ..Self::default() }
    }

    pub fn with_df_mode(mut self, df_mode: DfMode) -> Self {
        self.df_mode = df_mode;
        self
    }

    pub fn with_selection(mut self, selection: SelectionStrategy) -> Self {
        self.selection = selection;
        self
    }

    pub fn set_selection(&mut self, selection: SelectionStrategy) { self.selection = selection; }

    pub fn selection(&self) -> SelectionStrategy { self.selection }

    pub fn df_mode(&self) -> DfMode { self.df_mode }

    /// Vocabulary dimension, fixed by construction or by the first `add`.
    pub fn dim(&self) -> Option<usize> { self.dim }

    pub fn num_docs(&self) -> usize { self.vectors.len() }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.vectors.is_empty() }

    pub fn vector(&self, doc_id: &D) -> Option<&SparseVector> { self.vectors.get(doc_id) }

    pub fn document_frequency(&self, term_id: TermId) -> Option<f64> {
        self.document_frequencies.get(&term_id).copied()
    }

    /// Cached IDF for `term_id`, zero when absent.
    pub fn idf(&self, term_id: TermId) -> f64 {
        self.idfs.get(&term_id).copied().unwrap_or(0.0)
    }

    /// Register `vector` under `doc_id`.
    ///
    /// Every stored term gets `doc_id` in its posting set and its value added to the
    /// term's frequency total. The vector then replaces whatever was stored for
    /// `doc_id`; earlier posting entries and frequency contributions are kept.
    pub fn add(&mut self, doc_id: D, vector: SparseVector) -> Result<(), IndexError> {
        match self.dim {
            Some(expected) if expected != vector.dim() => {
                return Err(InvalidVector::DimensionMismatch { expected, found: vector.dim() }.into());
            }
            Some(_) => {}
            None => self.dim = Some(vector.dim()),
        }
        for (term_id, value) in vector.iter() {
            self.postings.entry(term_id).or_default().insert(doc_id.clone());
            *self.document_frequencies.entry(term_id).or_insert(0.0) += f64::from(value);
        }
        self.vectors.insert(doc_id, vector);
        Ok(())
    }

    /// Recompute `idf = ln(N / (1 + df))` for every term with a frequency total,
    /// `N` being the number of stored documents.
    pub fn cache_idfs(&mut self) {
        let num_docs = self.vectors.len() as f64;
        for (&term_id, &total) in &self.document_frequencies {
            let df = match self.df_mode {
                DfMode::AccumulatedValues => total,
                DfMode::DistinctDocuments => self.postings.get(&term_id).map_or(0, HashSet::len) as f64,
            };
            self.idfs.insert(term_id, (num_docs / (1.0 + df)).ln());
        }
    }

    /// Documents containing `term_id`; empty if the term was never added.
    pub fn get_candidates(&self, term_id: TermId) -> impl Iterator<Item = &D> + '_ {
        self.postings.get(&term_id).into_iter().flatten()
    }

    /// Union of the posting sets of every query term, in id order.
    fn gather_candidates<'a>(&'a self, query: &SparseVector) -> BTreeSet<&'a D> {
        query.indices().iter().flat_map(|&t| self.get_candidates(t)).collect()
    }

    /// Product over the query's terms of `tf * idf`, where `tf` is the candidate's
    /// value at the term divided by its nonzero count. A candidate lacking any query
    /// term scores zero; an empty query scores one.
    pub fn relevance(&self, query: &SparseVector, candidate: &SparseVector) -> f64 {
        let nnz = candidate.nnz() as f64;
        query.indices().iter().fold(1.0, |prod, &term_id| {
            let tf = f64::from(candidate.value_at(term_id)) / nnz;
            prod * tf * self.idf(term_id)
        })
    }

    /// Score every candidate sharing a term with `query` and rank them.
    ///
    /// `top_k` of `None` or `Some(0)` returns all candidates sorted by score descending,
    /// ties by id descending. A positive `top_k` is handed to the index's
    /// [`SelectionStrategy`].
    pub fn match_query(&self, query: &SparseVector, top_k: Option<usize>) -> Vec<ScoredMatch<D>> {
        let scored: Vec<ScoredMatch<D>> = self
            .gather_candidates(query)
            .into_iter()
            .filter_map(|doc_id| {
                let vector = self.vectors.get(doc_id)?;
                Some(ScoredMatch { score: self.relevance(query, vector), doc_id: doc_id.clone() })
            })
            .collect();
        self.selection.select(scored, top_k.unwrap_or(0))
    }

    /// Same ranking as [`match_query`](Self::match_query) without the scores.
    pub fn match_ids(&self, query: &SparseVector, top_k: Option<usize>) -> Vec<D> {
        self.match_query(query, top_k).into_iter().map(|m| m.doc_id).collect()
    }

    /// Check invariants that deserialization alone cannot guarantee.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (doc_id, vector) in &self.vectors {
            vector.validate().map_err(|e| e.to_string())?;
            if let Some(dim) = self.dim {
                if vector.dim() != dim {
                    return Err(format!("stored vector of dimension {} in index of dimension {dim}", vector.dim()));
                }
            }
            for term_id in vector.indices() {
                let listed = self.postings.get(term_id).map_or(false, |p| p.contains(doc_id));
                if !listed {
                    return Err(format!("term {term_id} is missing a posting entry"));
                }
            }
        }
        Ok(())
    }
}
