//! Text to sparse vector encoding over a vocabulary fitted once from a seed corpus.

use crate::tokenizer::Tokenizer;
use crate::vector::SparseVector;
use crate::{TermId, Weight};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Counts vocabulary terms in a text. Term ids follow the lexicographic order of the
/// vocabulary and never change after `fit`; unknown tokens are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizer {
    tokenizer: Tokenizer,
    terms: Vec<String>,
    dictionary: HashMap<String, TermId>,
}

impl CountVectorizer {
    pub fn fit<I, S>(tokenizer: Tokenizer, corpus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary: BTreeSet<String> = corpus
            .into_iter()
            .flat_map(|text| tokenizer.tokenize(text.as_ref()))
            .collect();
        let terms: Vec<String> = vocabulary.into_iter().collect();
        let dictionary = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as TermId))
            .collect();
        Self { tokenizer, terms, dictionary }
    }

    /// Vocabulary size, which is also the dimension of every produced vector.
    pub fn dim(&self) -> usize { self.terms.len() }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn term(&self, term_id: TermId) -> Option<&str> {
        self.terms.get(term_id as usize).map(String::as_str)
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<TermId, Weight> = BTreeMap::new();
        for token in self.tokenizer.tokenize(text) {
            if let Some(&tid) = self.dictionary.get(&token) {
                *counts.entry(tid).or_insert(0.0) += 1.0;
            }
        }
        // ids come from the dictionary, counts are positive and keys unique
        SparseVector::from_pairs(self.dim(), counts)
            .unwrap_or_else(|_| SparseVector::empty(self.dim()))
    }
}
