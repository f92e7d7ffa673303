//! Fixed-dimension sparse vectors over a term vocabulary.

use crate::error::InvalidVector;
use crate::{TermId, Weight};
use serde::{Deserialize, Serialize};

/// Immutable sparse vector: sorted `(term_id, value)` pairs plus the vocabulary dimension.
///
/// Only nonzero values are stored, so `nnz()` is the number of terms that carry weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<TermId>,
    values: Vec<Weight>,
}

impl SparseVector {
    /// Build from parallel index/value arrays in any order.
    ///
    /// Zero values are dropped. Negative or non-finite values, duplicate term ids and
    /// term ids `>= dim` are rejected.
    pub fn new(dim: usize, indices: Vec<TermId>, values: Vec<Weight>) -> Result<Self, InvalidVector> {
        if indices.len() != values.len() {
            return Err(InvalidVector::LengthMismatch { indices: indices.len(), values: values.len() });
        }
        let mut pairs: Vec<(TermId, Weight)> = indices.into_iter().zip(values).collect();
        pairs.sort_unstable_by_key(|(t, _)| *t);
        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(InvalidVector::DuplicateTerm(window[0].0));
            }
        }
        for &(term_id, value) in &pairs {
            if term_id as usize >= dim {
                return Err(InvalidVector::TermOutOfRange { term_id, dim });
            }
            if !value.is_finite() {
                return Err(InvalidVector::NonFiniteValue { term_id });
            }
            if value < 0.0 {
                return Err(InvalidVector::NegativeValue { term_id, value });
            }
        }
        pairs.retain(|(_, v)| *v != 0.0);
        let (indices, values) = pairs.into_iter().unzip();
        Ok(Self { dim, indices, values })
    }

    pub fn from_pairs<I>(dim: usize, pairs: I) -> Result<Self, InvalidVector>
    where
        I: IntoIterator<Item = (TermId, Weight)>,
    {
        let (indices, values) = pairs.into_iter().unzip();
        Self::new(dim, indices, values)
    }

    /// Sparse view of a dense row; the dimension is the row length.
    pub fn from_dense(dense: &[Weight]) -> Result<Self, InvalidVector> {
        let pairs = dense
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (i as TermId, *v));
        Self::from_pairs(dense.len(), pairs)
    }

    pub fn empty(dim: usize) -> Self {
        Self { dim, indices: Vec::new(), values: Vec::new() }
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn nnz(&self) -> usize { self.indices.len() }

    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    pub fn indices(&self) -> &[TermId] { &self.indices }

    pub fn values(&self) -> &[Weight] { &self.values }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, Weight)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value of the dense representation at `term_id`: zero when the term is not stored.
    pub fn value_at(&self, term_id: TermId) -> Weight {
        match self.indices.binary_search(&term_id) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn to_dense(&self) -> Vec<Weight> {
        let mut dense = vec![0.0; self.dim];
        for (t, v) in self.iter() {
            dense[t as usize] = v;
        }
        dense
    }

    /// Re-check invariants on a value that did not go through `new`, e.g. one read from disk.
    pub(crate) fn validate(&self) -> Result<(), InvalidVector> {
        let checked = Self::new(self.dim, self.indices.clone(), self.values.clone())?;
        if checked == *self {
            Ok(())
        } else {
            Err(InvalidVector::NotCanonical)
        }
    }
}
