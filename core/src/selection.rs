//! Ranking of scored candidates.
//!
//! Without a `top_k`, every candidate is returned sorted by score descending with ties
//! broken by document id descending. With a positive `top_k` the index's
//! [`SelectionStrategy`] decides what comes back.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A candidate document and its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch<D> {
    pub score: f64,
    pub doc_id: D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Sort everything, then keep the first `top_k`.
    FullSortDescending,
    /// Legacy partial selection. Candidates are partitioned in *ascending* score order
    /// around position `min(top_k, n - 1)` and all of them are returned: only that
    /// position is guaranteed to hold its correctly ranked element, nothing is truncated.
    UnstablePartitionTopK,
    /// Bounded min-heap of size `top_k`. Same output as `FullSortDescending`.
    #[default]
    BoundedHeap,
}

fn score_order(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Score descending, then id descending.
fn descending<D: Ord>(a: &ScoredMatch<D>, b: &ScoredMatch<D>) -> Ordering {
    score_order(b.score, a.score).then_with(|| b.doc_id.cmp(&a.doc_id))
}

pub fn sort_descending<D: Ord>(scored: &mut [ScoredMatch<D>]) {
    scored.sort_by(descending);
}

impl SelectionStrategy {
    /// Apply the strategy. `top_k == 0` means "no limit" and always fully sorts.
    pub fn select<D: Ord>(self, mut scored: Vec<ScoredMatch<D>>, top_k: usize) -> Vec<ScoredMatch<D>> {
        if scored.is_empty() {
            return scored;
        }
        if top_k == 0 {
            sort_descending(&mut scored);
            return scored;
        }
        match self {
            SelectionStrategy::FullSortDescending => {
                sort_descending(&mut scored);
                scored.truncate(top_k);
                scored
            }
            SelectionStrategy::UnstablePartitionTopK => {
                let kth = top_k.min(scored.len() - 1);
                scored.select_nth_unstable_by(kth, |a, b| score_order(a.score, b.score));
                scored
            }
            SelectionStrategy::BoundedHeap => bounded_heap(scored, top_k),
        }
    }
}

struct Ranked<D>(ScoredMatch<D>);

impl<D: Ord> Ord for Ranked<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        descending(&other.0, &self.0)
    }
}

impl<D: Ord> PartialOrd for Ranked<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: Ord> PartialEq for Ranked<D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<D: Ord> Eq for Ranked<D> {}

fn bounded_heap<D: Ord>(mut scored: Vec<ScoredMatch<D>>, top_k: usize) -> Vec<ScoredMatch<D>> {
    if top_k >= scored.len() {
        sort_descending(&mut scored);
        return scored;
    }
    // min-heap on rank: the root is the weakest of the current best `top_k`
    let mut heap: BinaryHeap<Reverse<Ranked<D>>> = BinaryHeap::with_capacity(top_k.saturating_add(1));
    for m in scored {
        heap.push(Reverse(Ranked(m)));
        if heap.len() > top_k {
            heap.pop();
        }
    }
    let mut out: Vec<ScoredMatch<D>> = heap.into_iter().map(|Reverse(Ranked(m))| m).collect();
    sort_descending(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(pairs: &[(f64, u32)]) -> Vec<ScoredMatch<u32>> {
        pairs.iter().map(|&(score, doc_id)| ScoredMatch { score, doc_id }).collect()
    }

    fn ids(v: &[ScoredMatch<u32>]) -> Vec<u32> {
        v.iter().map(|m| m.doc_id).collect()
    }

    #[test]
    fn unlimited_sorts_with_id_descending_ties() {
        let out = SelectionStrategy::BoundedHeap.select(scored(&[(0.5, 1), (0.9, 2), (0.5, 3)]), 0);
        assert_eq!(ids(&out), vec![2, 3, 1]);
    }

    #[test]
    fn negative_zero_ties_with_zero() {
        let out = SelectionStrategy::FullSortDescending.select(scored(&[(-0.0, 7), (0.0, 2)]), 0);
        assert_eq!(ids(&out), vec![7, 2]);
    }

    #[test]
    fn heap_matches_full_sort() {
        let input = scored(&[(0.1, 1), (0.7, 2), (0.3, 3), (0.7, 4), (-0.2, 5), (0.0, 6)]);
        for k in 1..8 {
            let a = SelectionStrategy::FullSortDescending.select(input.clone(), k);
            let b = SelectionStrategy::BoundedHeap.select(input.clone(), k);
            assert_eq!(a, b, "k = {k}");
            assert_eq!(a.len(), k.min(input.len()));
        }
    }

    #[test]
    fn partition_places_kth_and_keeps_everything() {
        let input = scored(&[(0.4, 1), (0.1, 2), (0.9, 3), (0.3, 4), (0.6, 5)]);
        let out = SelectionStrategy::UnstablePartitionTopK.select(input.clone(), 2);
        assert_eq!(out.len(), input.len());
        assert_eq!(out[2].score, 0.4);
        assert!(out[..2].iter().all(|m| m.score <= 0.4));
        assert!(out[3..].iter().all(|m| m.score >= 0.4));
    }

    #[test]
    fn partition_with_oversized_k_does_not_fail() {
        let out = SelectionStrategy::UnstablePartitionTopK.select(scored(&[(0.2, 1), (0.8, 2)]), 10);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].score, 0.8);
    }

    #[test]
    fn empty_input_stays_empty() {
        for s in [
            SelectionStrategy::FullSortDescending,
            SelectionStrategy::UnstablePartitionTopK,
            SelectionStrategy::BoundedHeap,
        ] {
            assert!(s.select(Vec::<ScoredMatch<u32>>::new(), 3).is_empty());
        }
    }
}
