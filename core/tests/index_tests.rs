use sparsedex_core::persist::{load_index, save_index, IndexPaths};
use sparsedex_core::{InvertedIndex, SelectionStrategy, SparseVector, TermId, Weight};
use tempfile::tempdir;

const A: TermId = 0;
const B: TermId = 1;
const C: TermId = 2;

fn v(dim: usize, pairs: &[(TermId, Weight)]) -> SparseVector {
    SparseVector::from_pairs(dim, pairs.iter().copied()).unwrap()
}

fn xy_index() -> InvertedIndex<String> {
    let mut index = InvertedIndex::new();
    index.add("X".to_string(), v(3, &[(A, 1.0), (B, 1.0)])).unwrap();
    index.add("Y".to_string(), v(3, &[(B, 1.0), (C, 1.0)])).unwrap();
    index.cache_idfs();
    index
}

#[test]
fn end_to_end_shared_term_ties_by_id() {
    let index = xy_index();
    let idf_b = (2.0f64 / 3.0).ln();
    assert!((index.idf(B) - idf_b).abs() < 1e-12);

    let hits = index.match_query(&v(3, &[(B, 1.0)]), None);
    assert_eq!(hits.len(), 2);
    for hit in &hits {
        assert!((hit.score - 0.5 * idf_b).abs() < 1e-12);
        assert!((hit.score + 0.2027).abs() < 1e-3);
    }
    // equal scores: id descending
    assert_eq!(hits[0].doc_id, "Y");
    assert_eq!(hits[1].doc_id, "X");
    assert_eq!(index.match_ids(&v(3, &[(B, 1.0)]), Some(0)), vec!["Y".to_string(), "X".to_string()]);
}

#[test]
fn postings_list_every_added_term() {
    let mut index: InvertedIndex<u32> = InvertedIndex::new();
    let docs = [
        (1, v(6, &[(0, 1.0), (3, 2.0)])),
        (2, v(6, &[(3, 1.0), (5, 4.0)])),
        (3, v(6, &[(1, 1.0)])),
    ];
    for (id, vector) in docs.iter().cloned() {
        index.add(id, vector.clone()).unwrap();
        for term in vector.indices() {
            assert!(index.get_candidates(*term).any(|d| *d == id));
        }
    }
}

#[test]
fn frequency_totals_do_not_depend_on_order() {
    let docs = vec![
        (1u32, v(4, &[(0, 1.0), (2, 3.0)])),
        (2, v(4, &[(0, 2.0)])),
        (3, v(4, &[(2, 0.5), (3, 1.0)])),
    ];
    let mut forward = InvertedIndex::new();
    for (id, vector) in docs.iter().cloned() {
        forward.add(id, vector).unwrap();
    }
    let mut backward = InvertedIndex::new();
    for (id, vector) in docs.iter().rev().cloned() {
        backward.add(id, vector).unwrap();
    }
    for term in 0..4 {
        assert_eq!(forward.document_frequency(term), backward.document_frequency(term));
    }
    assert_eq!(forward.document_frequency(0), Some(3.0));
    assert_eq!(forward.document_frequency(2), Some(3.5));
    assert_eq!(forward.document_frequency(1), None);
}

#[test]
fn higher_frequency_never_raises_idf() {
    // same corpus size, term 0 spread over more documents
    let mut rare: InvertedIndex<u32> = InvertedIndex::new();
    let mut common: InvertedIndex<u32> = InvertedIndex::new();
    for id in 0..4 {
        let in_rare = if id == 0 { v(2, &[(0, 1.0)]) } else { v(2, &[(1, 1.0)]) };
        let in_common = if id < 3 { v(2, &[(0, 1.0)]) } else { v(2, &[(1, 1.0)]) };
        rare.add(id, in_rare).unwrap();
        common.add(id, in_common).unwrap();
    }
    rare.cache_idfs();
    common.cache_idfs();
    assert!(common.idf(0) < rare.idf(0));

    // re-adding an existing id grows the total without growing the corpus
    let before = common.idf(0);
    common.add(0, v(2, &[(0, 2.0)])).unwrap();
    common.cache_idfs();
    assert!(common.idf(0) <= before);
}

#[test]
fn cache_idfs_is_idempotent() {
    let mut index = xy_index();
    let first: Vec<f64> = (0..3).map(|t| index.idf(t)).collect();
    index.cache_idfs();
    let second: Vec<f64> = (0..3).map(|t| index.idf(t)).collect();
    assert_eq!(first, second);
}

#[test]
fn candidate_missing_a_query_term_scores_zero() {
    let mut index: InvertedIndex<u32> = InvertedIndex::new();
    index.add(1, v(3, &[(A, 1.0)])).unwrap();
    index.add(2, v(3, &[(A, 1.0), (B, 1.0)])).unwrap();
    index.add(3, v(3, &[(C, 1.0)])).unwrap();
    index.add(4, v(3, &[(C, 1.0)])).unwrap();
    index.cache_idfs();
    assert!(index.idf(A) != 0.0 && index.idf(B) != 0.0);

    let hits = index.match_query(&v(3, &[(A, 1.0), (B, 1.0)]), None);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].doc_id, 2);
    assert!(hits[0].score > 0.0);
    assert_eq!(hits[1].doc_id, 1);
    assert_eq!(hits[1].score, 0.0);
}

#[test]
fn empty_query_scores_one_and_has_no_candidates() {
    let index = xy_index();
    let empty = SparseVector::empty(3);
    for id in ["X", "Y"] {
        let stored = index.vector(&id.to_string()).unwrap();
        assert_eq!(index.relevance(&empty, stored), 1.0);
    }
    assert!(index.match_query(&empty, None).is_empty());
}

#[test]
fn unknown_terms_give_no_candidates() {
    let index = xy_index();
    let query = v(5, &[(4, 1.0)]);
    for top_k in [None, Some(0), Some(1), Some(10)] {
        assert!(index.match_query(&query, top_k).is_empty());
    }
}

#[test]
fn oversized_top_k_returns_every_candidate() {
    for strategy in [
        SelectionStrategy::FullSortDescending,
        SelectionStrategy::UnstablePartitionTopK,
        SelectionStrategy::BoundedHeap,
    ] {
        let mut index = xy_index();
        index.set_selection(strategy);
        let hits = index.match_query(&v(3, &[(B, 1.0)]), Some(10));
        assert_eq!(hits.len(), 2, "{strategy:?}");
    }
}

#[test]
fn huge_top_k_is_clamped_to_candidates() {
    let expected = xy_index().match_query(&v(3, &[(B, 1.0)]), None);
    for strategy in [
        SelectionStrategy::FullSortDescending,
        SelectionStrategy::UnstablePartitionTopK,
        SelectionStrategy::BoundedHeap,
    ] {
        let index = xy_index().with_selection(strategy);
        for top_k in [usize::MAX, usize::MAX / 2, usize::MAX / 1024] {
            let hits = index.match_query(&v(3, &[(B, 1.0)]), Some(top_k));
            assert_eq!(hits.len(), 2, "{strategy:?} top_k = {top_k}");
            if strategy != SelectionStrategy::UnstablePartitionTopK {
                assert_eq!(hits, expected);
            }
        }
    }
}

#[test]
fn bounded_heap_keeps_best_k() {
    let mut index: InvertedIndex<u32> = InvertedIndex::new();
    for id in 0..10u32 {
        // term 0 weight grows with id; term 1 pads nnz so tf stays below one
        index.add(id, v(3, &[(0, (id + 1) as Weight), (1, 1.0)])).unwrap();
    }
    index.add(99, v(3, &[(2, 1.0)])).unwrap();
    index.cache_idfs();
    // idf(0) is negative here, so the smallest term-0 weights rank first
    let hits = index.match_query(&v(3, &[(0, 1.0)]), Some(3));
    assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![0, 1, 2]);
    let full = index.match_query(&v(3, &[(0, 1.0)]), None);
    assert_eq!(&full[..3], &hits[..]);
}

#[test]
fn legacy_partition_returns_all_candidates() {
    let mut index = xy_index().with_selection(SelectionStrategy::UnstablePartitionTopK);
    index.add("Z".to_string(), v(3, &[(B, 3.0), (C, 1.0)])).unwrap();
    index.cache_idfs();
    let hits = index.match_query(&v(3, &[(B, 1.0)]), Some(1));
    assert_eq!(hits.len(), 3);
    let mut scores: Vec<f64> = hits.iter().map(|h| h.score).collect();
    let kth = scores[1];
    scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(kth, scores[1]);
}

#[test]
fn persisted_index_matches_identically() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let mut index = xy_index();
    index.add("Z".to_string(), v(3, &[(A, 2.0), (B, 1.0), (C, 1.0)])).unwrap();
    index.cache_idfs();
    save_index(&paths, &index).unwrap();
    let restored = load_index(&paths, 3).unwrap();

    assert_eq!(restored.num_docs(), 3);
    for query in [v(3, &[(B, 1.0)]), v(3, &[(A, 1.0), (B, 1.0)]), v(3, &[(C, 1.0)])] {
        for top_k in [None, Some(1), Some(2)] {
            assert_eq!(index.match_query(&query, top_k), restored.match_query(&query, top_k));
        }
    }
}
