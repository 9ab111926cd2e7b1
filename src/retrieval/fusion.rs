//! Reciprocal Rank Fusion for combining dense and sparse result lists.

use std::collections::HashMap;

use crate::vector::ScoredResult;

/// RRF damping constant, the conventional default. Higher values flatten
/// the contribution of top ranks.
pub const RRF_K: f32 = 60.0;

/// Fuse two ranked lists: each candidate scores `sum(1 / (k + rank))` over
/// the lists it appears in, rank starting at 1. Ties are broken by the
/// candidate's dense rank (sparse-only candidates sort after dense ones at
/// equal score), then by id, so repeated runs over the same inputs produce
/// the same order.
pub fn reciprocal_rank_fusion(
    dense: Vec<ScoredResult>,
    sparse: Vec<ScoredResult>,
    limit: usize,
) -> Vec<ScoredResult> {
    struct Candidate {
        result: ScoredResult,
        fused_score: f32,
        dense_rank: usize,
    }

    let mut candidates: HashMap<String, Candidate> = HashMap::new();

    for (rank, result) in dense.into_iter().enumerate() {
        let rrf = 1.0 / (RRF_K + (rank + 1) as f32);
        candidates.insert(
            result.id.clone(),
            Candidate {
                result,
                fused_score: rrf,
                dense_rank: rank,
            },
        );
    }

    for (rank, result) in sparse.into_iter().enumerate() {
        let rrf = 1.0 / (RRF_K + (rank + 1) as f32);
        candidates
            .entry(result.id.clone())
            .and_modify(|candidate| candidate.fused_score += rrf)
            .or_insert(Candidate {
                result,
                fused_score: rrf,
                dense_rank: usize::MAX,
            });
    }

    let mut fused: Vec<Candidate> = candidates.into_values().collect();
    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.dense_rank.cmp(&b.dense_rank))
            .then_with(|| a.result.id.cmp(&b.result.id))
    });
    fused.truncate(limit);

    fused
        .into_iter()
        .map(|candidate| ScoredResult {
            score: candidate.fused_score,
            ..candidate.result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DocMetadata;

    fn hit(id: &str) -> ScoredResult {
        ScoredResult {
            id: id.to_string(),
            score: 0.0,
            metadata: DocMetadata {
                title: String::new(),
                context: format!("context for {id}"),
                question: String::new(),
                answer: String::new(),
                has_answer: false,
            },
        }
    }

    fn hits(ids: &[&str]) -> Vec<ScoredResult> {
        ids.iter().map(|id| hit(id)).collect()
    }

    fn order(results: &[ScoredResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn both_list_candidates_outrank_single_list_candidates() {
        // A (dense 1, sparse 2) and B (dense 2, sparse 1) sum the same
        // pair of reciprocal ranks, so they tie on score and A wins the
        // dense-rank tie-break. C and D each appear once and trail.
        let fused = reciprocal_rank_fusion(hits(&["A", "B", "C"]), hits(&["B", "A", "D"]), 10);
        let ids = order(&fused);
        assert_eq!(ids[0], "A");
        assert_eq!(ids[1], "B");
        assert!(ids[2..].contains(&"C"));
        assert!(ids[2..].contains(&"D"));
        assert!((fused[0].score - fused[1].score).abs() < f32::EPSILON);
        assert!(fused[1].score > fused[2].score);
    }

    #[test]
    fn fusion_is_deterministic() {
        let first = reciprocal_rank_fusion(hits(&["A", "B", "C"]), hits(&["B", "A", "D"]), 10);
        let second = reciprocal_rank_fusion(hits(&["A", "B", "C"]), hits(&["B", "A", "D"]), 10);
        assert_eq!(order(&first), order(&second));
    }

    #[test]
    fn scores_are_non_increasing() {
        let fused = reciprocal_rank_fusion(hits(&["A", "B", "C"]), hits(&["C", "B", "A"]), 10);
        for pair in fused.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn truncates_to_limit() {
        let fused = reciprocal_rank_fusion(hits(&["A", "B", "C"]), hits(&["D", "E", "F"]), 2);
        assert_eq!(fused.len(), 2);
    }

    #[test]
    fn dense_rank_breaks_ties_ahead_of_sparse_only_candidates() {
        // A: dense rank 1 only; D: sparse rank 1 only. Equal scores, the
        // dense hit sorts first.
        let fused = reciprocal_rank_fusion(hits(&["A"]), hits(&["D"]), 10);
        assert_eq!(order(&fused), vec!["A", "D"]);
    }

    #[test]
    fn single_list_keeps_its_order() {
        let fused = reciprocal_rank_fusion(hits(&["A", "B", "C"]), Vec::new(), 10);
        assert_eq!(order(&fused), vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_lists_fuse_to_nothing() {
        let fused = reciprocal_rank_fusion(Vec::new(), Vec::new(), 10);
        assert!(fused.is_empty());
    }

    #[test]
    fn fused_score_matches_the_formula() {
        let fused = reciprocal_rank_fusion(hits(&["A"]), hits(&["A"]), 10);
        let expected = 1.0 / (RRF_K + 1.0) + 1.0 / (RRF_K + 1.0);
        assert!((fused[0].score - expected).abs() < 1e-6);
    }
}
