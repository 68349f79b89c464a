use crate::rerank::assign_ranks;
use crate::rerank::sort_by_fused_score;
use log::debug;
use quarry_protocol::Candidate;
use quarry_protocol::RankedResult;
use std::collections::HashMap;

/// Reciprocal Rank Fusion (RRF)
/// RRF(d) = Σ 1 / (k + rank(d))
/// where k is a constant (typically 60) and rank(d) is the 1-based rank of
/// document d in each list that contains it.
///
/// Results scoring below `1 / (k + depth)` are dropped. Ties keep
/// first-seen order, vector list first.
pub fn reciprocal_rank_fusion(
    vector_results: Vec<Candidate>,
    keyword_results: Vec<Candidate>,
    k: f32,
    depth: usize,
    limit: usize,
) -> Vec<RankedResult> {
    debug!(
        "RRF fusion: {} vector + {} keyword",
        vector_results.len(),
        keyword_results.len()
    );

    let mut order: Vec<RankedResult> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for list in [vector_results, keyword_results] {
        for (rank, candidate) in list.into_iter().enumerate() {
            let rrf_score = 1.0 / (k + rank as f32 + 1.0);
            match positions.get(&candidate.id) {
                Some(&pos) => order[pos].fused_score += rrf_score,
                None => {
                    positions.insert(candidate.id.clone(), order.len());
                    order.push(RankedResult {
                        candidate,
                        fused_score: rrf_score,
                        rank: 0,
                    });
                }
            }
        }
    }

    let threshold = 1.0 / (k + depth as f32);
    order.retain(|result| result.fused_score >= threshold);

    sort_by_fused_score(&mut order);
    order.truncate(limit);
    assign_ranks(&mut order);

    debug!("RRF produced {} results", order.len());
    order
}
