use log::debug;
use quarry_document_store::StoreHit;
use quarry_protocol::Candidate;
use quarry_protocol::RankedResult;
use quarry_protocol::StrategyKind;
use std::cmp::Ordering;

/// Re-ranks vector candidates with a capped bonus for query-token matches.
///
/// `fused = vector_score + match_fraction * boost_weight`, where
/// `match_fraction` is the share of query tokens found as substrings of the
/// hit's title and full content. The boost never exceeds `boost_weight`.
#[derive(Debug, Clone, Copy)]
pub struct HybridReranker {
    boost_weight: f32,
}

impl HybridReranker {
    pub fn new(boost_weight: f32) -> Self {
        Self { boost_weight }
    }

    pub fn boost_weight(&self) -> f32 {
        self.boost_weight
    }

    /// Re-rank vector `hits` and keep the best `limit`.
    ///
    /// Matching runs on the untruncated content; the returned candidates
    /// carry the usual bounded excerpt. The sort is stable, so hits with
    /// equal fused scores keep their vector order.
    pub fn rerank(&self, query: &str, hits: Vec<StoreHit>, limit: usize) -> Vec<RankedResult> {
        let tokens = query_tokens(query);
        debug!(
            "Re-ranking {} candidates with {} query tokens",
            hits.len(),
            tokens.len()
        );

        let mut ranked: Vec<RankedResult> = hits
            .into_iter()
            .map(|hit| {
                let fraction = match_fraction(&tokens, &hit.title, &hit.content);
                let score = hit.score.unwrap_or(0.0);
                RankedResult {
                    fused_score: score + fraction * self.boost_weight,
                    candidate: Candidate::new(
                        hit.id,
                        hit.title,
                        &hit.content,
                        score,
                        StrategyKind::Vector,
                    ),
                    rank: 0,
                }
            })
            .collect();

        sort_by_fused_score(&mut ranked);
        ranked.truncate(limit);
        assign_ranks(&mut ranked);
        ranked
    }
}

/// Whitespace-separated, case-folded query tokens.
pub fn query_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Share of `tokens` that occur in `title` or `content`.
pub fn match_fraction(tokens: &[String], title: &str, content: &str) -> f32 {
    if tokens.is_empty() {
        return 0.0;
    }

    let haystack = format!("{title} {content}").to_lowercase();
    let matched = tokens
        .iter()
        .filter(|token| haystack.contains(token.as_str()))
        .count();

    matched as f32 / tokens.len() as f32
}

pub(crate) fn sort_by_fused_score(results: &mut [RankedResult]) {
    results.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(Ordering::Equal)
    });
}

pub(crate) fn assign_ranks(results: &mut [RankedResult]) {
    for (rank, result) in results.iter_mut().enumerate() {
        result.rank = rank;
    }
}
