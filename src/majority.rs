//! Majority-vote resolution of dominant pass orderings
//!
//! Each repeated sweep contributes one `best_order` vote per (benchmark,
//! variant). The tie-break averages, per candidate, the summary's best
//! median when the candidate won it and its worst median otherwise. That
//! proxy mixes a winner's best case with a non-winner's worst case without
//! normalization; it is preserved for compatibility but is a candidate for
//! revision.

use std::collections::HashMap;

use crate::summary::{SweepSummary, VariantSummary};

/// Dominant ordering per (benchmark, variant), in key-encounter order
pub type DominantOrders = Vec<((String, String), String)>;

/// Resolve the dominant pass ordering for every key across repeated sweeps
///
/// Deterministic: identical inputs yield identical outputs, including
/// tie-break results.
pub fn resolve_dominant_orders(summaries: &[SweepSummary]) -> DominantOrders {
    let mut key_order: Vec<(String, String)> = Vec::new();
    let mut by_pair: HashMap<(String, String), Vec<&VariantSummary>> = HashMap::new();
    for summary in summaries {
        for row in &summary.variant_stats {
            let key = (row.benchmark.clone(), row.variant.clone());
            if !by_pair.contains_key(&key) {
                key_order.push(key.clone());
            }
            by_pair.entry(key).or_default().push(row);
        }
    }

    key_order
        .into_iter()
        .map(|key| {
            let rows = &by_pair[&key];
            let dominant = resolve_one(rows);
            (key, dominant)
        })
        .collect()
}

/// Resolve one key's dominant ordering from its per-summary rows
fn resolve_one(rows: &[&VariantSummary]) -> String {
    // Tally one vote per summary, keeping first-appearance order.
    let mut votes: Vec<(String, usize)> = Vec::new();
    for row in rows {
        match votes.iter_mut().find(|(order, _)| *order == row.best_order) {
            Some((_, count)) => *count += 1,
            None => votes.push((row.best_order.clone(), 1)),
        }
    }

    let majority = votes.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let candidates: Vec<&String> = votes
        .iter()
        .filter(|(_, count)| *count == majority)
        .map(|(order, _)| order)
        .collect();
    if candidates.len() == 1 {
        return candidates[0].clone();
    }

    // Tie-break: lowest average of (own best median where the candidate won,
    // else that summary's worst median). Strict comparison keeps the first
    // candidate on a residual tie.
    let mut best_order = candidates[0].clone();
    let mut best_value = f64::INFINITY;
    for candidate in candidates {
        let sum: f64 = rows
            .iter()
            .map(|row| {
                if row.best_order == *candidate {
                    row.best_median_ms
                } else {
                    row.worst_median_ms
                }
            })
            .sum();
        let avg = sum / rows.len() as f64;
        if avg < best_value {
            best_value = avg;
            best_order = candidate.clone();
        }
    }
    best_order
}
