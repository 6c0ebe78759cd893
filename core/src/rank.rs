use std::cmp::Ordering;

/// Rank documents by score, highest first.
///
/// The sort is stable over ascending document index, so equal scores keep
/// index order. `Some(k)` with `k > 0` truncates to the first `k` entries;
/// `None` or `Some(0)` returns the full ranking.
pub fn top_k(scores: &[f64], k: Option<usize>) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    if let Some(k) = k.filter(|&k| k > 0) {
        ranked.truncate(k);
    }
    ranked
}
