use crate::stats::CorpusStats;
use crate::IndexError;
use serde::{Deserialize, Serialize};

/// Unsmoothed Robertson/Sparck Jones idf. Negative once a term occurs in more
/// than half of the documents.
#[inline]
pub fn raw_idf(num_docs: usize, df: u32) -> f64 {
    let n = num_docs as f64;
    let df = df as f64;
    (n - df + 0.5).ln() - (df + 0.5).ln()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdfTable {
    /// Indexed by term id.
    pub values: Vec<f64>,
    /// Mean of the raw (unfloored) values.
    pub average_idf: f64,
    /// Value substituted for every negative raw idf.
    pub floor: f64,
    pub floored_terms: usize,
}

impl IdfTable {
    /// Compute idf for every vocabulary term, replacing negative values with
    /// `epsilon * average_idf`. The floor is derived from the raw values only.
    pub fn compute(stats: &CorpusStats, epsilon: f64) -> Result<Self, IndexError> {
        if stats.df.is_empty() {
            return Err(IndexError::EmptyVocabulary);
        }
        let n = stats.num_docs();
        let mut values = Vec::with_capacity(stats.df.len());
        let mut negative = Vec::new();
        let mut idf_sum = 0.0;
        for (tid, &df) in stats.df.iter().enumerate() {
            let idf = raw_idf(n, df);
            idf_sum += idf;
            if idf < 0.0 {
                negative.push(tid);
            }
            values.push(idf);
        }
        let average_idf = idf_sum / values.len() as f64;
        let floor = epsilon * average_idf;
        for &tid in &negative {
            values[tid] = floor;
        }
        tracing::debug!(
            num_terms = values.len(),
            average_idf,
            floor,
            floored = negative.len(),
            "computed idf table"
        );
        Ok(Self { values, average_idf, floor, floored_terms: negative.len() })
    }

    pub fn get(&self, tid: usize) -> f64 {
        self.values[tid]
    }
}
