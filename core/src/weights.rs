//! Dense term x document table of precomputed BM25 contributions.
//!
//! Memory is `O(|vocabulary| * N)`: one `f64` per term/document pair, stored
//! row-major so each term's row is a contiguous slice. This buys an O(1)
//! lookup per (term, document) at query time and is the scalability ceiling
//! of the index. For very large vocabularies or corpora a sparse row of
//! `(doc, weight)` pairs yields identical scores with far less memory.

use crate::idf::IdfTable;
use crate::stats::CorpusStats;
use crate::Bm25Params;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Per-document length normalization, `k1 * (1 - b + b * len / avg_len)`.
pub fn length_norms(doc_lens: &[u32], avg_doc_len: f64, params: &Bm25Params) -> Vec<f64> {
    doc_lens
        .iter()
        .map(|&len| params.k1 * (1.0 - params.b + params.b * len as f64 / avg_doc_len))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightMatrix {
    num_docs: usize,
    data: Vec<f64>,
}

impl WeightMatrix {
    pub fn build(stats: &CorpusStats, idf: &IdfTable, params: &Bm25Params) -> Self {
        let num_docs = stats.num_docs();
        let num_terms = stats.vocabulary.len();
        let hds = length_norms(&stats.doc_lens, stats.avg_doc_len, params);
        let mut data = vec![0.0; num_terms * num_docs];

        let fill_row = |(tid, row): (usize, &mut [f64])| {
            let idf = idf.get(tid);
            let tid = tid as u32;
            for (i, cell) in row.iter_mut().enumerate() {
                *cell = match stats.term_freqs[i].get(&tid) {
                    Some(&tf) => {
                        let tf = tf as f64;
                        idf * (tf * (params.k1 + 1.0)) / (tf + hds[i])
                    }
                    // also keeps 0/0 out of empty documents when b == 1
                    None => 0.0,
                };
            }
        };

        #[cfg(feature = "rayon")]
        data.par_chunks_mut(num_docs).enumerate().for_each(fill_row);
        #[cfg(not(feature = "rayon"))]
        data.chunks_mut(num_docs).enumerate().for_each(fill_row);

        tracing::debug!(num_terms, num_docs, cells = data.len(), "built weight matrix");
        Self { num_docs, data }
    }

    /// Assemble a matrix from rows already in term-id order, e.g. parsed from an export.
    pub fn from_rows(num_docs: usize, rows: impl IntoIterator<Item = Vec<f64>>) -> Option<Self> {
        let mut data = Vec::new();
        for row in rows {
            if row.len() != num_docs {
                return None;
            }
            data.extend(row);
        }
        Some(Self { num_docs, data })
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn has_shape(&self, num_terms: usize, num_docs: usize) -> bool {
        self.num_docs == num_docs && self.data.len() == num_terms * num_docs
    }

    pub fn num_terms(&self) -> usize {
        if self.num_docs == 0 { 0 } else { self.data.len() / self.num_docs }
    }

    pub fn row(&self, tid: usize) -> &[f64] {
        let start = tid * self.num_docs;
        &self.data[start..start + self.num_docs]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.num_docs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(corpus: &[Vec<&str>], params: Bm25Params) -> (CorpusStats, IdfTable, WeightMatrix) {
        let stats = CorpusStats::collect(corpus).unwrap();
        let idf = IdfTable::compute(&stats, params.epsilon).unwrap();
        let m = WeightMatrix::build(&stats, &idf, &params);
        (stats, idf, m)
    }

    #[test]
    fn length_norm_of_average_document_is_k1() {
        let p = Bm25Params::default();
        let hds = length_norms(&[2, 4, 6], 4.0, &p);
        assert!((hds[1] - 1.5).abs() < 1e-12);
        assert!((hds[0] - 1.5 * (0.25 + 0.75 * 0.5)).abs() < 1e-12);
        assert!((hds[2] - 1.5 * (0.25 + 0.75 * 1.5)).abs() < 1e-12);
    }

    #[test]
    fn every_term_has_a_full_row() {
        let (stats, _, m) = build(&[vec!["a", "b", "a"], vec!["b", "b", "c"], vec!["d"]], Bm25Params::default());
        assert_eq!(m.num_terms(), stats.vocabulary.len());
        assert_eq!(m.num_docs(), 3);
        assert!(m.rows().all(|r| r.len() == 3));
    }

    #[test]
    fn absent_terms_weigh_zero() {
        let corpus = vec![vec!["a", "b", "a"], vec!["b", "b", "c"], vec!["d", "e"]];
        let (stats, _, m) = build(&corpus, Bm25Params::default());
        for (tid, term) in stats.vocabulary.iter().enumerate() {
            for (i, doc) in corpus.iter().enumerate() {
                if !doc.contains(&term.as_str()) {
                    assert_eq!(m.row(tid)[i], 0.0, "{term} in doc {i}");
                }
            }
        }
    }

    #[test]
    fn cell_matches_bm25_formula() {
        let p = Bm25Params::default();
        let corpus = vec![vec!["a", "b", "a"], vec!["c"], vec!["d", "e"]];
        let (stats, idf, m) = build(&corpus, p);
        let a = stats.dictionary["a"] as usize;
        let hd0 = p.k1 * (1.0 - p.b + p.b * 3.0 / 2.0);
        let expected = idf.get(a) * (2.0 * (p.k1 + 1.0)) / (2.0 + hd0);
        assert!((m.row(a)[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn b_zero_ignores_length() {
        let p = Bm25Params { b: 0.0, ..Default::default() };
        let (stats, _, m) = build(
            &[vec!["x", "y", "z", "w"], vec!["x"], vec!["q"], vec!["r"], vec!["s"], vec!["t"]],
            p,
        );
        let x = m.row(stats.dictionary["x"] as usize);
        assert!(x[0] > 0.0);
        assert!((x[0] - x[1]).abs() < 1e-12);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        assert!(WeightMatrix::from_rows(2, vec![vec![1.0, 2.0], vec![3.0]]).is_none());
        let m = WeightMatrix::from_rows(2, vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.row(1), &[3.0, 4.0]);
    }

    fn cellwise(stats: &CorpusStats, idf: &IdfTable, p: &Bm25Params) -> Vec<Vec<f64>> {
        let hds = length_norms(&stats.doc_lens, stats.avg_doc_len, p);
        (0..stats.vocabulary.len())
            .map(|tid| {
                (0..stats.num_docs())
                    .map(|i| {
                        let tf = stats.term_freqs[i].get(&(tid as u32)).copied().unwrap_or(0) as f64;
                        if tf == 0.0 { 0.0 } else { idf.get(tid) * (tf * (p.k1 + 1.0)) / (tf + hds[i]) }
                    })
                    .collect()
            })
            .collect()
    }

    fn synthetic(docs: usize) -> Vec<Vec<String>> {
        (0..docs)
            .map(|d| (0..(d % 13) + 1).map(|i| format!("t{}", (d * 31 + i * 7) % 97)).collect())
            .collect()
    }

    #[test]
    fn build_matches_cellwise_reference() {
        let p = Bm25Params::default();
        let corpus = synthetic(40);
        let stats = CorpusStats::collect(&corpus).unwrap();
        let idf = IdfTable::compute(&stats, p.epsilon).unwrap();
        let m = WeightMatrix::build(&stats, &idf, &p);
        for (tid, expected) in cellwise(&stats, &idf, &p).iter().enumerate() {
            assert_eq!(m.row(tid), expected.as_slice());
        }
    }

    // Run with `cargo test -p okapi-core --features rayon`.
    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_build_matches_cellwise_reference() {
        let p = Bm25Params { k1: 1.2, b: 0.6, epsilon: 0.3 };
        let corpus = synthetic(1500);
        let stats = CorpusStats::collect(&corpus).unwrap();
        let idf = IdfTable::compute(&stats, p.epsilon).unwrap();
        let m = WeightMatrix::build(&stats, &idf, &p);
        assert!(m.has_shape(stats.vocabulary.len(), 1500));
        for (tid, expected) in cellwise(&stats, &idf, &p).iter().enumerate() {
            assert_eq!(m.row(tid), expected.as_slice());
        }
    }
}
