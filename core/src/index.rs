use crate::idf::IdfTable;
use crate::rank::top_k;
use crate::stats::CorpusStats;
use crate::weights::WeightMatrix;
use crate::{Bm25Params, IndexError, TermId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-facing identity of a corpus document. The index itself only knows
/// documents by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
    pub title: Option<String>,
}

/// Immutable Okapi BM25 index over a tokenized corpus.
///
/// Built once; any corpus change means building a new one. Queries only read,
/// so a built index can be shared between threads without locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Index {
    params: Bm25Params,
    vocabulary: Vec<String>,
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    doc_lens: Vec<u32>,
    avg_doc_len: f64,
    idf: IdfTable,
    weights: WeightMatrix,
}

impl Bm25Index {
    pub fn build<D, S>(corpus: &[D]) -> Result<Self, IndexError>
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        Self::build_with_params(corpus, Bm25Params::default())
    }

    pub fn build_with_params<D, S>(corpus: &[D], params: Bm25Params) -> Result<Self, IndexError>
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        params.validate()?;
        let stats = CorpusStats::collect(corpus)?;
        let idf = IdfTable::compute(&stats, params.epsilon)?;
        let weights = WeightMatrix::build(&stats, &idf, &params);
        tracing::info!(
            num_docs = stats.num_docs(),
            num_terms = stats.vocabulary.len(),
            avg_doc_len = stats.avg_doc_len,
            "built bm25 index"
        );
        let CorpusStats { vocabulary, dictionary, df, doc_lens, avg_doc_len, .. } = stats;
        Ok(Self { params, vocabulary, dictionary, df, doc_lens, avg_doc_len, idf, weights })
    }

    /// Check that the tables agree on vocabulary and corpus size. Construction
    /// guarantees this; a deserialized index may not.
    pub fn check(&self) -> Result<(), IndexError> {
        let num_terms = self.vocabulary.len();
        if self.doc_lens.is_empty() {
            return Err(IndexError::Inconsistent("no documents"));
        }
        if self.df.len() != num_terms || self.idf.values.len() != num_terms {
            return Err(IndexError::Inconsistent("term table lengths differ"));
        }
        if !self.weights.has_shape(num_terms, self.doc_lens.len()) {
            return Err(IndexError::Inconsistent("weight matrix shape"));
        }
        if self.dictionary.len() != num_terms {
            return Err(IndexError::Inconsistent("dictionary size"));
        }
        let ids_match = self
            .dictionary
            .iter()
            .all(|(term, &tid)| self.vocabulary.get(tid as usize) == Some(term));
        if !ids_match {
            return Err(IndexError::Inconsistent("dictionary ids"));
        }
        Ok(())
    }

    /// Score every document against a bag of query terms.
    ///
    /// Each in-vocabulary term adds its weight row once per occurrence; unknown
    /// terms are skipped. Index `i` of the result is corpus document `i`.
    pub fn get_scores<S: AsRef<str>>(&self, query: &[S]) -> Vec<f64> {
        let mut scores = vec![0.0; self.num_docs()];
        for term in query {
            let term: &str = term.as_ref();
            if let Some(&tid) = self.dictionary.get(term) {
                for (score, w) in scores.iter_mut().zip(self.weights.row(tid as usize)) {
                    *score += w;
                }
            }
        }
        scores
    }

    /// Ranked `(doc index, score)` pairs, truncated to `k` when it is positive.
    pub fn topk<S: AsRef<str>>(&self, query: &[S], k: Option<usize>) -> Vec<(usize, f64)> {
        top_k(&self.get_scores(query), k)
    }

    pub fn params(&self) -> &Bm25Params {
        &self.params
    }

    pub fn num_docs(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn num_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }

    pub fn average_idf(&self) -> f64 {
        self.idf.average_idf
    }

    pub fn doc_len(&self, doc: usize) -> Option<u32> {
        self.doc_lens.get(doc).copied()
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.dictionary.get(term).map_or(0, |&tid| self.df[tid as usize])
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.dictionary.get(term).map(|&tid| self.idf.get(tid as usize))
    }

    /// Read-only view of one term's weight row.
    pub fn weights(&self, term: &str) -> Option<&[f64]> {
        self.dictionary.get(term).map(|&tid| self.weights.row(tid as usize))
    }

    /// Terms with their rows, in first-seen order.
    pub fn vocabulary(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.vocabulary.iter().map(String::as_str).zip(self.weights.rows())
    }
}
