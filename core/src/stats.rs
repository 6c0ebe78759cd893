use crate::{IndexError, TermId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-document and corpus-wide counts gathered in a single scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Distinct terms in first-seen order; position is the term id.
    pub vocabulary: Vec<String>,
    pub dictionary: HashMap<String, TermId>,
    /// Number of documents containing each term, indexed by term id.
    pub df: Vec<u32>,
    pub doc_lens: Vec<u32>,
    /// Term id -> occurrences, one table per document.
    pub term_freqs: Vec<HashMap<TermId, u32>>,
    pub avg_doc_len: f64,
}

impl CorpusStats {
    pub fn collect<D, S>(corpus: &[D]) -> Result<Self, IndexError>
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        if corpus.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }
        let n = corpus.len();
        let mut vocabulary: Vec<String> = Vec::new();
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut doc_lens: Vec<u32> = Vec::with_capacity(n);
        let mut term_freqs: Vec<HashMap<TermId, u32>> = Vec::with_capacity(n);
        let mut total_len: u64 = 0;

        for doc in corpus {
            let tokens: &[S] = doc.as_ref();
            let mut tf: HashMap<TermId, u32> = HashMap::new();
            for token in tokens {
                let token: &str = token.as_ref();
                let tid = match dictionary.get(token) {
                    Some(&tid) => tid,
                    None => {
                        let tid = vocabulary.len() as TermId;
                        vocabulary.push(token.to_string());
                        dictionary.insert(token.to_string(), tid);
                        df.push(0);
                        tid
                    }
                };
                *tf.entry(tid).or_insert(0) += 1;
            }
            // one increment per document, however often the term repeats
            for tid in tf.keys() {
                df[*tid as usize] += 1;
            }
            doc_lens.push(tokens.len() as u32);
            total_len += tokens.len() as u64;
            term_freqs.push(tf);
        }

        Ok(Self {
            vocabulary,
            dictionary,
            df,
            doc_lens,
            term_freqs,
            avg_doc_len: total_len as f64 / n as f64,
        })
    }

    pub fn num_docs(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.dictionary.get(term).map_or(0, |&tid| self.df[tid as usize])
    }

    pub fn term_freq(&self, term: &str, doc: usize) -> u32 {
        let Some(&tid) = self.dictionary.get(term) else { return 0 };
        self.term_freqs
            .get(doc)
            .and_then(|tf| tf.get(&tid))
            .copied()
            .unwrap_or(0)
    }
}
