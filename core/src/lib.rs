//! Static Okapi BM25 ranking index.
//!
//! A tokenized corpus is scanned once for term and length statistics, idf
//! values are computed with a floor for very common terms, and every
//! (term, document) BM25 contribution is precomputed into a weight matrix.
//! Queries then reduce to summing rows and ranking the totals. The matrix can
//! also be exported for scoring inside an external database.

pub mod error;
pub mod export;
pub mod idf;
pub mod index;
pub mod params;
pub mod persist;
pub mod rank;
pub mod stats;
pub mod tokenizer;
pub mod weights;

pub use error::IndexError;
pub use index::{Bm25Index, DocMeta};
pub use params::Bm25Params;

pub type TermId = u32;
