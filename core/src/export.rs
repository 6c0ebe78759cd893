//! Weight-matrix export for bulk loading into a relational store.
//!
//! The format is `;`-separated CSV with a `word;vl` header, one row per term,
//! the weight vector written as an array literal:
//!
//! ```text
//! word;vl
//! "fox";{0.0,1.23,0.0}
//! ```
//!
//! Postgres loads it with `COPY <table> FROM '<file>' DELIMITER ';' CSV HEADER;`.
//! Double quotes inside a term are written as single quotes, so such terms do
//! not survive a round trip unchanged, and two terms differing only in `"`
//! versus `'` share a key. Line breaks inside a term stay inside the quoted
//! field, which CSV readers (and [`read_wsmap`]) accept across lines.

use crate::rank::top_k;
use crate::weights::WeightMatrix;
use crate::Bm25Index;
use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const HEADER: &str = "word;vl";

fn write_row<W: Write>(out: &mut W, term: &str, row: &[f64]) -> std::io::Result<()> {
    write!(out, "\"{}\";{{", term.replace('"', "'"))?;
    for (i, w) in row.iter().enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        }
        write!(out, "{w:?}")?;
    }
    out.write_all(b"}\n")
}

pub fn write_wsmap<W: Write>(index: &Bm25Index, out: &mut W) -> Result<()> {
    writeln!(out, "{HEADER}")?;
    for (term, row) in index.vocabulary() {
        write_row(out, term, row)?;
    }
    Ok(())
}

pub fn export_wsmap<P: AsRef<Path>>(index: &Bm25Index, path: P) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(f);
    write_wsmap(index, &mut out)?;
    out.flush()?;
    tracing::info!(path = %path.display(), num_terms = index.num_terms(), "exported weight matrix");
    Ok(())
}

fn parse_row(line: &str) -> Result<(String, Vec<f64>)> {
    let rest = line.strip_prefix('"').ok_or_else(|| anyhow!("term is not quoted"))?;
    let close = rest.find('"').ok_or_else(|| anyhow!("unterminated term"))?;
    let term = &rest[..close];
    let vector = rest[close + 1..]
        .strip_prefix(';')
        .ok_or_else(|| anyhow!("missing ';' separator"))?
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .ok_or_else(|| anyhow!("weights are not brace delimited"))?;
    let weights = if vector.is_empty() {
        Vec::new()
    } else {
        vector
            .split(',')
            .map(|w| w.trim().parse::<f64>().with_context(|| format!("bad weight {w:?}")))
            .collect::<Result<Vec<_>>>()?
    };
    Ok((term.to_string(), weights))
}

/// Split off one record. The quoted term may span lines; the record ends at
/// the first line break after the closing quote.
fn split_record(input: &str) -> Result<(&str, &str)> {
    let search_from = match input.strip_prefix('"') {
        Some(rest) => 1 + rest.find('"').ok_or_else(|| anyhow!("unterminated term"))?,
        None => 0,
    };
    match input[search_from..].find('\n') {
        Some(end) => Ok((&input[..search_from + end], &input[search_from + end + 1..])),
        None => Ok((input, "")),
    }
}

/// Parse an export back into `(term, weights)` rows in file order.
pub fn read_wsmap<R: BufRead>(mut reader: R) -> Result<Vec<(String, Vec<f64>)>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let (header, mut rest) = text.split_once('\n').unwrap_or((text.as_str(), ""));
    if header.trim_end() != HEADER {
        bail!("missing {HEADER:?} header");
    }
    let mut rows: Vec<(String, Vec<f64>)> = Vec::new();
    let mut line = 2;
    loop {
        let trimmed = rest.trim_start();
        line += rest[..rest.len() - trimmed.len()].matches('\n').count();
        if trimmed.is_empty() {
            break;
        }
        let (record, next) = split_record(trimmed).with_context(|| format!("line {line}"))?;
        let row = parse_row(record.trim_end()).with_context(|| format!("line {line}"))?;
        if let Some((_, first)) = rows.first() {
            if first.len() != row.1.len() {
                bail!("line {line}: expected {} weights, found {}", first.len(), row.1.len());
            }
        }
        rows.push(row);
        line += record.matches('\n').count() + 1;
        rest = next;
    }
    Ok(rows)
}

pub fn import_wsmap<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Vec<f64>)>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_wsmap(BufReader::new(f))
}

/// Scorer over an imported export, mirroring what the database-side function
/// must do: sum matching rows, rank descending, break ties by document index.
#[derive(Debug)]
pub struct WsmapTable {
    terms: HashMap<String, usize>,
    matrix: WeightMatrix,
}

impl WsmapTable {
    /// Rows sharing a key (terms that only differed by quote style before
    /// export) are summed element-wise, as a consumer summing every matching
    /// row would.
    pub fn from_rows(rows: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let num_docs = rows.first().map_or(0, |(_, w)| w.len());
        let mut terms: HashMap<String, usize> = HashMap::with_capacity(rows.len());
        let mut weights: Vec<Vec<f64>> = Vec::with_capacity(rows.len());
        for (term, row) in rows {
            if row.len() != num_docs {
                bail!("term {term:?} holds {} weights, expected {num_docs}", row.len());
            }
            match terms.get(&term) {
                Some(&tid) => {
                    for (acc, w) in weights[tid].iter_mut().zip(&row) {
                        *acc += w;
                    }
                }
                None => {
                    terms.insert(term, weights.len());
                    weights.push(row);
                }
            }
        }
        let matrix = WeightMatrix::from_rows(num_docs, weights)
            .ok_or_else(|| anyhow!("rows must all hold {num_docs} weights"))?;
        Ok(Self { terms, matrix })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_rows(import_wsmap(path)?)
    }

    pub fn num_docs(&self) -> usize {
        self.matrix.num_docs()
    }

    pub fn weights(&self, term: &str) -> Option<&[f64]> {
        self.terms.get(term).map(|&tid| self.matrix.row(tid))
    }

    pub fn get_scores<S: AsRef<str>>(&self, query: &[S]) -> Vec<f64> {
        let mut scores = vec![0.0; self.num_docs()];
        for row in query.iter().filter_map(|t| self.weights(t.as_ref())) {
            for (score, w) in scores.iter_mut().zip(row) {
                *score += w;
            }
        }
        scores
    }

    pub fn topk<S: AsRef<str>>(&self, query: &[S], k: Option<usize>) -> Vec<(usize, f64)> {
        top_k(&self.get_scores(query), k)
    }
}
