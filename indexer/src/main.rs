use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use okapi_core::export::{export_wsmap, WsmapTable};
use okapi_core::persist::{load_all, save_all, IndexPaths};
use okapi_core::tokenizer::{tokenize, tokenize_value};
use okapi_core::{Bm25Index, Bm25Params, DocMeta};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: serde_json::Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: serde_json::Value,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, export and query an Okapi BM25 index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Term-frequency saturation
        #[arg(long, default_value_t = 1.5)]
        k1: f64,
        /// Length normalization strength
        #[arg(long, default_value_t = 0.75)]
        b: f64,
        /// Floor for common terms, as a fraction of the average idf
        #[arg(long, default_value_t = 0.25)]
        epsilon: f64,
    },
    /// Write the term/document weight matrix as `word;vl` CSV
    Export {
        #[arg(long)]
        index: String,
        #[arg(long)]
        output: String,
    },
    /// Rank documents for a free-text query
    Query {
        /// Index directory
        #[arg(long, conflicts_with = "wsmap", required_unless_present = "wsmap")]
        index: Option<String>,
        /// Score against an exported weight matrix instead of an index directory
        #[arg(long)]
        wsmap: Option<String>,
        #[arg(long)]
        q: String,
        /// Number of results, 0 for the full ranking
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, k1, b, epsilon } => {
            build_index(&input, &output, Bm25Params { k1, b, epsilon })
        }
        Commands::Export { index, output } => {
            let (index, _, _) = load_all(&IndexPaths::new(&index))?;
            export_wsmap(&index, &output)
        }
        Commands::Query { index, wsmap, q, k } => run_query(index.as_deref(), wsmap.as_deref(), &q, k),
    }
}

fn build_index(input: &str, output: &str, params: Bm25Params) -> Result<()> {
    let input_path = Path::new(input);
    let out_paths = IndexPaths::new(output);

    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input {input} does not exist");
    }

    // Corpus order is the document index space, so it follows file and line order.
    let mut corpus: Vec<Vec<String>> = Vec::new();
    let mut docs: Vec<DocMeta> = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut corpus, &mut docs)?;
        } else {
            read_json(&file, &mut corpus, &mut docs)?;
        }
    }
    tracing::info!(num_docs = corpus.len(), "ingested documents");

    let index = Bm25Index::build_with_params(&corpus, params)?;
    let meta = save_all(&out_paths, &index, &docs)?;

    tracing::info!(output, num_docs = meta.num_docs, num_terms = meta.num_terms, "index build complete");
    Ok(())
}

fn read_jsonl(file: &Path, corpus: &mut Vec<Vec<String>>, docs: &mut Vec<DocMeta>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)?;
        ingest_doc(doc, corpus, docs);
    }
    Ok(())
}

fn read_json(file: &Path, corpus: &mut Vec<Vec<String>>, docs: &mut Vec<DocMeta>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                ingest_doc(doc, corpus, docs);
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            ingest_doc(doc, corpus, docs);
        }
        _ => tracing::warn!(file = %file.display(), "skipping file without document objects"),
    }
    Ok(())
}

fn ingest_doc(doc: InputDoc, corpus: &mut Vec<Vec<String>>, docs: &mut Vec<DocMeta>) {
    let external_id = match doc.id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    corpus.push(tokenize_value(&doc.body));
    docs.push(DocMeta { external_id, title: doc.title });
}

fn run_query(index: Option<&str>, wsmap: Option<&str>, q: &str, k: usize) -> Result<()> {
    let terms = tokenize(q);
    let k = Some(k);
    match (index, wsmap) {
        (Some(dir), _) => {
            let (index, docs, _) = load_all(&IndexPaths::new(dir))?;
            for (rank, (doc, score)) in index.topk(&terms, k).into_iter().enumerate() {
                println!("{}: {} {} {:.6}", rank + 1, doc, docs[doc].external_id, score);
            }
        }
        (None, Some(csv)) => {
            let table = WsmapTable::open(csv)?;
            for (rank, (doc, score)) in table.topk(&terms, k).into_iter().enumerate() {
                println!("{}: {} {:.6}", rank + 1, doc, score);
            }
        }
        (None, None) => bail!("either --index or --wsmap is required"),
    }
    Ok(())
}
