use crate::{Bm25Index, Bm25Params, DocMeta};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub params: Bm25Params,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn for_index(index: &Bm25Index) -> Self {
        Self {
            num_docs: index.num_docs() as u32,
            num_terms: index.num_terms() as u32,
            params: *index.params(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    f.write_all(bytes)?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_index(paths: &IndexPaths, index: &Bm25Index) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(index)?;
    write_bytes(&paths.index(), &bytes)
}

pub fn load_index(paths: &IndexPaths) -> Result<Bm25Index> {
    let buf = read_bytes(&paths.index())?;
    let index: Bm25Index = bincode::deserialize(&buf)?;
    index.check()?;
    Ok(index)
}

pub fn save_docs(paths: &IndexPaths, docs: &[DocMeta]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(docs)?;
    write_bytes(&paths.docs(), &bytes)
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<DocMeta>> {
    let buf = read_bytes(&paths.docs())?;
    let docs = bincode::deserialize(&buf)?;
    Ok(docs)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_bytes(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let buf = read_bytes(&paths.meta())?;
    let meta: MetaFile = serde_json::from_slice(&buf)?;
    Ok(meta)
}

/// Persist an index together with its document metadata and a `meta.json` summary.
pub fn save_all(paths: &IndexPaths, index: &Bm25Index, docs: &[DocMeta]) -> Result<MetaFile> {
    if docs.len() != index.num_docs() {
        bail!("{} document records for an index of {} documents", docs.len(), index.num_docs());
    }
    save_index(paths, index)?;
    save_docs(paths, docs)?;
    let meta = MetaFile::for_index(index);
    save_meta(paths, &meta)?;
    Ok(meta)
}

/// Load everything needed to answer queries, checking the pieces agree.
pub fn load_all(paths: &IndexPaths) -> Result<(Bm25Index, Vec<DocMeta>, MetaFile)> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        bail!("unsupported index format version {}", meta.version);
    }
    let index = load_index(paths)?;
    let docs = load_docs(paths)?;
    if index.num_docs() != meta.num_docs as usize || docs.len() != index.num_docs() {
        bail!("index files in {} disagree on document count", paths.root.display());
    }
    Ok((index, docs, meta))
}
