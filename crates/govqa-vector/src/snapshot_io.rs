//! Flat-file snapshot layout.
//!
//! A snapshot directory holds three parallel JSON arrays:
//! `chunks.json` (passage texts), `metadata.json` (`{category, source_file}`)
//! and `embeddings.json` (one float array per chunk).

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use govqa_core::error::{Error, Result};
use govqa_core::types::{CategorySet, ChunkMeta};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::corpus::CorpusSnapshot;

pub const CHUNKS_FILE: &str = "chunks.json";
pub const METADATA_FILE: &str = "metadata.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.json";

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    let reader = BufReader::new(fs::File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(())
}

pub fn read_chunks(dir: &Path) -> Result<Vec<String>> {
    read_json(&dir.join(CHUNKS_FILE))
}

pub fn read_metadata(dir: &Path) -> Result<Vec<ChunkMeta>> {
    read_json(&dir.join(METADATA_FILE))
}

pub fn read_embeddings(dir: &Path) -> Result<Vec<Vec<f32>>> {
    read_json(&dir.join(EMBEDDINGS_FILE))
}

pub fn write_embeddings(dir: &Path, embeddings: &[Vec<f32>]) -> Result<()> {
    write_json(&dir.join(EMBEDDINGS_FILE), embeddings)
}

/// Write all three files. Lengths are checked so a written directory always loads.
pub fn save_snapshot_files(
    dir: &Path,
    texts: &[String],
    metadata: &[ChunkMeta],
    embeddings: &[Vec<f32>],
) -> Result<()> {
    if texts.len() != metadata.len() || texts.len() != embeddings.len() {
        return Err(Error::SchemaMismatch(format!(
            "refusing to write {} texts, {} metadata entries, {} embeddings",
            texts.len(),
            metadata.len(),
            embeddings.len()
        )));
    }
    write_json(&dir.join(CHUNKS_FILE), texts)?;
    write_json(&dir.join(METADATA_FILE), metadata)?;
    write_embeddings(dir, embeddings)?;
    info!(dir = %dir.display(), chunks = texts.len(), "snapshot files written");
    Ok(())
}

/// Read the three files and build a validated snapshot.
pub fn load_snapshot_files(dir: &Path, categories: &CategorySet) -> Result<CorpusSnapshot> {
    let texts = read_chunks(dir)?;
    let metadata = read_metadata(dir)?;
    let embeddings = read_embeddings(dir)?;
    info!(dir = %dir.display(), chunks = texts.len(), "loading snapshot files");
    CorpusSnapshot::build(texts, metadata, embeddings, categories)
}
