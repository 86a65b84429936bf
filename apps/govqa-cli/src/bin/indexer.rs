use std::{env, path::PathBuf};

use govqa_core::config::Config;
use govqa_core::error::Error;
use govqa_core::tables::CuratedTables;
use govqa_embed::get_default_embedder;
use govqa_vector::load_snapshot_files;
use govqa_vector::snapshot_io::{read_chunks, read_metadata, write_embeddings};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_BATCH: usize = 64;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut snapshot_dir = None; let mut batch = DEFAULT_BATCH;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--batch" | "-b" => { i += 1; batch = args.get(i).and_then(|b| b.parse::<usize>().ok()).filter(|b| *b > 0).ok_or_else(|| anyhow::anyhow!("--batch requires a positive number"))?; }
        _ if !args[i].starts_with('-') => snapshot_dir = Some(PathBuf::from(&args[i])), other => anyhow::bail!("unknown flag {other}") } i += 1; }
    let snapshot_dir = snapshot_dir.unwrap_or_else(|| config.resolve_path(&settings.corpus.snapshot_dir));

    println!("govqa embedding indexer\n=======================");
    println!("Snapshot directory: {}", snapshot_dir.display());
    let texts = read_chunks(&snapshot_dir)?;
    let metadata = read_metadata(&snapshot_dir)?;
    if texts.len() != metadata.len() {
        return Err(Error::SchemaMismatch(format!("{} chunks but {} metadata entries", texts.len(), metadata.len())).into());
    }

    let embedder = get_default_embedder(&settings.embedding)?;
    info!(chunks = texts.len(), dim = embedder.dim(), batch, "embedding chunks");
    let bar = ProgressBar::new(texts.len() as u64);
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} chunks ({eta})")?);
    let mut embeddings = Vec::with_capacity(texts.len());
    for window in texts.chunks(batch) {
        embeddings.extend(embedder.embed_batch(window)?);
        bar.inc(window.len() as u64);
    }
    bar.finish();
    write_embeddings(&snapshot_dir, &embeddings)?;

    let tables_path = config.resolve_path(&settings.corpus.tables_path);
    let tables = CuratedTables::load(&tables_path)?;
    let stats = load_snapshot_files(&snapshot_dir, &tables.category_set())?.stats();
    println!("\n✅ Wrote {} embeddings of dimension {}", embeddings.len(), embedder.dim());
    println!("📊 {} chunks from {} documents", stats.total_chunks, stats.total_documents);
    for (category, count) in &stats.categories { println!("   {category}: {count}"); }
    println!("\n💡 To search, use: cargo run --bin govqa query '<query>'");
    Ok(())
}
