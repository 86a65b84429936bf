use std::env;
use std::sync::Arc;

use govqa_core::config::Config;
use govqa_core::settings::Settings;
use govqa_core::tables::CuratedTables;
use govqa_core::traits::Embedder;
use govqa_core::types::{Category, RankedResults, ScopeRequest};
use govqa_embed::get_default_embedder;
use govqa_hybrid::{IndexState, RetrievalEngine, TermOverlapReranker};
use govqa_lexical::{normalize, CategoryClassifier, QueryExpander};
use govqa_vector::load_snapshot_files;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: govqa <query|classify|expand|stats> [args...]
  query \"<text>\" [--k N] [--global | --category C] [--no-rerank] [--json]";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

struct QueryArgs {
    text: String,
    k: Option<usize>,
    scope: Option<ScopeRequest>,
    rerank: bool,
    json: bool,
}

fn parse_query_args(args: &[String]) -> anyhow::Result<QueryArgs> {
    let mut text = None; let mut k = None; let mut scope = None; let mut rerank = true; let mut json = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--k" | "-k" => { i += 1; k = Some(args.get(i).ok_or_else(|| anyhow::anyhow!("--k requires a number"))?.parse::<usize>()?); }
            "--global" => scope = Some(ScopeRequest::Global),
            "--category" | "-c" => { i += 1; scope = Some(ScopeRequest::Category(Category::new(args.get(i).ok_or_else(|| anyhow::anyhow!("--category requires a label"))?.as_str()))); }
            "--no-rerank" => rerank = false,
            "--json" => json = true,
            other if !other.starts_with('-') => text = Some(other.to_string()),
            other => anyhow::bail!("unknown flag {other}\n{USAGE}"),
        }
        i += 1;
    }
    let text = text.ok_or_else(|| anyhow::anyhow!("missing query text\n{USAGE}"))?;
    Ok(QueryArgs { text, k, scope, rerank, json })
}

fn load_engine(config: &Config, settings: &Settings, tables: &CuratedTables) -> anyhow::Result<RetrievalEngine> {
    let snapshot_dir = config.resolve_path(&settings.corpus.snapshot_dir);
    let snapshot = load_snapshot_files(&snapshot_dir, &tables.category_set())?;
    let state = IndexState::build(snapshot, tables, settings.retrieval.direct_match_boost)?;
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
    let engine = RetrievalEngine::new(state, embedder, settings.retrieval.clone())?
        .with_reranker(Arc::new(TermOverlapReranker));
    Ok(engine)
}

fn print_results(results: &RankedResults) {
    let status = &results.status;
    println!("scope: {:?}  hint: {}  ambiguous: {}  exhausted: {}  rerank: {:?}",
        status.scope, status.category_hint.as_ref().map_or("-", Category::as_str), status.ambiguous_category, status.scope_exhausted, status.rerank);
    for r in &results.results {
        let title = r.text.lines().next().unwrap_or_default();
        println!("{:>2}. [{}] {} ({})", r.rank, r.category, title, r.source_id);
        print!("    fused={:.3} semantic={:.3} title={:.3} keyword={:.2}", r.fused_score, r.semantic_score, r.title_score, r.keyword_score);
        match r.rerank_score { Some(s) => println!(" rerank={s:.3}"), None => println!() }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let tables = CuratedTables::load(&config.resolve_path(&settings.corpus.tables_path))?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "classify" => {
            let text = args.first().ok_or_else(|| anyhow::anyhow!("Usage: govqa classify \"<text>\""))?;
            let classifier = CategoryClassifier::new(&tables);
            let normalized = normalize(text);
            println!("{}", serde_json::to_string_pretty(&classifier.classify_detailed(&normalized))?);
            for (category, score) in classifier.scores(&normalized) { println!("  {category}: {score}"); }
        }
        "expand" => {
            let text = args.first().ok_or_else(|| anyhow::anyhow!("Usage: govqa expand \"<text>\""))?;
            for variant in QueryExpander::new(&tables).expand(&normalize(text)) { println!("{variant}"); }
        }
        "stats" => {
            let engine = load_engine(&config, &settings, &tables)?;
            println!("{}", serde_json::to_string_pretty(&engine.stats())?);
            println!("tables version: {}", engine.state().tables_version());
        }
        "query" => {
            let query = parse_query_args(&args)?;
            let engine = load_engine(&config, &settings, &tables)?;
            let scope = query.scope.unwrap_or_else(|| settings.retrieval.scope.clone());
            let results = if query.rerank && query.k.is_none() {
                engine.search_with_rerank_scoped(&query.text, &scope).await?
            } else {
                engine.search_scoped(&query.text, &scope, query.k.unwrap_or(settings.retrieval.final_k))?
            };
            if query.json { println!("{}", serde_json::to_string_pretty(&results)?); } else { print_results(&results); }
        }
        _ => { eprintln!("Unknown command: {}\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}
