use std::fs;

use tempfile::TempDir;

use govqa_core::config::{resolve_with_base, Config};
use govqa_core::settings::{FusionConfig, FusionPreset, FusionWeights};
use govqa_core::tables::CuratedTables;
use govqa_core::types::ScopeRequest;

#[test]
fn load_without_files_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path(), "none").expect("load");
    let settings = config.settings().expect("settings");

    assert_eq!(settings.retrieval.initial_k, 20);
    assert_eq!(settings.retrieval.final_k, 5);
    assert_eq!(settings.retrieval.fusion.weights(), FusionWeights::DEFAULT);
    assert_eq!(settings.retrieval.scope, ScopeRequest::Auto);
}

#[test]
fn env_file_overrides_base_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[retrieval]\ninitial_k = 30\nfinal_k = 4\nfusion = \"blended\"\n",
    )
    .unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[retrieval]\nfinal_k = 3\n").unwrap();

    let config = Config::load_from(tmp.path(), "test").expect("load");
    let settings = config.settings().expect("settings");

    assert_eq!(settings.retrieval.initial_k, 30);
    assert_eq!(settings.retrieval.final_k, 3, "config.test.toml wins over config.toml");
    assert_eq!(settings.retrieval.fusion, FusionConfig::Preset(FusionPreset::Blended));
    let final_k: usize = config.get("retrieval.final_k").unwrap();
    assert_eq!(final_k, 3);
}

#[test]
fn explicit_weights_parse() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[retrieval.fusion]\nsemantic = 0.45\ntitle = 0.35\nkeyword = 0.2\n",
    )
    .unwrap();
    let settings = Config::load_from(tmp.path(), "none").unwrap().settings().unwrap();
    let w = settings.retrieval.fusion.weights();
    assert!((w.semantic - 0.45).abs() < 1e-6);
    assert!((w.keyword - 0.2).abs() < 1e-6);
}

#[test]
fn invalid_settings_fail_load() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[retrieval]\ninitial_k = 2\nfinal_k = 5\n").unwrap();
    assert!(Config::load_from(tmp.path(), "none").is_err());
}

#[test]
fn relative_paths_resolve_against_config_dir() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path(), "none").unwrap();
    let settings = config.settings().unwrap();
    assert_eq!(config.resolve_path(&settings.corpus.snapshot_dir), tmp.path().join("data/snapshot"));
    assert_eq!(resolve_with_base(tmp.path(), "/abs/tables.toml"), std::path::PathBuf::from("/abs/tables.toml"));
}

#[test]
fn tables_load_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tables.toml");
    fs::write(
        &path,
        "version = \"v2\"\ncategories = [\"housing\"]\n\n[[keywords]]\nphrase = \"rent allowance\"\ncategory = \"housing\"\nboost = 2.0\n",
    )
    .unwrap();
    let tables = CuratedTables::load(&path).expect("tables");
    assert_eq!(tables.version, "v2");
    assert_eq!(tables.keywords[0].phrase, "rent allowance");

    assert!(CuratedTables::load(&tmp.path().join("missing.toml")).is_err());
}

#[test]
fn shipped_config_is_valid() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let config = Config::load_from(&root, "none").expect("config.toml");
    let settings = config.settings().unwrap();
    assert_eq!(settings.retrieval.fusion, FusionConfig::Preset(FusionPreset::Default));

    let tables = CuratedTables::load(&config.resolve_path(&settings.corpus.tables_path)).expect("tables.toml");
    assert_eq!(tables.categories.len(), 8);
    assert_eq!(tables.short_query_context, vec!["طلب", "خدمة", "ترخيص"]);
    assert!(tables.direct_matches.iter().any(|d| d.pattern == "qfc" && d.source_fragment == "legal_clinic"));
}
