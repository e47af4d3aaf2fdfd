//! convrisk command-line runner
//!
//! Reads a conversation from a JSON file (an array of `{role, content}`
//! records), runs the detection engine against the configured catalog, prints
//! the narrative summary, and optionally writes the full result as JSON.
//!
//! Usage: `convrisk <conversation.json> [output.json]`
//!
//! The catalog is loaded from the directory named by `CONVRISK_CONFIG_DIR`
//! (default `config/`); missing files are materialized with built-in
//! defaults on first run.

use anyhow::Context;
use convrisk_core::{AnalysisResult, Turn};
use convrisk_detect::{ConfigStore, Engine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(conversation_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: convrisk <conversation.json> [output.json]");
        std::process::exit(2);
    };
    let output_path = args.next().map(PathBuf::from);

    let config_dir = std::env::var("CONVRISK_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let result = run(&conversation_path, &config_dir)?;

    println!("risk detected: {}", if result.detected { "yes" } else { "no" });
    println!("risk score:    {}/100", result.risk_score);
    println!();
    println!("{}", result.summary);

    if let Some(path) = output_path {
        write_result(&result, &path)?;
        info!(path = %path.display(), "analysis result written");
    }

    Ok(())
}

/// Load the catalog and conversation, then run one analysis.
fn run(conversation_path: &Path, config_dir: &Path) -> anyhow::Result<AnalysisResult> {
    let store = ConfigStore::new(config_dir);
    let catalog = store
        .load_or_init()
        .with_context(|| format!("loading catalog from {}", config_dir.display()))?;
    info!(config_dir = %config_dir.display(), "catalog loaded");

    let engine = Engine::new(Arc::new(catalog))
        .map_err(|e| anyhow::anyhow!("failed to initialize engine: {e}"))?;

    let conversation = read_conversation(conversation_path)?;
    info!(turns = conversation.len(), "conversation loaded");

    engine
        .analyze(&conversation)
        .map_err(|e| anyhow::anyhow!("analysis failed: {e}"))
}

/// Read a conversation file: a JSON array of `{role, content}` records.
fn read_conversation(path: &Path) -> anyhow::Result<Vec<Turn>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading conversation file {}", path.display()))?;
    let conversation: Vec<Turn> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing conversation file {}", path.display()))?;
    Ok(conversation)
}

/// Write the full analysis result as pretty-printed JSON.
fn write_result(result: &AnalysisResult, path: &Path) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(result)?;
    std::fs::write(path, raw).with_context(|| format!("writing result to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_conversation(dir: &TempDir, name: &str, json: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn run_analyzes_clean_conversation() {
        let dir = TempDir::new().unwrap();
        let conversation = write_conversation(
            &dir,
            "conversation.json",
            r#"[{"role": "user", "content": "The weather is nice today"}]"#,
        );
        let result = run(&conversation, &dir.path().join("config")).unwrap();
        assert!(!result.detected);
        assert_eq!(result.risk_score, 0);
    }

    #[test]
    fn run_materializes_config_directory() {
        let dir = TempDir::new().unwrap();
        let conversation = write_conversation(
            &dir,
            "conversation.json",
            r#"[{"role": "user", "content": "hello"}]"#,
        );
        let config_dir = dir.path().join("config");
        run(&conversation, &config_dir).unwrap();
        assert!(config_dir.join("categories.json").exists());
        assert!(config_dir.join("semantic.json").exists());
    }

    #[test]
    fn malformed_conversation_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let conversation = write_conversation(&dir, "broken.json", "{not a list");
        let err = run(&conversation, &dir.path().join("config")).unwrap_err();
        assert!(err.to_string().contains("parsing conversation file"));
    }

    #[test]
    fn empty_conversation_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let conversation = write_conversation(&dir, "empty.json", "[]");
        let err = run(&conversation, &dir.path().join("config")).unwrap_err();
        assert!(err.to_string().contains("analysis failed"));
    }

    #[test]
    fn result_round_trips_to_output_file() {
        let dir = TempDir::new().unwrap();
        let conversation = write_conversation(
            &dir,
            "conversation.json",
            r#"[
                {"role": "user", "content": "My privacy is at stake."},
                {"role": "assistant", "content": "I cannot help with that."}
            ]"#,
        );
        let result = run(&conversation, &dir.path().join("config")).unwrap();
        let output = dir.path().join("result.json");
        write_result(&result, &output).unwrap();

        let raw = std::fs::read_to_string(&output).unwrap();
        let parsed: AnalysisResult = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, result);
    }
}
