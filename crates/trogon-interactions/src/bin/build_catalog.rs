//! Builds a catalog file from a directory of `.mp3` files.
//!
//! ```text
//! build-catalog ./cries catalogs/pokemon.txt
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use trogon_interactions::Catalog;

#[derive(Parser, Debug)]
#[command(name = "build-catalog", about = "Write a catalog from a directory of audio files")]
struct Args {
    /// Directory to scan (not recursive)
    dir: PathBuf,

    /// Output file; stdout when omitted
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let catalog = scan(&args.dir)?;
    info!(dir = %args.dir.display(), names = catalog.len(), "Scanned audio files");

    match args.output {
        Some(path) => std::fs::write(&path, catalog.to_text())
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", catalog.to_text()),
    }
    Ok(())
}

fn scan(dir: &Path) -> anyhow::Result<Catalog> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_mp3 = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"));
        if !is_mp3 || !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_lowercase());
        }
    }
    names.sort();

    anyhow::ensure!(!names.is_empty(), "No .mp3 files found in {}", dir.display());
    Ok(Catalog::from_names(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scan_collects_sorted_unique_mp3_names() {
        let dir = TempDir::new().unwrap();
        for file in ["Pikachu.MP3", "bulbasaur.mp3", "pikachu.mp3", "notes.txt"] {
            std::fs::write(dir.path().join(file), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp3")).unwrap();

        let catalog = scan(dir.path()).unwrap();
        assert_eq!(catalog.names(), ["bulbasaur", "pikachu"]);
    }

    #[test]
    fn scan_rejects_directories_without_audio() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("readme.md"), b"").unwrap();
        assert!(scan(dir.path()).is_err());
    }
}
