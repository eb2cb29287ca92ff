//! Allow-lists of asset names a command accepts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Catalogs this size or smaller are listed in "not found" replies.
pub const SMALL_CATALOG: usize = 10;

const POKEMON: &str = include_str!("../catalogs/pokemon.txt");
const SAMPLES: &str = include_str!("../catalogs/samples.txt");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog {0} contains no names")]
    Empty(PathBuf),
}

/// Ordered, de-duplicated set of lowercase names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    names: Vec<String>,
    index: HashSet<String>,
}

impl Catalog {
    /// Canonical form used for lookups and storage keys.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        for name in names {
            let name = Self::normalize(name.as_ref());
            if !name.is_empty() && catalog.index.insert(name.clone()) {
                catalog.names.push(name);
            }
        }
        catalog
    }

    /// One name per line; blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Self {
        Self::from_names(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&text);
        if catalog.is_empty() {
            return Err(CatalogError::Empty(path.to_path_buf()));
        }
        Ok(catalog)
    }

    /// Bundled Generation I list.
    pub fn pokemon() -> Self {
        Self::parse(POKEMON)
    }

    /// Bundled sample list.
    pub fn samples() -> Self {
        Self::parse(SAMPLES)
    }

    /// `name` must already be normalized.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_small(&self) -> bool {
        self.len() <= SMALL_CATALOG
    }

    /// Render in the format read back by [`Catalog::parse`].
    pub fn to_text(&self) -> String {
        let mut out = self.names.join("\n");
        out.push('\n');
        out
    }
}
