//! Class names indexed by model output position.
//!
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Classes of the bundled farm-animal model.
const DEFAULT_LABELS: [&str; 4] = ["Vaca", "Gallina", "Caballo", "Ningún animal"];

/// Ordered, immutable list of class names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load labels from a text file with one class per line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read labels from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid labels file {}", path.display()))
    }

    /// Parse one label per line. Blank lines are skipped and a leading numeric index as in
    /// `0 Vaca` is stripped.
    pub fn parse(content: &str) -> Result<Self> {
        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(char::is_whitespace) {
                Some((idx, name)) if idx.parse::<usize>().is_ok() => name.trim().to_owned(),
                _ => line.to_owned(),
            })
            .collect();

        if names.is_empty() {
            bail!("no labels found");
        }

        Ok(Self { names })
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self::new(DEFAULT_LABELS.iter().map(|&name| name.to_owned()).collect())
    }
}
