// smoothflow_sim/src/config/catalog.rs

//! Discovery of every scenario file below a directory.

use crate::error::{Result, ScenarioError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Scenario files found below a root directory, keyed like
/// "highway.jam_wave" for `highway/jam_wave.toml`.
#[derive(Debug, Default)]
pub struct ScenarioCatalog(pub Vec<(String, PathBuf)>);

impl ScenarioCatalog {
    /// Walks `root` and collects every `.toml` file, sorted by key.
    pub fn discover(root: &Path) -> Result<Self> {
        info!("Discovering scenarios in: {:?}", root);

        let mut entries = Vec::new();
        for entry in WalkDir::new(root)
            .into_iter()
            .filter_map(|e| match e {
                Ok(e) => Some(e),
                Err(err) => {
                    warn!("Skipping unreadable catalog entry: {}", err);
                    None
                }
            })
            .filter(|e| {
                !e.file_type().is_dir() && e.path().extension().is_some_and(|ext| ext == "toml")
            })
        {
            let path = entry.path();
            let key = path
                .strip_prefix(root)
                .unwrap_or(path)
                .with_extension("")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, ".");
            entries.push((key, path.to_path_buf()));
        }

        if entries.is_empty() {
            return Err(ScenarioError::EmptyCatalog(root.to_path_buf()));
        }
        entries.sort();
        Ok(Self(entries))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.0.iter().map(|(k, p)| (k.as_str(), p.as_path()))
    }
}
