// file: src/repository/scanner.rs
// description: Directory walking and target file discovery
// reference: https://docs.rs/walkdir

use crate::error::{ConnectError, Result};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Matches the target file name, optionally prefixed by `<anything>.`, with
/// `yaml`/`yml` accepted interchangeably. Case-sensitive.
#[derive(Debug, Clone)]
pub struct TargetMatcher {
    pattern: Regex,
}

impl TargetMatcher {
    pub fn new(target_file: &str) -> Result<Self> {
        let target_file = target_file.trim();
        if target_file.is_empty() || target_file.contains(['/', '\\']) {
            return Err(ConnectError::Config(format!(
                "invalid target file name: {:?}",
                target_file
            )));
        }

        let name = match target_file.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => {
                let extensions = match extension {
                    "yaml" | "yml" => "ya?ml".to_string(),
                    other => regex::escape(other),
                };
                format!(r"{}\.{}", regex::escape(stem), extensions)
            }
            _ => regex::escape(target_file),
        };

        let pattern = Regex::new(&format!(r"^(.+\.)?{}$", name))
            .map_err(|e| ConnectError::Config(format!("invalid target file name: {}", e)))?;

        Ok(Self { pattern })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Relative to the scanned root, `/`-separated.
    pub relative_path: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct FileScanner {
    matcher: TargetMatcher,
}

impl FileScanner {
    pub fn new(matcher: TargetMatcher) -> Self {
        Self { matcher }
    }

    /// Walks `root` depth-first in file-name order and returns every matching
    /// file. Any traversal error fails the whole scan.
    pub fn find_targets(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        debug!("Scanning directory: {}", root.display());
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");

        for entry in walker {
            let entry = entry.map_err(|e| ConnectError::Scan {
                path: root.to_path_buf(),
                message: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };

            if !self.matcher.matches(file_name) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            let path = entry.into_path();
            let relative_path = relative_path(root, &path);

            files.push(ScannedFile {
                path,
                relative_path,
                size,
            });
        }

        info!("Found {} target files in {}", files.len(), root.display());
        Ok(files)
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
