// file: src/registry/services.rs
// description: whole-workspace detection of deployable service directories
// reference: https://docs.rs/walkdir

use crate::error::{ConnectError, Result};
use serde::Serialize;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Files whose presence marks a directory as a service root.
const SERVICE_MARKERS: &[&str] = &[
    "Dockerfile",
    "Procfile",
    "go.mod",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "Gemfile",
];

const MAX_DEPTH: usize = 6;
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "vendor", "target", "dist", "build"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedService {
    pub name: String,
    /// Relative to the workspace root; `.` for the root itself.
    pub path: String,
    pub markers: Vec<String>,
}

/// Repository name from its clone url, e.g. `payments` for
/// `https://github.com/acme/payments.git`.
pub fn repository_name(clone_url: &str) -> String {
    clone_url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(clone_url)
        .trim_end_matches(".git")
        .to_string()
}

pub fn detect_services(root: &Path, repository: &str) -> Result<Vec<DetectedService>> {
    let mut services = Vec::new();

    let walker = WalkDir::new(root)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name))
        });

    for entry in walker {
        let entry = entry.map_err(|e| ConnectError::Scan {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let markers: Vec<String> = SERVICE_MARKERS
            .iter()
            .filter(|marker| entry.path().join(marker).is_file())
            .map(|marker| marker.to_string())
            .collect();

        if markers.is_empty() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let parts: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();

        let (name, path) = match parts.last() {
            Some(last) => (last.clone(), parts.join("/")),
            None => (repository.to_string(), ".".to_string()),
        };

        services.push(DetectedService {
            name,
            path,
            markers,
        });
    }

    Ok(services)
}
