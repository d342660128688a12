// file: src/repository/metadata.rs
// description: language and toolchain version inference from build manifests
// reference: manifest conventions of go, cargo, npm, python, maven/gradle and bundler

use crate::error::{ConnectError, Result};
use crate::models::LanguageInfo;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Infers language metadata for the directory holding a target file.
/// A directory with nothing recognisable yields an empty `LanguageInfo`.
pub trait MetadataInferrer: Send + Sync {
    fn infer(&self, dir: &Path) -> Result<LanguageInfo>;
}

/// Used when language detection is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInferrer;

impl MetadataInferrer for NoopInferrer {
    fn infer(&self, _dir: &Path) -> Result<LanguageInfo> {
        Ok(LanguageInfo::default())
    }
}

lazy_static! {
    static ref GO_DIRECTIVE: Regex = Regex::new(r"(?m)^go\s+(\d+(?:\.\d+)*)").unwrap();
    static ref RUST_VERSION: Regex =
        Regex::new(r#"(?m)^rust-version\s*=\s*"([^"]+)""#).unwrap();
    static ref REQUIRES_PYTHON: Regex =
        Regex::new(r#"(?m)^requires-python\s*=\s*"[^0-9]*(\d+(?:\.\d+)*)"#).unwrap();
    static ref MAVEN_JAVA_VERSION: Regex = Regex::new(
        r"<(?:java\.version|maven\.compiler\.source|maven\.compiler\.release)>\s*([0-9.]+)\s*<"
    )
    .unwrap();
    static ref GRADLE_JAVA_VERSION: Regex =
        Regex::new(r#"(?:sourceCompatibility|languageVersion)\s*[=(]\s*(?:JavaVersion\.VERSION_|JavaLanguageVersion\.of\()?['"]?([0-9._]+)"#)
            .unwrap();
    static ref GEMFILE_RUBY: Regex = Regex::new(r#"(?m)^ruby\s+['"]([^'"]+)['"]"#).unwrap();
    static ref LEADING_VERSION: Regex = Regex::new(r"(\d+(?:\.\d+)*)").unwrap();
}

type Detector = fn(&Path) -> Result<Option<LanguageInfo>>;

/// Checks the directory for known manifests, first match wins. A manifest
/// that exists but cannot be read or parsed is an error.
#[derive(Debug, Clone, Default)]
pub struct ManifestInferrer;

impl ManifestInferrer {
    const DETECTORS: [Detector; 6] = [
        detect_go,
        detect_rust,
        detect_node,
        detect_python,
        detect_java,
        detect_ruby,
    ];

    pub fn new() -> Self {
        Self
    }
}

impl MetadataInferrer for ManifestInferrer {
    fn infer(&self, dir: &Path) -> Result<LanguageInfo> {
        if !dir.is_dir() {
            return Err(ConnectError::Metadata {
                path: dir.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        let mut info = LanguageInfo::default();
        for detect in Self::DETECTORS {
            if let Some(found) = detect(dir)? {
                info = found;
                break;
            }
        }

        debug!(
            dir = %dir.display(),
            language = %info.language,
            version = %info.version,
            "inferred metadata"
        );
        Ok(info)
    }
}

/// `None` when the file is absent.
fn read(dir: &Path, name: &str) -> Result<Option<String>> {
    match fs::read_to_string(dir.join(name)) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn capture(pattern: &Regex, haystack: &str) -> String {
    pattern
        .captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Pulls `18.2` out of constraints like `>=18.2 <20` or `^3.11`.
fn leading_version(constraint: &str) -> String {
    capture(&LEADING_VERSION, constraint)
}

fn detect_go(dir: &Path) -> Result<Option<LanguageInfo>> {
    let Some(manifest) = read(dir, "go.mod")? else {
        return Ok(None);
    };
    Ok(Some(LanguageInfo::new("go", capture(&GO_DIRECTIVE, &manifest))))
}

fn detect_rust(dir: &Path) -> Result<Option<LanguageInfo>> {
    let Some(manifest) = read(dir, "Cargo.toml")? else {
        return Ok(None);
    };
    let version = match read(dir, "rust-toolchain")? {
        Some(toolchain) if toolchain.trim().starts_with(|c: char| c.is_ascii_digit()) => {
            toolchain.trim().to_string()
        }
        _ => capture(&RUST_VERSION, &manifest),
    };
    Ok(Some(LanguageInfo::new("rust", version)))
}

fn detect_node(dir: &Path) -> Result<Option<LanguageInfo>> {
    let Some(manifest) = read(dir, "package.json")? else {
        return Ok(None);
    };
    let parsed: serde_json::Value = serde_json::from_str(&manifest)?;

    let uses_typescript = dir.join("tsconfig.json").is_file()
        || ["dependencies", "devDependencies"]
            .iter()
            .any(|section| parsed[section].get("typescript").is_some());
    let language = if uses_typescript { "typescript" } else { "javascript" };

    let version = match read(dir, ".nvmrc")? {
        Some(nvmrc) => leading_version(&nvmrc),
        None => parsed["engines"]["node"]
            .as_str()
            .map(leading_version)
            .unwrap_or_default(),
    };

    Ok(Some(LanguageInfo::new(language, version)))
}

fn detect_python(dir: &Path) -> Result<Option<LanguageInfo>> {
    if let Some(pinned) = read(dir, ".python-version")? {
        return Ok(Some(LanguageInfo::new("python", leading_version(&pinned))));
    }

    if let Some(pyproject) = read(dir, "pyproject.toml")? {
        return Ok(Some(LanguageInfo::new("python", capture(&REQUIRES_PYTHON, &pyproject))));
    }

    Ok(["requirements.txt", "setup.py", "Pipfile"]
        .iter()
        .any(|name| dir.join(name).is_file())
        .then(|| LanguageInfo::new("python", "")))
}

fn detect_java(dir: &Path) -> Result<Option<LanguageInfo>> {
    if let Some(pom) = read(dir, "pom.xml")? {
        return Ok(Some(LanguageInfo::new("java", capture(&MAVEN_JAVA_VERSION, &pom))));
    }

    let gradle = match read(dir, "build.gradle")? {
        Some(gradle) => gradle,
        None => match read(dir, "build.gradle.kts")? {
            Some(gradle) => gradle,
            None => return Ok(None),
        },
    };
    let version = capture(&GRADLE_JAVA_VERSION, &gradle).replace('_', ".");
    Ok(Some(LanguageInfo::new("java", version)))
}

fn detect_ruby(dir: &Path) -> Result<Option<LanguageInfo>> {
    if let Some(pinned) = read(dir, ".ruby-version")? {
        return Ok(Some(LanguageInfo::new("ruby", leading_version(&pinned))));
    }

    let Some(gemfile) = read(dir, "Gemfile")? else {
        return Ok(None);
    };
    Ok(Some(LanguageInfo::new("ruby", capture(&GEMFILE_RUBY, &gemfile))))
}
