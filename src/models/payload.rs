// file: src/models/payload.rs
// description: enriched sync payload sent to the registry for each matched file
// reference: provenance annotations always win over repository labels

use crate::models::repository::{Labels, RepositoryRef};
use serde::{Deserialize, Serialize};

pub const SOURCE_NAME: &str = "vcs-connect";

pub const ANNOTATION_SOURCE: &str = "effx.io/source";
pub const ANNOTATION_REPOSITORY: &str = "effx.io/repository";
pub const ANNOTATION_FILE_PATH: &str = "effx.io/file-path";
pub const ANNOTATION_INFERRED_TAGS: &str = "effx.io/inferred-tags";

pub const LANGUAGE_TAG: &str = "language";

/// Language and toolchain version inferred from a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub language: String,
    pub version: String,
}

impl LanguageInfo {
    pub fn new(language: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub file_contents: String,
    #[serde(skip_serializing_if = "Labels::is_empty", default)]
    pub tags: Labels,
    #[serde(skip_serializing_if = "Labels::is_empty", default)]
    pub annotations: Labels,
}

impl SyncPayload {
    pub fn builder<'a>(repository: &'a RepositoryRef, file_path: &'a str) -> SyncPayloadBuilder<'a> {
        SyncPayloadBuilder {
            repository,
            file_path,
            contents: String::new(),
            language: None,
        }
    }

    pub fn inferred_tags(&self) -> Vec<&str> {
        self.annotations
            .get(ANNOTATION_INFERRED_TAGS)
            .map(|joined| joined.split(',').filter(|key| !key.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// Builds a payload from a repository's labels without touching them.
pub struct SyncPayloadBuilder<'a> {
    repository: &'a RepositoryRef,
    file_path: &'a str,
    contents: String,
    language: Option<&'a LanguageInfo>,
}

impl<'a> SyncPayloadBuilder<'a> {
    pub fn contents(mut self, contents: String) -> Self {
        self.contents = contents;
        self
    }

    pub fn language(mut self, language: Option<&'a LanguageInfo>) -> Self {
        self.language = language;
        self
    }

    pub fn build(self) -> SyncPayload {
        let mut tags = self.repository.tags().clone();
        let mut annotations = self.repository.annotations().clone();
        let mut inferred = Vec::new();

        if let Some(info) = self.language
            && !info.language.is_empty()
        {
            tags.insert(LANGUAGE_TAG.to_string(), info.language.clone());
            inferred.push(LANGUAGE_TAG.to_string());

            if !info.version.is_empty() {
                let key = info.language.to_lowercase();
                tags.insert(key.clone(), info.version.to_lowercase());
                inferred.push(key);
            }
        }

        annotations.insert(ANNOTATION_SOURCE.to_string(), SOURCE_NAME.to_string());
        annotations.insert(
            ANNOTATION_REPOSITORY.to_string(),
            self.repository.clone_url().to_string(),
        );
        annotations.insert(ANNOTATION_FILE_PATH.to_string(), self.file_path.to_string());
        annotations.insert(ANNOTATION_INFERRED_TAGS.to_string(), inferred.join(","));

        SyncPayload {
            file_contents: self.contents,
            tags,
            annotations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo() -> RepositoryRef {
        RepositoryRef::builder("https://github.com/acme/payments.git")
            .tag("team", "payments")
            .annotation(ANNOTATION_SOURCE, "spoofed")
            .annotation(ANNOTATION_FILE_PATH, "elsewhere.yaml")
            .annotation("owner", "billing")
            .build()
    }

    #[test]
    fn test_provenance_overrides_repository_annotations() {
        let repository = repo();
        let payload = SyncPayload::builder(&repository, "services/api/effx.yaml")
            .contents("name: api".to_string())
            .build();

        assert_eq!(payload.annotations[ANNOTATION_SOURCE], "vcs-connect");
        assert_eq!(
            payload.annotations[ANNOTATION_REPOSITORY],
            "https://github.com/acme/payments.git"
        );
        assert_eq!(payload.annotations[ANNOTATION_FILE_PATH], "services/api/effx.yaml");
        assert_eq!(payload.annotations["owner"], "billing");
        assert_eq!(payload.annotations[ANNOTATION_INFERRED_TAGS], "");
        assert_eq!(payload.tags["team"], "payments");
    }

    #[test]
    fn test_language_tags_are_inferred_and_normalized() {
        let repository = repo();
        let info = LanguageInfo::new("Go", "1.21");
        let payload = SyncPayload::builder(&repository, "effx.yaml")
            .language(Some(&info))
            .build();

        assert_eq!(payload.tags[LANGUAGE_TAG], "Go");
        assert_eq!(payload.tags["go"], "1.21");
        assert_eq!(payload.inferred_tags(), vec!["language", "go"]);
    }

    #[test]
    fn test_language_without_version_only_tags_language() {
        let repository = repo();
        let info = LanguageInfo::new("python", "");
        let payload = SyncPayload::builder(&repository, "effx.yaml")
            .language(Some(&info))
            .build();

        assert_eq!(payload.tags[LANGUAGE_TAG], "python");
        assert!(!payload.tags.contains_key("python"));
        assert_eq!(payload.inferred_tags(), vec!["language"]);
    }

    #[test]
    fn test_builder_leaves_repository_untouched() {
        let repository = repo();
        let before = repository.clone();
        let info = LanguageInfo::new("rust", "2021");
        let _ = SyncPayload::builder(&repository, "effx.yaml")
            .language(Some(&info))
            .build();

        assert_eq!(repository, before);
        assert!(!repository.tags().contains_key(LANGUAGE_TAG));
    }

    #[test]
    fn test_serializes_camel_case() {
        let repository = RepositoryRef::new("https://example.com/r.git");
        let payload = SyncPayload::builder(&repository, "effx.yaml")
            .contents("kind: service".to_string())
            .build();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["fileContents"], "kind: service");
        assert!(json.get("tags").is_none());
        assert_eq!(json["annotations"]["effx.io/file-path"], "effx.yaml");
    }
}
