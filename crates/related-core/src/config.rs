// related-core/src/config.rs
//! 配置模块

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RelatedError;

/// Default number of related entries per document.
pub const DEFAULT_TOP_K: usize = 3;
/// Default cap on the normalized text fed to the embedder, in characters.
pub const DEFAULT_TEXT_CAP: usize = 1000;
pub const DEFAULT_BATCH_SIZE: usize = 8;
/// Extra neighbors requested to absorb the self-match and index collapse.
pub const DEFAULT_MARGIN: usize = 5;

pub const DEFAULT_MODEL: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";
pub const DEFAULT_REVISION: &str = "main";

/// Every tunable of one related-content run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelatedConfig {
    pub top_k: usize,
    pub text_cap: usize,
    pub batch_size: usize,
    pub margin: usize,
    /// Exact relative document paths or directory prefixes to skip.
    pub exclusions: Vec<String>,
    /// Markup file extensions, compared case-insensitively.
    pub extensions: Vec<String>,
}

/// Which embedding backend to load and where its files live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Hugging Face model id, a local model directory, or `hashing`.
    pub model: String,
    pub revision: String,
    /// Download cache for hub models. `None` uses the hf-hub default.
    pub cache_dir: Option<PathBuf>,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            text_cap: DEFAULT_TEXT_CAP,
            batch_size: DEFAULT_BATCH_SIZE,
            margin: DEFAULT_MARGIN,
            exclusions: Vec::new(),
            extensions: vec!["md".to_string()],
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            cache_dir: None,
        }
    }
}

impl RelatedConfig {
    /// 从 TOML 文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelatedConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of neighbors to request from the index for one subject.
    pub fn search_k(&self) -> usize {
        self.top_k + self.margin
    }

    pub fn validate(&self) -> Result<(), RelatedError> {
        let invalid = |message: &str| Err(RelatedError::InvalidConfig(message.to_string()));
        if self.top_k == 0 {
            return invalid("top_k must be at least 1");
        }
        if self.text_cap == 0 {
            return invalid("text_cap must be at least 1");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        if self.extensions.is_empty() {
            return invalid("at least one markup extension is required");
        }
        Ok(())
    }

    /// Whether `extension` (without the dot) names a markup document.
    pub fn is_markup_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = RelatedConfig::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.text_cap, 1000);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.margin, 5);
        assert_eq!(config.search_k(), 8);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(RelatedConfig { top_k: 0, ..RelatedConfig::default() })]
    #[case(RelatedConfig { text_cap: 0, ..RelatedConfig::default() })]
    #[case(RelatedConfig { batch_size: 0, ..RelatedConfig::default() })]
    #[case(RelatedConfig { extensions: vec![], ..RelatedConfig::default() })]
    fn test_invalid_configs_are_rejected(#[case] config: RelatedConfig) {
        assert!(matches!(config.validate(), Err(RelatedError::InvalidConfig(_))));
    }

    #[rstest]
    #[case("md", true)]
    #[case("MD", true)]
    #[case("markdown", false)]
    #[case("txt", false)]
    fn test_markup_extension(#[case] extension: &str, #[case] expected: bool) {
        assert_eq!(RelatedConfig::default().is_markup_extension(extension), expected);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("related.toml");
        std::fs::write(&path, "top_k = 5\nexclusions = [\"author\"]\n").unwrap();

        let config = RelatedConfig::load_from_file(&path).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.exclusions, vec!["author".to_string()]);
    }
}
