// related-core/src/models.rs
//! 数据模型定义

use serde::{Deserialize, Deserializer, Serialize};

/// Slug used for an index document sitting directly in the corpus root.
pub const ROOT_INDEX_SLUG: &str = "index";

/// One content item of a language corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// `/`-separated path relative to the corpus root, extension included.
    pub relative_path: String,
    /// First path segment, empty for root-level documents.
    pub section: String,
    pub slug: String,
    pub title: String,
    pub url: Option<String>,
    /// Plain-text body, at most `text_cap` characters.
    pub text: String,
    /// Whether this is a directory landing page (`_index.md`).
    pub is_index: bool,
}

/// Recognized metadata fields. Anything else in the block is ignored.
///
/// Scalar values of any type are kept as their text, so `slug = 404` or
/// `title: 2024` still name the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Integer(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Boolean(b) => b.to_string(),
    }))
}

/// One related-content link as the templates consume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntry {
    pub file: String,
}

impl RelatedEntry {
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }
}
