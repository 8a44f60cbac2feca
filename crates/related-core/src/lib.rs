// related-core/src/lib.rs
//! 相关内容生成核心库
//!
//! For every document of a language's content tree, finds the documents
//! most similar to it and writes a `section → slug → [{file}]` mapping
//! that templates render as "related content" links:
//! - markdown loading with metadata blocks and exclusion rules
//! - sentence embeddings (candle BERT, or a download-free hashing model)
//! - exact inner-product nearest-neighbor search
//! - link-path normalization and per-language YAML output

use std::path::Path;

pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod filter;
pub mod index;
pub mod loader;
pub mod mapping;
pub mod models;
pub mod pipeline;

// 重导出核心类型
pub use config::{EmbeddingConfig, RelatedConfig};
pub use embedding::{generate_embeddings, BertEmbedder, Embedder, EmbeddingModel, HashingEmbedder};
pub use error::RelatedError;
pub use extract::{markdown_to_text, parse_markdown, split_front_matter, FrontMatterFormat};
pub use filter::{filter_neighbors, is_subject, link_path};
pub use index::{Neighbor, SimilarityIndex};
pub use loader::{is_excluded, load_corpus, LoadedCorpus};
pub use mapping::{output_path, write_mapping, RelatedContentMap, RelatedRecord, SlugCollision};
pub use models::{Document, FrontMatter, RelatedEntry};
pub use pipeline::{compute_related, discover_languages, process_language, LanguageReport, Progress};

/// 相关内容引擎统一入口
///
/// Owns the run configuration and the embedding capability so one model
/// load serves every language.
pub struct RelatedContentEngine {
    pub config: RelatedConfig,
    pub model: EmbeddingModel,
}

impl RelatedContentEngine {
    pub fn new(config: RelatedConfig, embedding: EmbeddingConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model: EmbeddingModel::new(embedding),
        })
    }

    /// Engine around an already constructed capability.
    pub fn with_model(config: RelatedConfig, model: EmbeddingModel) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self { config, model })
    }

    /// Loads the embedding model now instead of on the first language.
    pub fn initialize(&self) -> anyhow::Result<()> {
        self.model.initialize().map(|_| ())
    }

    pub fn languages(&self, content_root: &Path) -> anyhow::Result<Vec<String>> {
        discover_languages(content_root)
    }

    /// Processes `<content_root>/<lang>` into `<output_dir>/<lang>.yaml`.
    pub fn process_language<F>(
        &self,
        lang: &str,
        content_root: &Path,
        output_dir: &Path,
        progress: F,
    ) -> anyhow::Result<LanguageReport>
    where
        F: FnMut(Progress),
    {
        pipeline::process_language(
            lang,
            &content_root.join(lang),
            output_dir,
            &self.config,
            &self.model,
            progress,
        )
    }

    /// Drops the loaded model.
    pub fn release(&mut self) {
        self.model.release();
    }
}
