// related-core/src/pipeline.rs
//! 单语言处理流程
//!
//! load → embed → build index → query per document → filter → write.
//! Everything built for a language is dropped before the function returns.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::RelatedConfig;
use crate::embedding::{generate_embeddings, EmbeddingModel};
use crate::filter::{filter_neighbors, is_subject};
use crate::index::SimilarityIndex;
use crate::loader::load_corpus;
use crate::mapping::{write_mapping, RelatedContentMap, RelatedRecord, SlugCollision};
use crate::models::Document;

/// Where a language run is, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Loaded { documents: usize },
    Embedding { done: usize, total: usize },
    Searching { done: usize, total: usize },
}

/// Outcome of one language.
#[derive(Debug, Clone, Default)]
pub struct LanguageReport {
    pub lang: String,
    pub documents: usize,
    pub excluded: usize,
    pub failed: usize,
    /// Documents that were queried (non-root).
    pub subjects: usize,
    /// Slugs with at least one related entry in the written mapping.
    pub mapped: usize,
    pub collisions: Vec<SlugCollision>,
    /// Written file, `None` when nothing was written.
    pub output: Option<PathBuf>,
}

/// Related-content mapping plus bookkeeping for one corpus.
#[derive(Debug, Clone, Default)]
pub struct RelatedComputation {
    pub map: RelatedContentMap,
    pub collisions: Vec<SlugCollision>,
    pub subjects: usize,
}

/// Language codes under `content_root`: its sub-directories whose names do
/// not start with `_`, sorted.
pub fn discover_languages(content_root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(content_root)
        .with_context(|| format!("failed to read content directory {:?}", content_root))?;

    let mut languages = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('_') || name.starts_with('.') {
            continue;
        }
        languages.push(name);
    }
    languages.sort();
    Ok(languages)
}

/// Queries the index for every subject and groups the filtered results.
pub fn compute_related<F>(
    documents: &[Document],
    index: &SimilarityIndex,
    config: &RelatedConfig,
    mut progress: F,
) -> Result<RelatedComputation>
where
    F: FnMut(usize, usize),
{
    let search_k = config.search_k().min(documents.len());
    let total = documents.len();
    let mut records = Vec::new();
    let mut subjects = 0;

    for (i, document) in documents.iter().enumerate() {
        if is_subject(document) {
            subjects += 1;
            let neighbors = index.search(i, search_k)?;
            let entries = filter_neighbors(i, &neighbors, documents, config);
            tracing::debug!("{}: {} related", document.relative_path, entries.len());
            records.push(RelatedRecord {
                section: document.section.clone(),
                slug: document.slug.clone(),
                relative_path: document.relative_path.clone(),
                entries,
            });
        }
        progress(i + 1, total);
    }

    let (map, collisions) = RelatedContentMap::from_records(records);
    Ok(RelatedComputation {
        map,
        collisions,
        subjects,
    })
}

/// Runs the whole pipeline for `lang`, reading `corpus_root` and writing
/// `<output_dir>/<lang>.yaml`.
///
/// An empty corpus, or one whose mapping ends up empty, writes nothing and
/// leaves any previous output in place. The model is initialized here if
/// the caller has not done so already.
pub fn process_language<F>(
    lang: &str,
    corpus_root: &Path,
    output_dir: &Path,
    config: &RelatedConfig,
    model: &EmbeddingModel,
    mut progress: F,
) -> Result<LanguageReport>
where
    F: FnMut(Progress),
{
    config.validate()?;
    tracing::info!("processing language `{}` from {:?}", lang, corpus_root);

    let corpus = load_corpus(corpus_root, config);
    let mut report = LanguageReport {
        lang: lang.to_string(),
        documents: corpus.documents.len(),
        excluded: corpus.excluded,
        failed: corpus.failed,
        ..LanguageReport::default()
    };
    progress(Progress::Loaded {
        documents: corpus.documents.len(),
    });

    if corpus.documents.is_empty() {
        tracing::warn!("no content files found for language `{}`", lang);
        return Ok(report);
    }

    let documents = corpus.documents;
    let embedder = model.initialize()?;
    let embeddings = generate_embeddings(&documents, embedder, config.batch_size, |done, total| {
        progress(Progress::Embedding { done, total })
    })?;

    let index = SimilarityIndex::build(&embeddings)?;
    drop(embeddings);

    let computation = compute_related(&documents, &index, config, |done, total| {
        progress(Progress::Searching { done, total })
    })?;
    drop(index);
    drop(documents);

    report.subjects = computation.subjects;
    report.mapped = computation.map.len();
    report.collisions = computation.collisions;

    if computation.map.is_empty() {
        tracing::warn!("no related content produced for language `{}`, nothing written", lang);
        return Ok(report);
    }

    report.output = Some(write_mapping(&computation.map, output_dir, lang)?);
    Ok(report)
}
