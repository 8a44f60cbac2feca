// related-core/src/embedding/mod.rs
//! 向量嵌入模块
//!
//! The embedding capability is an explicit object: build an
//! [`EmbeddingModel`], call [`EmbeddingModel::initialize`] once (further
//! calls, from any thread, reuse the same backend) and pass it by
//! reference to every language that needs it.

mod bert;
mod hashing;

use std::fmt;

use anyhow::Result;
use once_cell::sync::OnceCell;

use crate::config::EmbeddingConfig;
use crate::error::RelatedError;
use crate::models::Document;

pub use bert::BertEmbedder;
pub use hashing::{HashingEmbedder, DEFAULT_HASHING_DIMENSION};

/// Model name selecting the download-free [`HashingEmbedder`].
pub const HASHING_MODEL: &str = "hashing";

/// Text to vector backend.
///
/// Identical input must produce identical output and vectors must be L2
/// normalized, so the index can rank by inner product.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// One vector per input text, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

type Loader = Box<dyn Fn() -> Result<Box<dyn Embedder>> + Send + Sync>;

/// Shared, lazily loaded embedding capability.
pub struct EmbeddingModel {
    name: String,
    loader: Loader,
    backend: OnceCell<Box<dyn Embedder>>,
}

impl fmt::Debug for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingModel")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl EmbeddingModel {
    /// Capability for the backend named by `config.model`. Nothing is
    /// loaded until [`initialize`](Self::initialize).
    pub fn new(config: EmbeddingConfig) -> Self {
        let name = config.model.clone();
        Self::from_loader(name, move || load_backend(&config))
    }

    /// Capability with a custom backend constructor.
    pub fn from_loader<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Embedder>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Box::new(loader),
            backend: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loads the backend on first use and returns it.
    ///
    /// Concurrent first callers block on a single load. A failed load is
    /// not cached, so a later call tries again.
    pub fn initialize(&self) -> Result<&dyn Embedder> {
        let backend = self.backend.get_or_try_init(|| {
            tracing::info!("loading embedding model: {}", self.name);
            let backend = (self.loader)().map_err(|e| RelatedError::ModelLoad {
                model: self.name.clone(),
                message: format!("{:#}", e),
            })?;
            tracing::info!(
                "embedding model ready: {} ({} dimensions)",
                backend.name(),
                backend.dimension()
            );
            Ok::<_, anyhow::Error>(backend)
        })?;
        Ok(backend.as_ref())
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.get().is_some()
    }

    /// Drops the loaded backend. The next `initialize` loads it again.
    pub fn release(&mut self) {
        if self.backend.take().is_some() {
            tracing::info!("released embedding model: {}", self.name);
        }
    }
}

fn load_backend(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    if config.model.eq_ignore_ascii_case(HASHING_MODEL) {
        return Ok(Box::new(HashingEmbedder::new(DEFAULT_HASHING_DIMENSION)));
    }
    Ok(Box::new(BertEmbedder::load(config)?))
}

/// Embeds every document's text, `batch_size` documents at a time.
///
/// Row `i` of the result belongs to `documents[i]`. `progress` is called
/// after each batch with the number of documents done and the total.
pub fn generate_embeddings<F>(
    documents: &[Document],
    embedder: &dyn Embedder,
    batch_size: usize,
    mut progress: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(usize, usize),
{
    let batch_size = batch_size.max(1);
    let total = documents.len();
    let batch_count = total.div_ceil(batch_size);
    let dimension = embedder.dimension();
    let mut embeddings = Vec::with_capacity(total);

    for (batch_index, batch) in documents.chunks(batch_size).enumerate() {
        tracing::debug!("embedding batch {}/{}", batch_index + 1, batch_count);

        let texts: Vec<&str> = batch.iter().map(|doc| doc.text.as_str()).collect();
        let vectors = embedder.embed_batch(&texts)?;

        if vectors.len() != texts.len() {
            return Err(RelatedError::EmbeddingCount {
                expected: texts.len(),
                actual: vectors.len(),
            }
            .into());
        }

        for vector in vectors {
            if vector.len() != dimension {
                return Err(RelatedError::DimensionMismatch {
                    row: embeddings.len(),
                    expected: dimension,
                    actual: vector.len(),
                }
                .into());
            }
            embeddings.push(vector);
        }

        progress(embeddings.len(), total);
    }

    Ok(embeddings)
}
