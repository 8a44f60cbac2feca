// related-core/src/embedding/bert.rs
//! Sentence-transformer BERT embeddings on candle (CPU).

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use serde::Deserialize;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::Embedder;
use crate::config::EmbeddingConfig;

/// Longest token sequence fed to the model; BERT position tables stop here.
pub const MAX_SEQUENCE_LENGTH: usize = 512;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Weights {
    Safetensors(PathBuf),
    Pytorch(PathBuf),
}

/// Local paths of everything needed to build the model.
#[derive(Debug, Clone)]
struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: Weights,
}

#[derive(Deserialize)]
struct HiddenSize {
    hidden_size: usize,
}

impl ModelFiles {
    /// Uses `config.model` as a directory when it is one, otherwise
    /// downloads (or reuses the cached copy of) the hub repository.
    fn resolve(config: &EmbeddingConfig) -> Result<Self> {
        let local = Path::new(&config.model);
        if local.is_dir() {
            return Self::from_dir(local);
        }

        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(cache_dir) = &config.cache_dir {
            builder = builder.with_cache_dir(cache_dir.clone());
        }
        let api = builder.build().context("failed to create hub client")?;
        let repo = api.repo(Repo::with_revision(
            config.model.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));

        let config_path = repo
            .get(CONFIG_FILE)
            .with_context(|| format!("failed to fetch {}", CONFIG_FILE))?;
        let tokenizer = repo
            .get(TOKENIZER_FILE)
            .with_context(|| format!("failed to fetch {}", TOKENIZER_FILE))?;
        let weights = match repo.get(SAFETENSORS_FILE) {
            Ok(path) => Weights::Safetensors(path),
            Err(e) => {
                tracing::debug!("{} unavailable ({}), trying {}", SAFETENSORS_FILE, e, PYTORCH_FILE);
                let path = repo
                    .get(PYTORCH_FILE)
                    .with_context(|| format!("failed to fetch model weights for {}", config.model))?;
                Weights::Pytorch(path)
            }
        };

        Ok(Self {
            config: config_path,
            tokenizer,
            weights,
        })
    }

    fn from_dir(dir: &Path) -> Result<Self> {
        let required = |name: &str| -> Result<PathBuf> {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(anyhow!("{:?} is missing {}", dir, name))
            }
        };

        let weights = if dir.join(SAFETENSORS_FILE).is_file() {
            Weights::Safetensors(dir.join(SAFETENSORS_FILE))
        } else {
            Weights::Pytorch(required(PYTORCH_FILE)?)
        };

        Ok(Self {
            config: required(CONFIG_FILE)?,
            tokenizer: required(TOKENIZER_FILE)?,
            weights,
        })
    }
}

/// Mean-pooled, L2-normalized BERT sentence embeddings.
pub struct BertEmbedder {
    name: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl BertEmbedder {
    pub fn load(config: &EmbeddingConfig) -> Result<Self> {
        let files = ModelFiles::resolve(config)?;
        let device = Device::Cpu;

        let config_json = std::fs::read_to_string(&files.config)
            .with_context(|| format!("failed to read {:?}", files.config))?;
        let bert_config: Config =
            serde_json::from_str(&config_json).context("unsupported model config")?;
        let HiddenSize { hidden_size } = serde_json::from_str(&config_json)?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("failed to load tokenizer {:?}: {}", files.tokenizer, e))?;
        let padding = match tokenizer.get_padding() {
            Some(existing) => PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..existing.clone()
            },
            None => Self::default_padding(&tokenizer),
        };
        tokenizer.with_padding(Some(padding));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("failed to configure truncation: {}", e))?;

        let vb = match &files.weights {
            // SAFETY: the mapped file is a read-only model artifact that is
            // not modified while the process runs.
            Weights::Safetensors(path) => unsafe {
                VarBuilder::from_mmaped_safetensors(&[path], DTYPE, &device)?
            },
            Weights::Pytorch(path) => VarBuilder::from_pth(path, DTYPE, &device)?,
        };
        let model = BertModel::load(vb, &bert_config).context("failed to build BERT model")?;

        Ok(Self {
            name: config.model.clone(),
            model,
            tokenizer,
            device,
            dimension: hidden_size,
        })
    }

    /// Batch-longest padding with whichever pad token the vocabulary has.
    fn default_padding(tokenizer: &Tokenizer) -> PaddingParams {
        let mut padding = PaddingParams::default();
        for token in ["[PAD]", "<pad>"] {
            if let Some(id) = tokenizer.token_to_id(token) {
                padding.pad_id = id;
                padding.pad_token = token.to_string();
                break;
            }
        }
        padding
    }

    fn forward(&self, texts: &[&str]) -> Result<Tensor> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("tokenization failed: {}", e))?;

        let ids = encodings
            .iter()
            .map(|encoding| Tensor::new(encoding.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let masks = encodings
            .iter()
            .map(|encoding| Tensor::new(encoding.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool(&hidden, &attention_mask)?;
        Ok(l2_normalize(&pooled)?)
    }
}

impl Embedder for BertEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.forward(texts)?.to_vec2::<f32>()?)
    }
}

/// Averages token states over non-padding positions: `(b, s, h) -> (b, h)`.
pub fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?;
    summed.broadcast_div(&counts)
}

/// Scales every row to unit length.
pub fn l2_normalize(vectors: &Tensor) -> candle_core::Result<Tensor> {
    let norms = vectors.sqr()?.sum_keepdim(1)?.sqrt()?;
    vectors.broadcast_div(&norms)
}
