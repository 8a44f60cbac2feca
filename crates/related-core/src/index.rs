// related-core/src/index.rs
//! 相似度索引 - 精确内积最近邻搜索

use anyhow::Result;
use candle_core::{Device, Tensor};

use crate::error::RelatedError;

/// One search hit: the row it refers to and its inner-product score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub score: f32,
}

/// Flat, exact inner-product index over one corpus.
///
/// Rows keep the order they were given in, so row `i` is document `i` for
/// the whole lifetime of the index. Built once, never updated.
pub struct SimilarityIndex {
    vectors: Tensor,
    len: usize,
    dimension: usize,
}

impl SimilarityIndex {
    /// Stacks `vectors` into an `n × d` matrix.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let len = vectors.len();
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);

        if len > 0 && dimension == 0 {
            return Err(RelatedError::DimensionMismatch {
                row: 0,
                expected: 1,
                actual: 0,
            }
            .into());
        }

        let mut flat = Vec::with_capacity(len * dimension);
        for (row, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(RelatedError::DimensionMismatch {
                    row,
                    expected: dimension,
                    actual: vector.len(),
                }
                .into());
            }
            flat.extend_from_slice(vector);
        }

        let vectors = Tensor::from_vec(flat, (len, dimension), &Device::Cpu)?;
        tracing::debug!("built similarity index: {} vectors, {} dimensions", len, dimension);

        Ok(Self {
            vectors,
            len,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Nearest neighbors of the stored row `row`, itself included.
    pub fn search(&self, row: usize, k: usize) -> Result<Vec<Neighbor>> {
        if row >= self.len {
            anyhow::bail!("row {} out of range for index of {} vectors", row, self.len);
        }
        let query = self.vectors.get(row)?;
        self.search_tensor(&query, k)
    }

    /// Up to `min(k, len)` rows ranked by descending inner product with
    /// `query`. Equal scores keep ascending row order.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(RelatedError::DimensionMismatch {
                row: 0,
                expected: self.dimension,
                actual: query.len(),
            }
            .into());
        }
        let query = Tensor::new(query, &Device::Cpu)?;
        self.search_tensor(&query, k)
    }

    fn search_tensor(&self, query: &Tensor, k: usize) -> Result<Vec<Neighbor>> {
        if self.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let scores = self
            .vectors
            .matmul(&query.unsqueeze(1)?.contiguous()?)?
            .squeeze(1)?
            .to_vec1::<f32>()?;

        let mut neighbors: Vec<Neighbor> = scores
            .into_iter()
            .enumerate()
            .map(|(index, score)| Neighbor { index, score })
            .collect();
        // stable: ties stay in row order
        neighbors.sort_by(|a, b| b.score.total_cmp(&a.score));
        neighbors.truncate(k.min(self.len));

        Ok(neighbors)
    }
}
