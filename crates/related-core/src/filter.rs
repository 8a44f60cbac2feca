// related-core/src/filter.rs
//! 结果过滤 - 把原始近邻列表转换成有效的站内链接

use crate::config::RelatedConfig;
use crate::index::Neighbor;
use crate::loader::{parent_of, strip_markup_extension};
use crate::models::{Document, RelatedEntry};

/// Path a document is linked by: extension stripped, and for landing
/// pages the directory they introduce.
///
/// `blog/post.md` → `blog/post`, `guides/_index.md` → `guides`. A root
/// landing page has no directory and keeps `_index`.
pub fn link_path(document: &Document, config: &RelatedConfig) -> String {
    let without_extension = strip_markup_extension(&document.relative_path, config);
    if document.is_index {
        let parent = parent_of(without_extension);
        if !parent.is_empty() {
            return parent.to_string();
        }
    }
    without_extension.to_string()
}

/// Whether `document` is queried for related content at all. Root-level
/// documents only ever appear as targets.
pub fn is_subject(document: &Document) -> bool {
    !document.section.is_empty()
}

/// Turns the raw neighbors of `documents[subject]` into at most `top_k`
/// entries, skipping every candidate that resolves to the subject itself.
pub fn filter_neighbors(
    subject: usize,
    neighbors: &[Neighbor],
    documents: &[Document],
    config: &RelatedConfig,
) -> Vec<RelatedEntry> {
    let identity = link_path(&documents[subject], config);
    let mut entries = Vec::with_capacity(config.top_k);

    for neighbor in neighbors {
        if entries.len() >= config.top_k {
            break;
        }
        let Some(candidate) = documents.get(neighbor.index) else {
            continue;
        };

        let target = link_path(candidate, config);
        if neighbor.index == subject || target == identity {
            continue;
        }

        entries.push(RelatedEntry::new(target));
    }

    entries
}
