// related-core/src/loader.rs
//! 语料加载模块 - 遍历语言目录并构建文档序列

use std::path::{Component, Path};

use walkdir::{DirEntry, WalkDir};

use crate::config::RelatedConfig;
use crate::extract::parse_markdown_file;
use crate::models::{Document, ROOT_INDEX_SLUG};

/// File stem of a directory landing page.
pub const INDEX_STEM: &str = "_index";

/// Documents of one language plus what was dropped on the way.
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    /// Traversal order; row `i` of every later stage refers to `documents[i]`.
    pub documents: Vec<Document>,
    pub excluded: usize,
    pub failed: usize,
}

/// Whether `relative_path` is removed by one of the exclusion entries.
///
/// An entry matches the exact path or anything below it as a directory, so
/// `author` excludes `author/x.md` but not `authorized/x.md`.
pub fn is_excluded(relative_path: &str, exclusions: &[String]) -> bool {
    exclusions.iter().any(|entry| {
        if relative_path == entry {
            return true;
        }
        let dir = entry.trim_end_matches(['/', '\\']);
        !dir.is_empty()
            && relative_path
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// `/`-joined path of `path` below `root`, or `None` if it is not below it.
pub fn relative_path_string(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// First path segment for nested documents, empty at the corpus root.
pub fn section_of(relative_path: &str) -> &str {
    match relative_path.split_once('/') {
        Some((section, _)) => section,
        None => "",
    }
}

/// Parent directory of a `/`-separated path, empty at the root.
pub fn parent_of(relative_path: &str) -> &str {
    relative_path
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}

fn file_name_of(relative_path: &str) -> &str {
    relative_path
        .rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(relative_path)
}

fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    }
}

/// Relative path with its markup extension removed.
pub fn strip_markup_extension<'a>(relative_path: &'a str, config: &RelatedConfig) -> &'a str {
    match relative_path.rsplit_once('.') {
        Some((without, ext))
            if config.is_markup_extension(ext) && !without.ends_with('/') && !without.is_empty() =>
        {
            without
        }
        _ => relative_path,
    }
}

/// Whether the file is a directory landing page such as `_index.md`.
pub fn is_index_file(file_name: &str, config: &RelatedConfig) -> bool {
    match split_extension(file_name) {
        (stem, Some(ext)) => stem.eq_ignore_ascii_case(INDEX_STEM) && config.is_markup_extension(ext),
        _ => false,
    }
}

/// Output key of a document.
///
/// Index documents are named after their directory (or section, or
/// `index` at the corpus root); other documents use their declared slug
/// and fall back to the file stem.
pub fn derive_slug(relative_path: &str, is_index: bool, declared: Option<&str>) -> String {
    if is_index {
        let parent = parent_of(relative_path);
        if !parent.is_empty() {
            return file_name_of(parent).to_string();
        }
        let section = section_of(relative_path);
        return if section.is_empty() {
            ROOT_INDEX_SLUG.to_string()
        } else {
            section.to_string()
        };
    }

    match declared.map(str::trim).filter(|slug| !slug.is_empty()) {
        Some(slug) => slug.to_string(),
        None => split_extension(file_name_of(relative_path)).0.to_string(),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_markup_file(path: &Path, config: &RelatedConfig) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| config.is_markup_extension(ext))
}

/// Walks one language directory and builds its documents.
///
/// Entries are visited sorted by file name so document order, and with it
/// the output, is stable between runs. Unreadable or unparsable files are
/// logged and skipped.
pub fn load_corpus(root: &Path, config: &RelatedConfig) -> LoadedCorpus {
    let mut corpus = LoadedCorpus::default();

    if !root.is_dir() {
        tracing::warn!("content directory not found: {:?}", root);
        return corpus;
    }

    tracing::debug!("walking content directory: {:?}", root);

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("walk error: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_markup_file(path, config) {
            continue;
        }

        let Some(relative_path) = relative_path_string(root, path) else {
            continue;
        };

        if is_excluded(&relative_path, &config.exclusions) {
            tracing::debug!("excluded: {}", relative_path);
            corpus.excluded += 1;
            continue;
        }

        let parsed = match parse_markdown_file(path, config.text_cap) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("skipping {:?}: {:#}", path, e);
                corpus.failed += 1;
                continue;
            }
        };

        let is_index = is_index_file(file_name_of(&relative_path), config);
        let slug = derive_slug(&relative_path, is_index, parsed.front_matter.slug.as_deref());

        corpus.documents.push(Document {
            section: section_of(&relative_path).to_string(),
            slug,
            title: parsed.front_matter.title.unwrap_or_default(),
            url: parsed.front_matter.url,
            text: parsed.text,
            is_index,
            relative_path,
        });
    }

    tracing::info!(
        "loaded {} documents from {:?} ({} excluded, {} failed)",
        corpus.documents.len(),
        root,
        corpus.excluded,
        corpus.failed
    );

    corpus
}
