// related-core/src/mapping.rs
//! 映射输出 - section → slug → 相关内容列表

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::RelatedEntry;

/// Related entries computed for one subject document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedRecord {
    pub section: String,
    pub slug: String,
    /// Source document, used to name both sides of a slug collision.
    pub relative_path: String,
    pub entries: Vec<RelatedEntry>,
}

/// Two documents of one section claimed the same slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugCollision {
    pub section: String,
    pub slug: String,
    pub kept: String,
    pub dropped: String,
}

/// The per-language output document. Keys serialize sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelatedContentMap {
    sections: BTreeMap<String, BTreeMap<String, Vec<RelatedEntry>>>,
}

impl RelatedContentMap {
    /// Groups flat records into sections.
    ///
    /// Records with no entries are left out. When a slug repeats within a
    /// section the first record keeps it and the rest are reported back
    /// instead of overwriting it.
    pub fn from_records<I>(records: I) -> (Self, Vec<SlugCollision>)
    where
        I: IntoIterator<Item = RelatedRecord>,
    {
        let mut map = Self::default();
        let mut owners: BTreeMap<(String, String), String> = BTreeMap::new();
        let mut collisions = Vec::new();

        for record in records {
            if record.entries.is_empty() {
                continue;
            }

            let key = (record.section.clone(), record.slug.clone());
            if let Some(kept) = owners.get(&key) {
                tracing::warn!(
                    "slug `{}` in section `{}` is used by both {} and {}; keeping {}",
                    record.slug,
                    record.section,
                    kept,
                    record.relative_path,
                    kept
                );
                collisions.push(SlugCollision {
                    section: record.section,
                    slug: record.slug,
                    kept: kept.clone(),
                    dropped: record.relative_path,
                });
                continue;
            }
            owners.insert(key, record.relative_path);

            map.sections
                .entry(record.section)
                .or_default()
                .insert(record.slug, record.entries);
        }

        (map, collisions)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of slugs with related content, over all sections.
    pub fn len(&self) -> usize {
        self.sections.values().map(BTreeMap::len).sum()
    }

    pub fn get(&self, section: &str, slug: &str) -> Option<&[RelatedEntry]> {
        self.sections
            .get(section)
            .and_then(|slugs| slugs.get(slug))
            .map(Vec::as_slice)
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Output file of one language: `<output_dir>/<lang>.yaml`.
pub fn output_path(output_dir: &Path, lang: &str) -> PathBuf {
    output_dir.join(format!("{}.yaml", lang))
}

/// Replaces the language's output file with `map`.
///
/// The YAML is written to a sibling temporary file first and renamed into
/// place, so readers see either the old file or the complete new one.
pub fn write_mapping(map: &RelatedContentMap, output_dir: &Path, lang: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {:?}", output_dir))?;

    let yaml = map.to_yaml()?;
    let target = output_path(output_dir, lang);
    let staging = output_dir.join(format!(".{}.yaml.tmp", lang));

    if let Err(e) = fs::write(&staging, yaml) {
        let _ = fs::remove_file(&staging);
        return Err(e).with_context(|| format!("failed to write {:?}", staging));
    }
    if let Err(e) = fs::rename(&staging, &target) {
        let _ = fs::remove_file(&staging);
        return Err(e).with_context(|| format!("failed to replace {:?}", target));
    }

    tracing::info!("wrote {:?} ({} entries)", target, map.len());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(section: &str, slug: &str, path: &str, files: &[&str]) -> RelatedRecord {
        RelatedRecord {
            section: section.to_string(),
            slug: slug.to_string(),
            relative_path: path.to_string(),
            entries: files.iter().map(|f| RelatedEntry::new(*f)).collect(),
        }
    }

    #[test]
    fn test_groups_records_and_keeps_entry_order() {
        let (map, collisions) = RelatedContentMap::from_records(vec![
            record("blog", "b", "blog/b.md", &["blog/c", "blog/a"]),
            record("blog", "a", "blog/a.md", &["blog/b"]),
            record("guides", "setup", "guides/setup.md", &["guides"]),
        ]);

        assert!(collisions.is_empty());
        assert_eq!(map.len(), 3);
        assert_eq!(map.sections().collect::<Vec<_>>(), vec!["blog", "guides"]);
        assert_eq!(
            map.get("blog", "b").unwrap(),
            &[RelatedEntry::new("blog/c"), RelatedEntry::new("blog/a")]
        );
    }

    #[test]
    fn test_slug_collision_keeps_first_and_reports() {
        let (map, collisions) = RelatedContentMap::from_records(vec![
            record("blog", "dup", "blog/one.md", &["blog/x"]),
            record("blog", "dup", "blog/two.md", &["blog/y"]),
            record("news", "dup", "news/dup.md", &["news/z"]),
        ]);

        assert_eq!(map.get("blog", "dup").unwrap(), &[RelatedEntry::new("blog/x")]);
        assert_eq!(map.get("news", "dup").unwrap(), &[RelatedEntry::new("news/z")]);
        assert_eq!(
            collisions,
            vec![SlugCollision {
                section: "blog".to_string(),
                slug: "dup".to_string(),
                kept: "blog/one.md".to_string(),
                dropped: "blog/two.md".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_records_are_omitted() {
        let (map, _) = RelatedContentMap::from_records(vec![record("blog", "lonely", "blog/lonely.md", &[])]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_yaml_layout() {
        let (map, _) = RelatedContentMap::from_records(vec![
            record("guides", "setup", "guides/setup.md", &["guides", "guides/faq"]),
            record("blog", "a", "blog/a.md", &["blog/b"]),
        ]);
        let yaml = map.to_yaml().unwrap();
        assert_eq!(
            yaml,
            "blog:\n  a:\n  - file: blog/b\nguides:\n  setup:\n  - file: guides\n  - file: guides/faq\n"
        );

        let parsed: RelatedContentMap = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn test_write_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("data").join("related_content");
        std::fs::create_dir_all(&output_dir).unwrap();
        std::fs::write(output_path(&output_dir, "en"), "stale: {}\n").unwrap();

        let (map, _) = RelatedContentMap::from_records(vec![record("blog", "a", "blog/a.md", &["blog/b"])]);
        let written = write_mapping(&map, &output_dir, "en").unwrap();

        assert_eq!(written, output_dir.join("en.yaml"));
        let content = std::fs::read_to_string(&written).unwrap();
        assert!(!content.contains("stale"));
        assert_eq!(content, map.to_yaml().unwrap());
        assert!(!output_dir.join(".en.yaml.tmp").exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().to_path_buf();
        std::fs::write(output_path(&output_dir, "en"), "blog:\n  a:\n  - file: blog/old\n").unwrap();
        // the staging path is taken by a directory, so the write cannot happen
        std::fs::create_dir_all(output_dir.join(".en.yaml.tmp")).unwrap();

        let (map, _) = RelatedContentMap::from_records(vec![record("blog", "a", "blog/a.md", &["blog/b"])]);
        assert!(write_mapping(&map, &output_dir, "en").is_err());
        assert_eq!(
            std::fs::read_to_string(output_path(&output_dir, "en")).unwrap(),
            "blog:\n  a:\n  - file: blog/old\n"
        );
    }

    #[test]
    fn test_output_dir_that_is_a_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("related_content");
        std::fs::write(&output_dir, "not a directory").unwrap();

        let (map, _) = RelatedContentMap::from_records(vec![record("blog", "a", "blog/a.md", &["blog/b"])]);
        assert!(write_mapping(&map, &output_dir, "en").is_err());
        assert_eq!(std::fs::read_to_string(&output_dir).unwrap(), "not a directory");
    }
}
