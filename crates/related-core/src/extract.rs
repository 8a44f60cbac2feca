// related-core/src/extract.rs
//! 文本提取模块
//!
//! Turns a markdown file into its metadata block and a bounded plain-text
//! body suitable for embedding.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;

use crate::error::RelatedError;
use crate::models::FrontMatter;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)|<[^>]*>").unwrap());

/// Metadata block syntax, told apart by its fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterFormat {
    /// `+++` fenced TOML, Hugo's default.
    Toml,
    /// `---` fenced YAML.
    Yaml,
}

impl FrontMatterFormat {
    fn fence(self) -> &'static str {
        match self {
            FrontMatterFormat::Toml => "+++",
            FrontMatterFormat::Yaml => "---",
        }
    }
}

/// A parsed markdown document before it is placed in a corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMarkdown {
    pub front_matter: FrontMatter,
    /// Normalized and truncated plain text.
    pub text: String,
}

/// 智能读取文本文件（自动检测编码）
pub fn read_text_with_encoding_detection(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {:?}", path))?;

    if let Ok(text) = std::str::from_utf8(&bytes) {
        return Ok(text.to_string());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&bytes, true);
    let detected_encoding = detector.guess(None, true);

    tracing::debug!("detected encoding {} for {:?}", detected_encoding.name(), path);

    let (decoded, encoding_used, had_errors) = detected_encoding.decode(&bytes);
    if had_errors {
        tracing::warn!(
            "{:?} decoded as {} with replacement characters, embedding quality may suffer",
            path,
            encoding_used.name()
        );
    }

    Ok(decoded.into_owned())
}

/// Splits a leading metadata block off `content`.
///
/// Returns the block (without fences) and the remaining body. A document
/// whose opening fence is never closed has no metadata block.
pub fn split_front_matter(content: &str) -> (Option<(FrontMatterFormat, &str)>, &str) {
    let stripped = content.strip_prefix('\u{feff}').unwrap_or(content);

    let format = if stripped.starts_with("+++") {
        FrontMatterFormat::Toml
    } else if stripped.starts_with("---") {
        FrontMatterFormat::Yaml
    } else {
        return (None, content);
    };

    let mut lines = stripped.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, content);
    };
    if first.trim_end() != format.fence() {
        return (None, content);
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == format.fence() {
            let block = &stripped[start..offset];
            let body = &stripped[offset + line.len()..];
            return (Some((format, block)), body);
        }
        offset += line.len();
    }

    (None, content)
}

/// Deserializes the recognized fields of a metadata block.
pub fn parse_front_matter(
    path: &Path,
    format: FrontMatterFormat,
    block: &str,
) -> Result<FrontMatter, RelatedError> {
    if block.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    let parsed = match format {
        FrontMatterFormat::Toml => toml::from_str(block).map_err(|e| e.to_string()),
        FrontMatterFormat::Yaml => serde_yaml::from_str(block).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| RelatedError::FrontMatter {
        path: path.to_path_buf(),
        message,
    })
}

/// Renders markdown and keeps only its text, whitespace collapsed.
///
/// Element boundaries become a single space so words from adjacent blocks
/// never run together. Raw HTML is reduced to the text between its tags.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut raw = String::with_capacity(markdown.len());
    // HTML blocks arrive one line per event; tags and comments may span lines
    let mut html_block: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::HtmlBlock) => html_block = Some(String::new()),
            Event::End(TagEnd::HtmlBlock) => {
                if let Some(block) = html_block.take() {
                    push_html_text(&mut raw, &block);
                }
            }
            Event::Text(text) | Event::Code(text) => raw.push_str(&text),
            Event::Html(html) | Event::InlineHtml(html) => match html_block.as_mut() {
                Some(block) => block.push_str(&html),
                None => push_html_text(&mut raw, &html),
            },
            Event::Start(_)
            | Event::End(_)
            | Event::SoftBreak
            | Event::HardBreak
            | Event::Rule => raw.push(' '),
            _ => {}
        }
    }

    collapse_whitespace(&raw)
}

fn push_html_text(raw: &mut String, html: &str) {
    raw.push(' ');
    raw.push_str(&HTML_TAG.replace_all(html, " "));
    raw.push(' ');
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Reads and normalizes one markdown file.
pub fn parse_markdown_file(path: &Path, text_cap: usize) -> Result<ParsedMarkdown> {
    let content = read_text_with_encoding_detection(path)?;
    parse_markdown(path, &content, text_cap)
}

/// Normalizes already-loaded markdown. `path` is only used for errors.
pub fn parse_markdown(path: &Path, content: &str, text_cap: usize) -> Result<ParsedMarkdown> {
    let (block, body) = split_front_matter(content);

    let front_matter = match block {
        Some((format, block)) => parse_front_matter(path, format, block)?,
        None => FrontMatter::default(),
    };

    let text = markdown_to_text(body);
    let text = truncate_chars(&text, text_cap).to_string();

    Ok(ParsedMarkdown { front_matter, text })
}
