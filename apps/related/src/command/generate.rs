// apps/related/src/command/generate.rs
//! 生成相关内容数据文件

use super::Command;
use crate::config::Config;
use crate::error::{IntoReport, Result, WrapErr};
use crate::progress::LanguageProgress;
use related_core::{discover_languages, LanguageReport, RelatedContentEngine};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct GenerateCommand {
    config: Config,
    languages: Vec<String>,
}

impl GenerateCommand {
    pub fn new(config: Config, languages: Vec<String>) -> Self {
        Self { config, languages }
    }

    /// Requested languages, or every language directory when none were given.
    fn resolve_languages(&self, content_root: &Path) -> Result<Vec<String>> {
        if self.languages.is_empty() {
            return discover_languages(content_root)
                .into_report()
                .wrap_err("Cannot list languages");
        }

        let mut languages = Vec::new();
        for lang in &self.languages {
            if content_root.join(lang).is_dir() {
                languages.push(lang.clone());
            } else {
                tracing::warn!("language directory {:?} does not exist, skipping", content_root.join(lang));
            }
        }
        Ok(languages)
    }

    fn run(
        engine: &mut RelatedContentEngine,
        languages: Vec<String>,
        content_root: PathBuf,
        output_root: PathBuf,
    ) -> Result<Vec<LanguageReport>> {
        // 在处理任何语言之前加载模型，加载失败则不写出任何文件
        let started = Instant::now();
        engine
            .initialize()
            .into_report()
            .wrap_err_with(|| format!("Failed to load embedding model `{}`", engine.model.name()))?;
        println!("🧠 模型已就绪: {} ({:.1}s)", engine.model.name(), started.elapsed().as_secs_f64());

        let mut reports = Vec::with_capacity(languages.len());
        for lang in &languages {
            let progress = LanguageProgress::new(lang);
            let outcome = engine.process_language(lang, &content_root, &output_root, |p| progress.update(p));

            match outcome {
                Ok(report) => {
                    progress.finish();
                    Self::print_report(&report);
                    reports.push(report);
                }
                Err(e) => {
                    progress.abandon();
                    engine.release();
                    return Err(e)
                        .into_report()
                        .wrap_err_with(|| format!("Language `{}` failed", lang));
                }
            }
        }

        engine.release();
        Ok(reports)
    }

    fn print_report(report: &LanguageReport) {
        println!(
            "  🌐 {}: {} 个文档, {} 个排除, {} 个失败, {} 个条目",
            report.lang, report.documents, report.excluded, report.failed, report.mapped
        );
        for collision in &report.collisions {
            println!(
                "     ⚠️  slug `{}` ({}) 重复: 保留 {}, 忽略 {}",
                collision.slug, collision.section, collision.kept, collision.dropped
            );
        }
        match &report.output {
            Some(path) => println!("     ✅ 已写入 {:?}", path),
            None => println!("     ⏭️  没有可写入的内容"),
        }
    }
}

#[async_trait::async_trait]
impl Command for GenerateCommand {
    async fn execute(&self) -> Result<()> {
        let content_root = self.config.content_root();
        let output_root = self.config.output_root();

        let languages = self.resolve_languages(&content_root)?;
        if languages.is_empty() {
            println!("⏭️  {:?} 下没有语言目录", content_root);
            return Ok(());
        }

        println!("\n🔗 生成相关内容");
        println!("📂 内容目录: {:?}", content_root);
        println!("📂 输出目录: {:?}", output_root);
        println!("🌐 语言: {}\n", languages.join(", "));

        let mut engine = RelatedContentEngine::new(
            self.config.related_config(),
            self.config.embedding_config(),
        )
        .into_report()
        .wrap_err("Invalid configuration")?;

        let started = Instant::now();
        let reports = tokio::task::spawn_blocking(move || {
            Self::run(&mut engine, languages, content_root, output_root)
        })
        .await??;

        let written = reports.iter().filter(|r| r.output.is_some()).count();
        println!(
            "\n✨ 完成！{}/{} 个语言已写入 ({:.1}s)",
            written,
            reports.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
