use super::Command;
use crate::config::Config;
use crate::error::{IntoReport, Result, WrapErr};
use related_core::discover_languages;
use std::path::PathBuf;

pub struct LanguagesCommand {
    content_root: PathBuf,
}

impl LanguagesCommand {
    pub fn new(cfg: Config, path: Option<PathBuf>) -> Self {
        Self {
            content_root: path.unwrap_or_else(|| cfg.content_root()),
        }
    }
}

#[async_trait::async_trait]
impl Command for LanguagesCommand {
    async fn execute(&self) -> Result<()> {
        let languages = discover_languages(&self.content_root)
            .into_report()
            .wrap_err_with(|| format!("Cannot list languages in {:?}", self.content_root))?;

        if languages.is_empty() {
            eprintln!("⏭️  {:?} 下没有语言目录", self.content_root);
        }
        for lang in languages {
            println!("{}", lang);
        }
        Ok(())
    }
}
