use crate::cli::GenerateArgs;
use crate::error::{Result, WrapErr};
use config::{AppStrategy, config_file_path, create_strategy, model_cache_dir};
use related_core::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_MARGIN, DEFAULT_MODEL, DEFAULT_REVISION, DEFAULT_TEXT_CAP,
    DEFAULT_TOP_K,
};
use related_core::{EmbeddingConfig, RelatedConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default = "default_config", deny_unknown_fields)]
pub struct Config {
    /// Hugo 站点根目录
    pub hugo_root: PathBuf,
    /// 内容目录，默认 `<hugo-root>/content`
    pub content_dir: Option<PathBuf>,
    /// 输出目录，默认 `<hugo-root>/data/related_content`
    pub output_dir: Option<PathBuf>,
    /// 模型下载缓存目录
    pub cache_dir: PathBuf,
    pub exclude_sections: Vec<String>,
    pub model: String,
    pub revision: String,
    pub top_k: usize,
    pub text_cap: usize,
    pub batch_size: usize,
    pub margin: usize,
    pub extensions: Vec<String>,
}

fn default_cache_dir() -> PathBuf {
    match create_strategy() {
        Ok(strategy) => model_cache_dir(&strategy),
        Err(_) => std::env::temp_dir()
            .join(config::constants::APP_NAME)
            .join(config::constants::MODEL_CACHE_DIR_NAME),
    }
}

fn default_config() -> Config {
    Config {
        hugo_root: PathBuf::from("."),
        content_dir: None,
        output_dir: None,
        cache_dir: default_cache_dir(),
        exclude_sections: vec![],
        model: DEFAULT_MODEL.to_string(),
        revision: DEFAULT_REVISION.to_string(),
        top_k: DEFAULT_TOP_K,
        text_cap: DEFAULT_TEXT_CAP,
        batch_size: DEFAULT_BATCH_SIZE,
        margin: DEFAULT_MARGIN,
        extensions: vec!["md".to_string()],
    }
}

impl Default for Config {
    fn default() -> Self {
        default_config()
    }
}

impl Config {
    fn load_str(user_config_str: &str) -> Result<Config> {
        let user_config: Config = toml::from_str(user_config_str)?;
        Ok(user_config)
    }

    /// Reads `explicit` if given, otherwise the platform config file,
    /// creating an annotated example there on first run.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            let user_config_str = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Cannot read config file {:?}", path))?;
            return Self::load_str(&user_config_str)
                .wrap_err_with(|| format!("Invalid config file {:?}", path));
        }

        let strategy = create_strategy()?;
        let config_path = config_file_path(&strategy);
        tracing::debug!("config dir: {:?}", strategy.config_dir());

        match std::fs::read_to_string(&config_path) {
            Ok(user_config_str) => Self::load_str(&user_config_str)
                .wrap_err_with(|| format!("Invalid config file {:?}", config_path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // 配置文件不存在，创建示例配置文件
                Self::create_example_config(&config_path)?;
                Self::load_str("")
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create_example_config(config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let example_config = r#"# related 配置文件
#
# 此文件在首次运行时自动创建，命令行参数优先于这里的设置

# Hugo 站点根目录
# hugo-root = "/path/to/site"

# 可选：内容目录与输出目录（默认 <hugo-root>/content 与 <hugo-root>/data/related_content）
# content-dir = "/path/to/site/content"
# output-dir = "/path/to/site/data/related_content"

# 不参与相关内容计算的路径或目录
exclude-sections = [
    # "author",
]

# Hugging Face 模型、本地模型目录，或 "hashing"（无需下载）
# model = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
# revision = "main"

# top-k = 3
# text-cap = 1000
# batch-size = 8
# margin = 5
# extensions = ["md"]

# 可选：自定义模型缓存目录
# cache-dir = "/custom/cache/path"
"#;

        std::fs::write(config_path, example_config)?;
        eprintln!("📝 已创建配置文件: {:?}", config_path);
        Ok(())
    }

    /// Applies the flags given on the command line over the file values.
    pub fn merge_args(&mut self, args: &GenerateArgs) {
        if let Some(hugo_root) = &args.hugo_root {
            self.hugo_root = hugo_root.clone();
        }
        if let Some(path) = &args.path {
            self.content_dir = Some(path.clone());
        }
        if let Some(output_dir) = &args.output_dir {
            self.output_dir = Some(output_dir.clone());
        }
        if let Some(exclude_sections) = &args.exclude_sections {
            self.exclude_sections = exclude_sections.clone();
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(top_k) = args.top_k {
            self.top_k = top_k;
        }
        if let Some(text_cap) = args.text_cap {
            self.text_cap = text_cap;
        }
        if let Some(batch_size) = args.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(margin) = args.margin {
            self.margin = margin;
        }
    }

    pub fn content_root(&self) -> PathBuf {
        self.content_dir
            .clone()
            .unwrap_or_else(|| self.hugo_root.join("content"))
    }

    pub fn output_root(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.hugo_root.join("data").join("related_content"))
    }

    pub fn related_config(&self) -> RelatedConfig {
        RelatedConfig {
            top_k: self.top_k,
            text_cap: self.text_cap,
            batch_size: self.batch_size,
            margin: self.margin,
            exclusions: self.exclude_sections.clone(),
            extensions: self.extensions.clone(),
        }
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            model: self.model.clone(),
            revision: self.revision.clone(),
            cache_dir: Some(self.cache_dir.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::load_str("").unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.content_root(), PathBuf::from("./content"));
        assert_eq!(config.output_root(), PathBuf::from("./data/related_content"));
        assert_eq!(config.related_config(), RelatedConfig::default());
    }

    #[test]
    fn test_kebab_case_keys() {
        let config = Config::load_str(
            r#"
hugo-root = "/srv/site"
exclude-sections = ["author"]
top-k = 5
model = "hashing"
"#,
        )
        .unwrap();

        assert_eq!(config.content_root(), PathBuf::from("/srv/site/content"));
        assert_eq!(config.related_config().exclusions, vec!["author"]);
        assert_eq!(config.related_config().top_k, 5);
        assert_eq!(config.embedding_config().model, "hashing");
    }

    #[rstest]
    #[case("watch-paths = []")]
    #[case("top_k = 3")]
    fn test_unknown_keys_are_rejected(#[case] content: &str) {
        assert!(Config::load_str(content).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut config = Config::load_str("top-k = 5\nmodel = \"hashing\"\n").unwrap();
        config.merge_args(&GenerateArgs {
            hugo_root: Some(PathBuf::from("site")),
            output_dir: Some(PathBuf::from("out")),
            top_k: Some(2),
            ..GenerateArgs::default()
        });

        assert_eq!(config.top_k, 2);
        assert_eq!(config.model, "hashing");
        assert_eq!(config.content_root(), PathBuf::from("site/content"));
        assert_eq!(config.output_root(), PathBuf::from("out"));
    }

    #[test]
    fn test_explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("related.toml");
        std::fs::write(&path, "batch-size = 16\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.batch_size, 16);
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("related.toml");
        Config::create_example_config(&path).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.exclude_sections.is_empty());
    }
}
