// config/src/constants.rs
//! 应用级常量

pub const TOP_LEVEL_DOMAIN: &str = "io";
pub const AUTHOR: &str = "gohugo";
pub const APP_NAME: &str = "related";

/// Application configuration file, looked up in the platform config dir.
pub const CONFIG_FILE_NAME: &str = "related.toml";

/// Overrides the model download cache directory.
pub const CACHE_DIR_ENV: &str = "CACHE_DIRECTORY";
/// Overrides the directory holding [`CONFIG_FILE_NAME`].
pub const CONFIG_DIR_ENV: &str = "CONFIG_DIRECTORY";

/// Sub-directory of the cache dir that hf-hub downloads into.
pub const MODEL_CACHE_DIR_NAME: &str = "models";
