// config/src/lib.rs
//! 平台目录解析
//!
//! Where `related` keeps its configuration file and downloaded models.

pub mod constants;

pub use etcetera::AppStrategy;
use etcetera::{AppStrategyArgs, choose_app_strategy};

use std::path::PathBuf;
use std::env;


pub fn create_strategy() -> std::result::Result<impl AppStrategy, etcetera::HomeDirError> {
    choose_app_strategy(AppStrategyArgs {
        top_level_domain: constants::TOP_LEVEL_DOMAIN.to_string(),
        author: constants::AUTHOR.to_string(),
        app_name: constants::APP_NAME.to_string(),
    })
}

/// `env_key` if set, else what the strategy reports, else a temp dir.
pub fn resolve_dir<S, F>(env_key: &str, strategy: &S, strategy_fn: F) -> PathBuf
where
    S: AppStrategy,
    F: FnOnce(&S) -> Option<PathBuf>,
{
    env::var_os(env_key)
        .map(PathBuf::from)
        .or_else(|| strategy_fn(strategy))
        .unwrap_or_else(|| env::temp_dir().join(constants::APP_NAME))
}

/// Default location of the application configuration file.
pub fn config_file_path<S: AppStrategy>(strategy: &S) -> PathBuf {
    resolve_dir(constants::CONFIG_DIR_ENV, strategy, |s| Some(s.config_dir()))
        .join(constants::CONFIG_FILE_NAME)
}

/// Default cache directory for downloaded models.
pub fn model_cache_dir<S: AppStrategy>(strategy: &S) -> PathBuf {
    resolve_dir(constants::CACHE_DIR_ENV, strategy, |s| Some(s.cache_dir()))
        .join(constants::MODEL_CACHE_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_env_falls_back_to_strategy() {
        let strategy = create_strategy().unwrap();
        let dir = resolve_dir("RELATED_TEST_UNSET_DIRECTORY", &strategy, |s| Some(s.cache_dir()));
        assert_eq!(dir, strategy.cache_dir());
    }

    #[test]
    fn test_missing_strategy_dir_falls_back_to_temp() {
        let strategy = create_strategy().unwrap();
        let dir = resolve_dir("RELATED_TEST_UNSET_DIRECTORY", &strategy, |_| None);
        assert_eq!(dir, env::temp_dir().join(constants::APP_NAME));
    }

    #[test]
    fn test_file_names() {
        let strategy = create_strategy().unwrap();
        assert!(config_file_path(&strategy).ends_with(constants::CONFIG_FILE_NAME));
        assert!(model_cache_dir(&strategy).ends_with(constants::MODEL_CACHE_DIR_NAME));
    }
}
