// apps/related/src/command/clear_cache.rs
//! 清除模型缓存命令

use super::Command;
use crate::config::Config;
use crate::error::Result;
use std::fs;
use std::path::Path;

pub struct ClearCacheCommand {
    config: Config,
}

impl ClearCacheCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Deletes `path`, returning how many files and bytes it held.
    fn remove_dir(path: &Path) -> Result<(usize, u64)> {
        if !path.exists() {
            return Ok((0, 0));
        }
        let counted = Self::count_dir_size(path);
        fs::remove_dir_all(path)?;
        Ok(counted)
    }

    fn count_dir_size(path: &Path) -> (usize, u64) {
        let mut file_count = 0;
        let mut total_size = 0u64;

        if let Ok(entries) = fs::read_dir(path) {
            for entry in entries.flatten() {
                // 不跟随符号链接，hf-hub 的快照目录链接到 blobs
                let Ok(metadata) = entry.path().symlink_metadata() else {
                    continue;
                };
                if metadata.is_file() {
                    total_size += metadata.len();
                    file_count += 1;
                } else if metadata.is_dir() {
                    let (sub_count, sub_size) = Self::count_dir_size(&entry.path());
                    file_count += sub_count;
                    total_size += sub_size;
                }
            }
        }

        (file_count, total_size)
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.2} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.2} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.2} KB", bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", bytes)
        }
    }
}

#[async_trait::async_trait]
impl Command for ClearCacheCommand {
    async fn execute(&self) -> Result<()> {
        let cache_dir = &self.config.cache_dir;
        println!("\n🗑️  清除模型缓存: {:?}", cache_dir);

        match Self::remove_dir(cache_dir)? {
            (0, 0) => println!("⏭️  缓存目录为空或不存在"),
            (count, size) => println!(
                "✨ 清理完成！共删除 {} 个文件，释放 {}",
                count,
                Self::format_size(size)
            ),
        }
        Ok(())
    }
}
