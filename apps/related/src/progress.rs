//! 终端进度显示

use indicatif::{ProgressBar, ProgressStyle};
use related_core::Progress;
use std::time::Duration;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// One progress bar per language, driven by pipeline [`Progress`] events.
pub struct LanguageProgress {
    lang: String,
    bar: ProgressBar,
}

impl LanguageProgress {
    pub fn new(lang: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::style("{spinner} [{elapsed}] {prefix} {wide_msg}"));
        bar.set_prefix(lang.to_string());
        bar.set_message("加载文档...");
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            lang: lang.to_string(),
            bar,
        }
    }

    fn style(template: &str) -> ProgressStyle {
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
            .progress_chars("#>-")
    }

    pub fn update(&self, progress: Progress) {
        match progress {
            Progress::Loaded { documents } => {
                self.bar.set_message(format!("{} 个文档", documents));
            }
            Progress::Embedding { done, total } => {
                self.switch_to_bar("嵌入", total);
                self.bar.set_position(done as u64);
            }
            Progress::Searching { done, total } => {
                self.switch_to_bar("检索", total);
                self.bar.set_position(done as u64);
            }
        }
    }

    fn switch_to_bar(&self, stage: &str, total: usize) {
        if self.bar.length() != Some(total as u64) || self.bar.message() != stage {
            self.bar.set_style(Self::style(
                "{spinner} [{elapsed}] {prefix} {msg} [{bar:30}] {pos}/{len}",
            ));
            self.bar.set_length(total as u64);
            self.bar.set_position(0);
            self.bar.set_message(stage.to_string());
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(&self) {
        self.bar.abandon_with_message(format!("{} 失败", self.lang));
    }
}
