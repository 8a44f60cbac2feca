pub mod clear_cache;
pub mod generate;
pub mod languages;

use crate::error::Result;

pub use clear_cache::ClearCacheCommand;
pub use generate::GenerateCommand;
pub use languages::LanguagesCommand;

#[async_trait::async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
