use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase verbosity. Can be used multiple times (e.g., -v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file to use instead of the platform default
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute related content for every language and write the data files
    Generate(GenerateArgs),
    /// List the languages found under the content directory
    Languages {
        /// Content directory (defaults to <hugo-root>/content)
        #[arg(long, alias = "content-dir")]
        path: Option<PathBuf>,
    },
    /// Delete downloaded embedding models
    ClearCache,
}

/// Flags of `generate`. Every flag left out falls back to the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct GenerateArgs {
    /// Only process these languages (repeatable)
    #[arg(long = "lang", value_name = "CODE")]
    pub languages: Vec<String>,

    /// Hugo site root
    #[arg(long)]
    pub hugo_root: Option<PathBuf>,

    /// Content directory (defaults to <hugo-root>/content)
    #[arg(long, alias = "content-dir")]
    pub path: Option<PathBuf>,

    /// Output directory (defaults to <hugo-root>/data/related_content)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Relative paths or directories to leave out, e.g. `author`
    #[arg(long, num_args = 1..)]
    pub exclude_sections: Option<Vec<String>>,

    /// Hugging Face model id, local model directory, or `hashing`
    #[arg(long)]
    pub model: Option<String>,

    /// Related entries per document
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Characters of each document fed to the model
    #[arg(long)]
    pub text_cap: Option<usize>,

    /// Documents embedded per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Extra neighbors requested beyond top-k
    #[arg(long)]
    pub margin: Option<usize>,
}
