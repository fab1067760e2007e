use clap::Parser;
use std::path::PathBuf;
use anyhow::Result;

use crate::core::Engine;

#[derive(Parser)]
#[command(name = "pymeta")]
#[command(about = "Extract structural metadata from Python sources")]
#[command(version)]
pub struct Cli {
    /// Python file or directory to analyze
    pub path: PathBuf,

    /// Where to write the metadata JSON
    #[arg(short, long, default_value = "metadata.json")]
    pub output: PathBuf,

    /// Directory module names are resolved against (defaults to the current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Infer and merge type annotations into the sources before extracting
    #[arg(long)]
    pub annotate: bool,

    /// Keep the type checker's cache directory after annotating
    #[arg(long, requires = "annotate")]
    pub keep_cache: bool,
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        if self.annotate {
            engine.annotate(&self.path, self.keep_cache).await?;
        }

        engine.extract(&self.path, &self.output, self.root).await?;
        Ok(())
    }
}
