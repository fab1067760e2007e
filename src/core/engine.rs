// src/core/engine.rs
use std::path::{Path, PathBuf};
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use super::model::{load_from_json, save_to_json, Metadata};
use super::{ProjectAnalyzer, TypeAnnotator};

/// Main orchestration engine for pymeta
pub struct Engine {
    config: Config,
}

impl Engine {
    /// Create a new engine instance
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;

        debug!("Loaded configuration: {:?}", config);

        Ok(Self { config })
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Extract metadata for `path` and write it to `output`.
    ///
    /// Nothing is written when `path` is neither a Python file nor a directory.
    pub async fn extract(&self, path: &Path, output: &Path, root: Option<PathBuf>) -> Result<Metadata> {
        let root = match root.or_else(|| self.config.extraction.root.clone()) {
            Some(root) => root,
            None => std::env::current_dir()?,
        };

        let mut analyzer = ProjectAnalyzer::new(&self.config, &root)?;
        info!("Using root path: {}", analyzer.resolver().root().display());

        let metadata = analyzer.analyze(path)?;

        if output.exists() {
            match load_from_json::<Metadata, _>(output) {
                Ok(previous) if previous == metadata => {
                    info!("Metadata unchanged since the last run");
                }
                Ok(_) => debug!("Replacing previous metadata in {}", output.display()),
                Err(e) => debug!("Previous output {} not readable: {}", output.display(), e),
            }
        }

        save_to_json(output, &metadata, self.config.output.pretty)?;
        info!("Metadata has been written to {}", output.display());

        Ok(metadata)
    }

    /// Run the external type checker over `target` and merge its stubs back
    pub async fn annotate(&self, target: &Path, keep_cache: bool) -> Result<()> {
        let annotator = TypeAnnotator::new(&self.config.annotate);
        let summary = annotator.run(target, keep_cache).await?;

        if summary.failed > 0 {
            warn!("⚠️ {} files could not be annotated", summary.failed);
        }
        Ok(())
    }
}
