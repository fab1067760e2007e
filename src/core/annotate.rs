use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::AnnotateConfig;
use crate::error::{PymetaError, Result};
use super::resolver::absolutize;

/// Counts from merging inferred stubs back into sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub merged: usize,
    pub failed: usize,
}

/// Writes inferred type annotations into Python sources by running an
/// external type checker and merging the stubs it leaves in its cache
pub struct TypeAnnotator {
    config: AnnotateConfig,
}

impl TypeAnnotator {
    pub fn new(config: &AnnotateConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub async fn run(&self, target: &Path, keep_cache: bool) -> Result<MergeSummary> {
        if !target.exists() {
            return Err(PymetaError::InvalidInput(target.to_path_buf()));
        }

        self.infer(target).await?;
        let summary = self.merge(target).await?;

        if !keep_cache {
            self.clean().await?;
        }

        Ok(summary)
    }

    async fn infer(&self, target: &Path) -> Result<()> {
        info!("Running {} on {}", self.config.type_checker, target.display());
        let status = Command::new(&self.config.type_checker)
            .arg(target)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(PymetaError::Tool {
                tool: self.config.type_checker.clone(),
                status: status.to_string(),
            })
        }
    }

    async fn merge(&self, target: &Path) -> Result<MergeSummary> {
        let stub_dir = self.config.cache_dir.join("pyi");
        if !stub_dir.exists() {
            warn!("{} directory not found", stub_dir.display());
            return Ok(MergeSummary::default());
        }

        let mut summary = MergeSummary::default();
        for source in source_files(target) {
            let Some(stub) = self.stub_path(&source) else {
                debug!("{} is outside the working directory, not merging", source.display());
                continue;
            };
            if !stub.exists() {
                debug!("No stub for {}", source.display());
                continue;
            }

            info!("Merging type info for: {}", source.display());
            let status = Command::new(&self.config.stub_merger)
                .arg("-i")
                .arg(&source)
                .arg(&stub)
                .status()
                .await;

            match status {
                Ok(status) if status.success() => summary.merged += 1,
                Ok(status) => {
                    warn!("Error merging {}: {} {}", source.display(), self.config.stub_merger, status);
                    summary.failed += 1;
                }
                Err(e) => {
                    warn!("Error merging {}: {}", source.display(), e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Merged type info for {} files ({} failed)",
            summary.merged, summary.failed
        );
        Ok(summary)
    }

    /// `<cache>/pyi/<source relative to cwd>i`, or `None` for sources
    /// outside the working directory, which the type checker does not mirror
    fn stub_path(&self, source: &Path) -> Option<PathBuf> {
        let absolute = absolutize(source);
        let cwd = std::env::current_dir().ok()?;
        let relative = absolute.strip_prefix(&cwd).ok()?;

        let mut stub: OsString = self.config.cache_dir.join("pyi").join(relative).into_os_string();
        stub.push("i");
        Some(PathBuf::from(stub))
    }

    async fn clean(&self) -> Result<()> {
        if self.config.cache_dir.exists() {
            info!("Cleaning up {} directory", self.config.cache_dir.display());
            tokio::fs::remove_dir_all(&self.config.cache_dir).await?;
        }
        Ok(())
    }
}

/// The target itself when it is a `.py` file, otherwise every `.py` file below it
fn source_files(target: &Path) -> Vec<PathBuf> {
    let is_python = |path: &Path| path.extension().is_some_and(|ext| ext == "py");

    if target.is_file() {
        return if is_python(target) {
            vec![target.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    WalkDir::new(target)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_python(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}
