use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PymetaError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Declaration extraction settings
    pub extraction: ExtractionConfig,

    /// Directory traversal settings
    pub walk: WalkConfig,

    /// Output settings
    pub output: OutputConfig,

    /// External type annotation tooling
    pub annotate: AnnotateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Root used for module name resolution when `--root` is not given
    pub root: Option<PathBuf>,

    /// File stem that marks a package initializer
    pub package_init: String,

    /// Type reported for parameters without an annotation
    pub any_type: String,

    /// Base class names that mark a class as an interface
    pub interface_bases: Vec<String>,

    /// Decorator names that mark a method as abstract
    pub abstract_decorators: Vec<String>,

    /// Use the syntax tree's end positions for function bodies.
    /// When false, bodies are located by indentation only.
    pub structural_spans: bool,

    /// Report `async def` declarations alongside plain ones
    pub include_async: bool,

    /// Maximum file size to parse (in bytes)
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Descend into hidden files and directories
    pub include_hidden: bool,

    /// Honor .gitignore / .ignore files
    pub respect_ignore_files: bool,

    /// Follow symbolic links
    pub follow_links: bool,

    /// Glob patterns excluded from directory walks
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON with two-space indentation
    pub pretty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    /// Type inference executable
    pub type_checker: String,

    /// Stub merging executable
    pub stub_merger: String,

    /// Cache directory produced by the type checker
    pub cache_dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            root: None,
            package_init: "__init__".to_string(),
            any_type: "Any".to_string(),
            interface_bases: vec![
                "ABC".to_string(),
                "Protocol".to_string(),
                "Interface".to_string(),
            ],
            abstract_decorators: vec!["abstractmethod".to_string()],
            structural_spans: true,
            include_async: false,
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            include_hidden: true,
            respect_ignore_files: false,
            follow_links: false,
            exclude: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            type_checker: "pytype".to_string(),
            stub_merger: "merge-pyi".to_string(),
            cache_dir: PathBuf::from(".pytype"),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PymetaError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Err(PymetaError::Config(format!(
                        "config file {} not found",
                        p.as_ref().display()
                    )))
                }
            }
            None => {
                let candidates = ["pymeta.toml", ".pymeta.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}
