//! Language-specific declaration extractors
//!
//! Each language gets its own module implementing [`LanguageExtractor`], which
//! turns one file's source text into a [`FileRecord`].

mod python;

pub use python::PythonExtractor;

use crate::error::Result;
use super::model::{FileLocation, FileRecord};

/// Trait that all language extractors must implement
pub trait LanguageExtractor {
    /// Parse source code and extract its declarations
    fn extract(&mut self, source: &str, location: FileLocation) -> Result<FileRecord>;

    /// Get the file extensions this extractor handles
    fn file_extensions(&self) -> &[&str];

    /// Get the language name
    fn language_name(&self) -> &str;
}
