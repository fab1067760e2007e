mod engine;
mod analyzer;
mod annotate;
mod body;
mod classifier;
mod model;
mod resolver;
mod type_expr;

// Language-specific extractors
mod languages;

pub use analyzer::ProjectAnalyzer;
pub use annotate::TypeAnnotator;

// Export the main engine
pub use engine::Engine;
