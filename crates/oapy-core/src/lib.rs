pub mod config;
pub mod error;
pub mod parse;
pub mod services;

pub use error::GenerateError;

/// A generated file with path and content.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Trait for code generators that turn a parsed spec into output files.
pub trait CodeGenerator {
    fn generate(
        &self,
        spec: &parse::OpenApiSpec,
        config: &config::LibraryConfig,
    ) -> Result<Vec<GeneratedFile>, GenerateError>;
}
