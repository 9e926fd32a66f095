use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unresolved reference: {0}")]
    UnresolvedRef(String),

    #[error("circular reference detected: {0}")]
    CircularRef(String),

    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),
}

/// A template could not be loaded or rendered.
#[derive(Debug, Error)]
#[error("failed to render template `{template}`: {message}")]
pub struct RenderError {
    pub template: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml_ng::Error,
    },
}

/// Fatal errors raised while deriving service descriptors.
///
/// These mean the input uses something outside the supported subset; the
/// run stops instead of emitting a partially wrong client.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{operation}: unsupported request body media type(s) [{media_types}], only application/json is supported")]
    UnsupportedRequestBody {
        operation: String,
        media_types: String,
    },

    #[error("{operation}: response {status} declares application/json without a schema")]
    UnsupportedReturnSchema { operation: String, status: String },

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
