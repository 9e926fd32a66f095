use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level project configuration loaded from `.oapy.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OapyConfig {
    pub input: String,
    pub output: String,
    pub library: HttpLibrary,
    /// Overrides the library's default for emitting sync operations.
    pub include_sync: Option<bool>,
    /// Overrides the library's default for emitting async operations.
    pub include_async: Option<bool>,
    pub syntax_check: SyntaxCheck,
}

impl Default for OapyConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            output: "src/client".to_string(),
            library: HttpLibrary::Httpx,
            include_sync: None,
            include_async: None,
            syntax_check: SyntaxCheck::Builtin,
        }
    }
}

impl OapyConfig {
    /// Library settings with the sync/async overrides applied.
    pub fn library_config(&self) -> LibraryConfig {
        let mut config = self.library.config();
        if let Some(sync) = self.include_sync {
            config.include_sync = sync;
        }
        if let Some(async_client) = self.include_async {
            config.include_async = async_client;
        }
        config
    }
}

/// HTTP client library the generated code is written against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpLibrary {
    #[default]
    Httpx,
    Requests,
    Aiohttp,
}

impl HttpLibrary {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpLibrary::Httpx => "httpx",
            HttpLibrary::Requests => "requests",
            HttpLibrary::Aiohttp => "aiohttp",
        }
    }

    /// Default template and variant selection for this library.
    pub fn config(&self) -> LibraryConfig {
        let (include_sync, include_async) = match self {
            HttpLibrary::Httpx => (true, true),
            HttpLibrary::Requests => (true, false),
            HttpLibrary::Aiohttp => (false, true),
        };
        LibraryConfig {
            name: self.as_str().to_string(),
            library_import: self.as_str().to_string(),
            template_name: format!("{}.py.j2", self.as_str()),
            include_sync,
            include_async,
        }
    }
}

/// Per-library generation settings handed to the service pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub name: String,
    /// Module the rendered code imports at runtime.
    pub library_import: String,
    pub template_name: String,
    pub include_sync: bool,
    pub include_async: bool,
}

/// Which post-render syntax check to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxCheck {
    Off,
    #[default]
    Builtin,
    Python,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oapy.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OapyConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config = serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oapy configuration
input: openapi.yaml
output: src/client
library: httpx          # httpx | requests | aiohttp

# Override the library defaults (httpx emits both, requests sync only,
# aiohttp async only).
# include_sync: true
# include_async: false

syntax_check: builtin   # off | builtin | python
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OapyConfig::default();
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(config.output, "src/client");
        assert_eq!(config.library, HttpLibrary::Httpx);
        assert_eq!(config.syntax_check, SyntaxCheck::Builtin);

        let library = config.library_config();
        assert_eq!(library.template_name, "httpx.py.j2");
        assert!(library.include_sync);
        assert!(library.include_async);
    }

    #[test]
    fn test_library_defaults() {
        let requests = HttpLibrary::Requests.config();
        assert!(requests.include_sync);
        assert!(!requests.include_async);
        assert_eq!(requests.library_import, "requests");

        let aiohttp = HttpLibrary::Aiohttp.config();
        assert!(!aiohttp.include_sync);
        assert!(aiohttp.include_async);
        assert_eq!(aiohttp.template_name, "aiohttp.py.j2");
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
input: spec.yaml
output: out
library: httpx
include_async: false
syntax_check: python
"#;
        let config: OapyConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.input, "spec.yaml");
        assert_eq!(config.output, "out");
        assert_eq!(config.syntax_check, SyntaxCheck::Python);

        let library = config.library_config();
        assert!(library.include_sync);
        assert!(!library.include_async);
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = "library: aiohttp\n";
        let config: OapyConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.library, HttpLibrary::Aiohttp);
        // Defaults applied
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(config.include_sync, None);
    }

    #[test]
    fn test_default_content_parses() {
        let config: OapyConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.library, HttpLibrary::Httpx);
        assert_eq!(config.output, "src/client");
    }

    #[test]
    fn test_missing_config_file() {
        let loaded = load_config(Path::new("does/not/exist/.oapy.yaml")).unwrap();
        assert!(loaded.is_none());
    }
}
