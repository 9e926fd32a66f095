use std::fmt;

use serde::Serialize;

use crate::parse::{HttpMethod, Operation, PathItem};

/// Result of converting a schema into a target-language type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeConversion {
    /// Schema-side description, e.g. `integer` or `array<#/components/schemas/Pet>`.
    pub original_type: String,
    /// Target-language type expression, e.g. `List[Pet]`.
    pub converted_type: String,
    /// Named types the expression needs imported.
    pub import_types: Vec<String>,
}

impl TypeConversion {
    /// Marker the converter puts in `original_type` for sequence types.
    pub const ARRAY_MARKER: &'static str = "array";

    pub fn new(original_type: impl Into<String>, converted_type: impl Into<String>) -> Self {
        Self {
            original_type: original_type.into(),
            converted_type: converted_type.into(),
            import_types: Vec::new(),
        }
    }

    pub fn with_imports(mut self, import_types: Vec<String>) -> Self {
        self.import_types = import_types;
        self
    }
}

/// What an operation returns, as seen by generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpReturnType {
    /// `None` when there is no usable JSON body.
    #[serde(rename = "type")]
    pub type_conversion: Option<TypeConversion>,
    /// Canonical success status the generated call checks against.
    pub status_code: u16,
    /// The value has to be built from an imported named type.
    pub complex_type: bool,
    /// Element type when the value is a sequence of named types.
    pub list_type: Option<String>,
}

impl OpReturnType {
    pub const DEFAULT_STATUS: u16 = 200;

    /// No usable return value.
    pub fn none(status_code: u16) -> Self {
        Self {
            type_conversion: None,
            status_code,
            complex_type: false,
            list_type: None,
        }
    }
}

/// Tag a descriptor is grouped under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ServiceTag {
    Named(String),
    /// The operation declared no tags.
    #[default]
    Untagged,
}

impl ServiceTag {
    pub fn name(&self) -> Option<&str> {
        match self {
            ServiceTag::Named(name) => Some(name),
            ServiceTag::Untagged => None,
        }
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceTag::Named(name) => f.write_str(name),
            ServiceTag::Untagged => f.write_str("untagged"),
        }
    }
}

/// One operation resolved for one call style (sync or async).
#[derive(Debug, Clone)]
pub struct ServiceOperation<'a> {
    /// Declarations of the form `name : type[ = None]`; the body comes last.
    pub params: Vec<String>,
    pub operation_id: String,
    /// `'name' : name` entries for the query-string mapping.
    pub query_params: Vec<String>,
    pub return_type: OpReturnType,
    pub operation: &'a Operation,
    pub path_item: &'a PathItem,
    pub content: String,
    pub async_client: bool,
    pub body_param: Option<String>,
    pub path_name: String,
    pub method: HttpMethod,
    pub tag: ServiceTag,
}

impl ServiceOperation<'_> {
    /// The explicit set of fields templates may read.
    pub fn render_context(&self) -> OperationContext<'_> {
        OperationContext {
            operation_id: &self.operation_id,
            params: &self.params,
            query_params: &self.query_params,
            return_type: &self.return_type,
            body_param: self.body_param.as_deref(),
            path_name: &self.path_name,
            method: self.method.as_str(),
            async_client: self.async_client,
            summary: self.operation.summary.as_deref(),
            description: self.operation.description.as_deref(),
            deprecated: self.operation.deprecated.unwrap_or(false),
        }
    }
}

/// Rendering context handed to an `OperationRenderer`.
#[derive(Debug, Clone, Serialize)]
pub struct OperationContext<'a> {
    pub operation_id: &'a str,
    pub params: &'a [String],
    pub query_params: &'a [String],
    pub return_type: &'a OpReturnType,
    pub body_param: Option<&'a str>,
    pub path_name: &'a str,
    pub method: &'static str,
    pub async_client: bool,
    pub summary: Option<&'a str>,
    pub description: Option<&'a str>,
    pub deprecated: bool,
}

/// A tag-scoped bundle of rendered operations sharing one call style.
#[derive(Debug, Clone)]
pub struct Service<'a> {
    pub file_name: String,
    pub operations: Vec<ServiceOperation<'a>>,
    pub content: String,
    pub async_client: bool,
    pub library_import: String,
}
