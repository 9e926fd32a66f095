//! Derivation of service operation descriptors and their grouping into
//! per-tag service modules.
//!
//! The pipeline is language-neutral; type names, templates and syntax checks
//! come from the collaborator traits defined here.

pub mod builder;
pub mod grouping;
pub mod model;
pub mod naming;
pub mod params;
pub mod return_type;

use std::fmt;

pub use builder::ServiceGenerator;
pub use grouping::group_services;
pub use model::{
    OpReturnType, OperationContext, Service, ServiceOperation, ServiceTag, TypeConversion,
};

use crate::error::RenderError;
use crate::parse::{Components, HttpMethod, Operation, PathItem, Schema};

/// Maps an inline schema to a target-language type.
///
/// Implementations must be deterministic. Sequence types carry
/// [`TypeConversion::ARRAY_MARKER`] in `original_type` and list their element
/// type first in `import_types` when it is a named type.
pub trait TypeConverter {
    fn convert(&self, schema: &Schema, required: bool) -> TypeConversion;
}

/// Renders one descriptor into source text.
pub trait OperationRenderer {
    fn render(&self, context: &OperationContext<'_>) -> Result<String, RenderError>;
}

/// Best-effort syntax check run on rendered operations.
pub trait SourceValidator {
    fn validate(&self, source: &str) -> Result<(), SyntaxIssue>;
}

/// A problem found by a `SourceValidator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based line, when known.
    pub line: Option<usize>,
    pub message: String,
}

impl SyntaxIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// An operation together with where it was declared.
#[derive(Debug, Clone, Copy)]
pub struct OperationSite<'a> {
    pub path_name: &'a str,
    pub path_item: &'a PathItem,
    pub method: HttpMethod,
    pub operation: &'a Operation,
    pub components: Option<&'a Components>,
}

impl OperationSite<'_> {
    /// `POST /pets`, used in error messages.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path_name)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::Cell;

    use super::*;
    use crate::parse::{OpenApiSpec, RefOr, SchemaOrRef, SchemaType, TypeSet, short_name};

    /// Minimal Python-flavoured converter for pipeline tests.
    pub struct StubConverter;

    impl TypeConverter for StubConverter {
        fn convert(&self, schema: &Schema, required: bool) -> TypeConversion {
            let conversion = convert_inline(schema);
            if required {
                conversion
            } else {
                TypeConversion {
                    converted_type: format!("Optional[{}]", conversion.converted_type),
                    ..conversion
                }
            }
        }
    }

    fn convert_any(schema: &SchemaOrRef) -> TypeConversion {
        match schema {
            RefOr::Ref { ref_path } => {
                let name = short_name(ref_path);
                TypeConversion::new(ref_path.clone(), name).with_imports(vec![name.to_string()])
            }
            RefOr::Item(schema) => convert_inline(schema),
        }
    }

    fn convert_inline(schema: &Schema) -> TypeConversion {
        let Some(TypeSet::Single(schema_type)) = &schema.schema_type else {
            return TypeConversion::new("object", "Any");
        };
        let name = match *schema_type {
            SchemaType::Array => {
                let inner = schema
                    .items
                    .as_ref()
                    .map(convert_any)
                    .unwrap_or_else(|| TypeConversion::new("object", "Any"));
                return TypeConversion::new(
                    format!("array<{}>", inner.original_type),
                    format!("List[{}]", inner.converted_type),
                )
                .with_imports(inner.import_types);
            }
            SchemaType::String => "str",
            SchemaType::Integer => "int",
            SchemaType::Number => "float",
            SchemaType::Boolean => "bool",
            SchemaType::Object => "Dict[str, Any]",
            SchemaType::Null => "None",
        };
        TypeConversion::new(schema_type.as_str(), name)
    }

    /// Renders a one-line Python stub of the signature.
    pub struct EchoRenderer;

    impl OperationRenderer for EchoRenderer {
        fn render(&self, context: &OperationContext<'_>) -> Result<String, RenderError> {
            Ok(format!(
                "def {}({}):\n    pass\n",
                context.operation_id,
                context.params.join(", ")
            ))
        }
    }

    pub struct FailingRenderer;

    impl OperationRenderer for FailingRenderer {
        fn render(&self, _context: &OperationContext<'_>) -> Result<String, RenderError> {
            Err(RenderError {
                template: "broken.py.j2".to_string(),
                message: "template not found".to_string(),
            })
        }
    }

    /// Counts validations and optionally rejects everything.
    pub struct RecordingValidator {
        reject: bool,
        calls: Cell<usize>,
    }

    impl RecordingValidator {
        pub fn rejecting() -> Self {
            Self {
                reject: true,
                calls: Cell::new(0),
            }
        }

        pub fn checked(&self) -> usize {
            self.calls.get()
        }
    }

    impl SourceValidator for RecordingValidator {
        fn validate(&self, _source: &str) -> Result<(), SyntaxIssue> {
            self.calls.set(self.calls.get() + 1);
            if self.reject {
                Err(SyntaxIssue::at_line(1, "rejected"))
            } else {
                Ok(())
            }
        }
    }

    pub fn parse_spec(yaml: &str) -> OpenApiSpec {
        crate::parse::from_yaml(yaml).unwrap()
    }

    pub fn site<'a>(spec: &'a OpenApiSpec, path: &str, method: &str) -> OperationSite<'a> {
        let (path_name, path_item) = spec.paths.get_key_value(path).unwrap();
        let method = HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == method)
            .unwrap();
        OperationSite {
            path_name,
            path_item,
            method,
            operation: path_item.operation(method).unwrap(),
            components: spec.components.as_ref(),
        }
    }
}
