pub mod generator;
pub mod renderer;
pub mod syntax;
pub mod type_mapper;

pub use generator::PythonClientGenerator;
pub use renderer::TemplateRenderer;
pub use syntax::{PythonCompileCheck, PythonSourceCheck};
pub use type_mapper::PythonTypeConverter;
