use log::info;
use oapy_core::config::{LibraryConfig, SyntaxCheck};
use oapy_core::parse::OpenApiSpec;
use oapy_core::services::{Service, ServiceGenerator};
use oapy_core::{CodeGenerator, GenerateError, GeneratedFile};

use crate::renderer::TemplateRenderer;
use crate::syntax::validator_for;
use crate::type_mapper::PythonTypeConverter;

/// Directory the service modules are written to, relative to the output root.
pub const SERVICES_DIR: &str = "services";

/// Python client generator: one module per (tag, call style) service.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonClientGenerator {
    pub syntax_check: SyntaxCheck,
}

impl PythonClientGenerator {
    pub fn new(syntax_check: SyntaxCheck) -> Self {
        Self { syntax_check }
    }

    /// Build and group the service descriptors without writing modules.
    pub fn services<'s>(
        &self,
        spec: &'s OpenApiSpec,
        config: &LibraryConfig,
    ) -> Result<Vec<Service<'s>>, GenerateError> {
        let renderer = TemplateRenderer::new(&config.template_name)?;
        self.services_with(&renderer, spec, config)
    }

    fn services_with<'s>(
        &self,
        renderer: &TemplateRenderer,
        spec: &'s OpenApiSpec,
        config: &LibraryConfig,
    ) -> Result<Vec<Service<'s>>, GenerateError> {
        let converter = PythonTypeConverter;
        let validator = validator_for(self.syntax_check);

        let mut generator = ServiceGenerator::new(&converter, renderer);
        if let Some(validator) = validator.as_deref() {
            generator = generator.with_validator(validator);
        }
        generator.generate(spec, config)
    }
}

impl CodeGenerator for PythonClientGenerator {
    fn generate(
        &self,
        spec: &OpenApiSpec,
        config: &LibraryConfig,
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        let renderer = TemplateRenderer::new(&config.template_name)?;
        let services = self.services_with(&renderer, spec, config)?;

        let mut files = Vec::with_capacity(services.len() + 1);
        for service in &services {
            files.push(GeneratedFile {
                path: format!("{}/{}.py", SERVICES_DIR, service.file_name),
                content: renderer.render_service(service)?,
            });
        }
        files.push(GeneratedFile {
            path: format!("{}/__init__.py", SERVICES_DIR),
            content: String::new(),
        });

        info!(
            "generated {} {} service module(s)",
            services.len(),
            config.name
        );
        Ok(files)
    }
}
