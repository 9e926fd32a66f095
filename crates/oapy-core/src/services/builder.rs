use log::{debug, warn};

use super::grouping::group_services;
use super::model::{Service, ServiceOperation, ServiceTag};
use super::naming::{operation_id, variant_operation_id};
use super::params::{resolve_body_param, resolve_params, resolve_query_params};
use super::return_type::resolve_return_type;
use super::{OperationRenderer, OperationSite, SourceValidator, TypeConverter};
use crate::config::LibraryConfig;
use crate::error::GenerateError;
use crate::parse::OpenApiSpec;

/// Builds, renders and groups service descriptors for a whole document.
pub struct ServiceGenerator<'g> {
    converter: &'g dyn TypeConverter,
    renderer: &'g dyn OperationRenderer,
    validator: Option<&'g dyn SourceValidator>,
}

impl<'g> ServiceGenerator<'g> {
    pub fn new(converter: &'g dyn TypeConverter, renderer: &'g dyn OperationRenderer) -> Self {
        Self {
            converter,
            renderer,
            validator: None,
        }
    }

    /// Run `validator` on every rendered operation.
    pub fn with_validator(mut self, validator: &'g dyn SourceValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Build every descriptor the configuration asks for and group them
    /// into services. Stops at the first fatal error.
    pub fn generate<'s>(
        &self,
        spec: &'s OpenApiSpec,
        config: &LibraryConfig,
    ) -> Result<Vec<Service<'s>>, GenerateError> {
        let operations = self.build_operations(spec, config)?;
        debug!("built {} service operations", operations.len());
        Ok(group_services(operations, config))
    }

    /// Descriptors for every (path, method, call style), in document order.
    pub fn build_operations<'s>(
        &self,
        spec: &'s OpenApiSpec,
        config: &LibraryConfig,
    ) -> Result<Vec<ServiceOperation<'s>>, GenerateError> {
        let mut operations = Vec::new();
        for (path_name, path_item) in &spec.paths {
            for (method, operation) in path_item.operations() {
                let site = OperationSite {
                    path_name,
                    path_item,
                    method,
                    operation,
                    components: spec.components.as_ref(),
                };
                if config.include_sync {
                    operations.push(self.build_operation(&site, false)?);
                }
                if config.include_async {
                    operations.push(self.build_operation(&site, true)?);
                }
            }
        }
        Ok(operations)
    }

    /// Construct, render, tag and check one descriptor.
    pub fn build_operation<'s>(
        &self,
        site: &OperationSite<'s>,
        async_client: bool,
    ) -> Result<ServiceOperation<'s>, GenerateError> {
        let params = resolve_params(site, self.converter)?;
        let operation_id = variant_operation_id(&operation_id(site), async_client);
        let query_params = resolve_query_params(site)?;
        let return_type = resolve_return_type(site, self.converter)?;
        let body_param = resolve_body_param(site.operation);

        let mut so = ServiceOperation {
            params,
            operation_id,
            query_params,
            return_type,
            operation: site.operation,
            path_item: site.path_item,
            content: String::new(),
            async_client,
            body_param,
            path_name: site.path_name.to_string(),
            method: site.method,
            tag: ServiceTag::Untagged,
        };

        so.content = self.renderer.render(&so.render_context())?;

        if let Some(tag) = site.operation.tags.first() {
            so.tag = ServiceTag::Named(tag.clone());
        }

        if let Some(validator) = self.validator {
            if let Err(issue) = validator.validate(&so.content) {
                warn!("Error in service {}: {}", so.operation_id, issue);
            }
        }

        debug!(
            "{} -> {} ({})",
            site.label(),
            so.operation_id,
            so.tag
        );
        Ok(so)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpLibrary;
    use crate::services::test_support::{
        EchoRenderer, FailingRenderer, RecordingValidator, StubConverter, parse_spec, site,
    };

    const SPEC: &str = r##"
openapi: "3.0.3"
info:
  title: Store
  version: "1"
paths:
  /pets:
    get:
      operationId: list-all-pets
      tags: [pets, extra]
      parameters:
        - name: limit
          in: query
          schema:
            type: integer
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: "#/components/schemas/Pet"
    post:
      operationId: createPet
      tags: [pets]
      requestBody:
        content:
          application/json:
            schema:
              $ref: "#/components/schemas/Pet"
  /health:
    get:
      responses:
        "204":
          description: fine
components:
  schemas:
    Pet:
      type: object
"##;

    #[test]
    fn test_build_sync_descriptor() {
        let spec = parse_spec(SPEC);
        let generator = ServiceGenerator::new(&StubConverter, &EchoRenderer);
        let so = generator
            .build_operation(&site(&spec, "/pets", "get"), false)
            .unwrap();

        assert_eq!(so.operation_id, "list_all_pets");
        assert_eq!(so.params, vec!["limit : Optional[int] = None"]);
        assert_eq!(so.query_params, vec!["'limit' : limit"]);
        assert_eq!(so.return_type.list_type.as_deref(), Some("Pet"));
        assert_eq!(so.body_param, None);
        assert_eq!(so.path_name, "/pets");
        assert_eq!(so.tag, ServiceTag::Named("pets".to_string()));
        assert!(!so.async_client);
        assert_eq!(
            so.content,
            "def list_all_pets(limit : Optional[int] = None):\n    pass\n"
        );
    }

    #[test]
    fn test_async_identifier_is_prefixed() {
        let spec = parse_spec(SPEC);
        let generator = ServiceGenerator::new(&StubConverter, &EchoRenderer);
        let s = site(&spec, "/pets", "get");
        let sync = generator.build_operation(&s, false).unwrap();
        let async_op = generator.build_operation(&s, true).unwrap();
        assert_eq!(async_op.operation_id, format!("async_{}", sync.operation_id));
        assert!(async_op.async_client);
    }

    #[test]
    fn test_untagged_and_unnamed_operation() {
        let spec = parse_spec(SPEC);
        let generator = ServiceGenerator::new(&StubConverter, &EchoRenderer);
        let so = generator
            .build_operation(&site(&spec, "/health", "get"), false)
            .unwrap();
        assert_eq!(so.tag, ServiceTag::Untagged);
        assert_eq!(so.operation_id, "list_health");
        assert_eq!(so.return_type.status_code, 204);
    }

    #[test]
    fn test_build_operations_per_configured_variant() {
        let spec = parse_spec(SPEC);
        let generator = ServiceGenerator::new(&StubConverter, &EchoRenderer);

        let both = generator
            .build_operations(&spec, &HttpLibrary::Httpx.config())
            .unwrap();
        let ids: Vec<&str> = both.iter().map(|so| so.operation_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "list_all_pets",
                "async_list_all_pets",
                "createPet",
                "async_createPet",
                "list_health",
                "async_list_health",
            ]
        );

        let sync_only = generator
            .build_operations(&spec, &HttpLibrary::Requests.config())
            .unwrap();
        assert_eq!(sync_only.len(), 3);
        assert!(sync_only.iter().all(|so| !so.async_client));
    }

    #[test]
    fn test_validator_failure_is_not_fatal() {
        let spec = parse_spec(SPEC);
        let validator = RecordingValidator::rejecting();
        let generator =
            ServiceGenerator::new(&StubConverter, &EchoRenderer).with_validator(&validator);
        let services = generator
            .generate(&spec, &HttpLibrary::Httpx.config())
            .unwrap();
        assert_eq!(services.len(), 4);
        assert_eq!(validator.checked(), 6);
    }

    #[test]
    fn test_render_error_is_fatal() {
        let spec = parse_spec(SPEC);
        let generator = ServiceGenerator::new(&StubConverter, &FailingRenderer);
        let err = generator
            .generate(&spec, &HttpLibrary::Httpx.config())
            .unwrap_err();
        assert!(matches!(err, GenerateError::Render(_)));
    }

    #[test]
    fn test_unsupported_body_aborts_generation() {
        let yaml = r#"
openapi: "3.0.3"
info:
  title: Upload
  version: "1"
paths:
  /upload:
    post:
      operationId: upload
      requestBody:
        content:
          multipart/form-data:
            schema:
              type: object
"#;
        let spec = parse_spec(yaml);
        let generator = ServiceGenerator::new(&StubConverter, &EchoRenderer);
        let err = generator
            .build_operations(&spec, &HttpLibrary::Httpx.config())
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedRequestBody { .. }));
    }
}
