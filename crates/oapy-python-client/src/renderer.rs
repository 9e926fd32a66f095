use minijinja::Environment;
use oapy_core::error::RenderError;
use oapy_core::services::{OperationContext, OperationRenderer, Service};
use serde::Serialize;

/// Wraps each service file's operations.
pub const SERVICE_TEMPLATE: &str = "service.py.j2";

const TEMPLATES: [(&str, &str); 4] = [
    ("httpx.py.j2", include_str!("../templates/httpx.py.j2")),
    ("requests.py.j2", include_str!("../templates/requests.py.j2")),
    ("aiohttp.py.j2", include_str!("../templates/aiohttp.py.j2")),
    (SERVICE_TEMPLATE, include_str!("../templates/service.py.j2")),
];

/// Escape triple-quote sequences that would prematurely close Python docstrings.
fn escape_docstring(value: String) -> String {
    value.replace("\"\"\"", "\\\"\\\"\\\"")
}

/// Renders operations with one of the bundled per-library templates.
pub struct TemplateRenderer {
    env: Environment<'static>,
    template_name: String,
}

impl TemplateRenderer {
    /// Load the bundled templates and select `template_name` for operations.
    pub fn new(template_name: &str) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_filter("escape_docstring", escape_docstring);
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| render_error(name, e))?;
        }
        env.get_template(template_name)
            .map_err(|e| render_error(template_name, e))?;

        Ok(Self {
            env,
            template_name: template_name.to_string(),
        })
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Full module source for a service: imports followed by its operations.
    pub fn render_service(&self, service: &Service<'_>) -> Result<String, RenderError> {
        let context = ServiceContext {
            library_import: &service.library_import,
            async_client: service.async_client,
            content: &service.content,
        };
        self.render_template(SERVICE_TEMPLATE, &context)
    }

    fn render_template<S: Serialize>(&self, name: &str, context: &S) -> Result<String, RenderError> {
        self.env
            .get_template(name)
            .and_then(|tmpl| tmpl.render(context))
            .map_err(|e| render_error(name, e))
    }
}

impl OperationRenderer for TemplateRenderer {
    fn render(&self, context: &OperationContext<'_>) -> Result<String, RenderError> {
        self.render_template(&self.template_name, context)
    }
}

#[derive(Serialize)]
struct ServiceContext<'a> {
    library_import: &'a str,
    async_client: bool,
    content: &'a str,
}

fn render_error(template: &str, error: minijinja::Error) -> RenderError {
    RenderError {
        template: template.to_string(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oapy_core::services::{OpReturnType, TypeConversion};

    fn context<'a>(
        params: &'a [String],
        query_params: &'a [String],
        return_type: &'a OpReturnType,
        body_param: Option<&'a str>,
        async_client: bool,
    ) -> OperationContext<'a> {
        OperationContext {
            operation_id: if async_client { "async_get_pet" } else { "get_pet" },
            params,
            query_params,
            return_type,
            body_param,
            path_name: "/pets/{petId}",
            method: "get",
            async_client,
            summary: Some("Fetch a \"\"\"pet\"\"\""),
            description: None,
            deprecated: false,
        }
    }

    fn pet_return() -> OpReturnType {
        OpReturnType {
            type_conversion: Some(
                TypeConversion::new("#/components/schemas/Pet", "Pet")
                    .with_imports(vec!["Pet".to_string()]),
            ),
            status_code: 200,
            complex_type: true,
            list_type: None,
        }
    }

    #[test]
    fn test_unknown_template() {
        let err = TemplateRenderer::new("nope.py.j2").err().unwrap();
        assert_eq!(err.template, "nope.py.j2");
    }

    #[test]
    fn test_httpx_sync() {
        let renderer = TemplateRenderer::new("httpx.py.j2").unwrap();
        let params = vec!["petId : int".to_string()];
        let rt = pet_return();
        let out = renderer
            .render(&context(&params, &[], &rt, None, false))
            .unwrap();

        assert!(out.starts_with(
            "def get_pet(petId : int, api_config_override: Optional[APIConfig] = None) -> Pet:\n"
        ));
        assert!(out.contains("    \"\"\"Fetch a \\\"\\\"\\\"pet\\\"\\\"\\\"\"\"\"\n"));
        assert!(out.contains("    path = f\"/pets/{petId}\"\n"));
        assert!(out.contains("    with httpx.Client(base_url=base_path, verify=api_config.verify) as client:\n"));
        assert!(out.contains("            \"get\",\n"));
        assert!(out.contains("    if response.status_code != 200:\n"));
        assert!(out.contains("return Pet(**body) if body is not None else Pet()"));
        assert!(!out.contains("json="));
        assert!(!out.contains("await"));
    }

    #[test]
    fn test_httpx_async_with_body_and_query() {
        let renderer = TemplateRenderer::new("httpx.py.j2").unwrap();
        let params = vec![
            "limit : Optional[int] = None".to_string(),
            "data : NewPet".to_string(),
        ];
        let query = vec!["'limit' : limit".to_string()];
        let rt = OpReturnType::none(204);
        let out = renderer
            .render(&context(&params, &query, &rt, Some("data"), true))
            .unwrap();

        assert!(out.starts_with("async def async_get_pet("));
        assert!(out.contains(") -> None:\n"));
        assert!(out.contains("        'limit' : limit,\n"));
        assert!(out.contains("async with httpx.AsyncClient("));
        assert!(out.contains("response = await client.request("));
        assert!(out.contains("json=data.dict() if hasattr(data, \"dict\") else data,"));
        assert!(out.contains("    if response.status_code != 204:\n"));
        assert!(out.trim_end().ends_with("return None"));
    }

    #[test]
    fn test_list_return() {
        let renderer = TemplateRenderer::new("requests.py.j2").unwrap();
        let rt = OpReturnType {
            type_conversion: Some(
                TypeConversion::new("array<#/components/schemas/Pet>", "List[Pet]")
                    .with_imports(vec!["Pet".to_string()]),
            ),
            status_code: 200,
            complex_type: true,
            list_type: Some("Pet".to_string()),
        };
        let out = renderer.render(&context(&[], &[], &rt, None, false)).unwrap();
        assert!(out.contains("-> List[Pet]:"));
        assert!(out.contains("requests.request(\n"));
        assert!(out.contains("return [Pet(**item) for item in body]"));
    }

    #[test]
    fn test_primitive_return() {
        let renderer = TemplateRenderer::new("aiohttp.py.j2").unwrap();
        let rt = OpReturnType {
            type_conversion: Some(TypeConversion::new("integer", "int")),
            status_code: 200,
            complex_type: false,
            list_type: None,
        };
        let out = renderer.render(&context(&[], &[], &rt, None, true)).unwrap();
        assert!(out.starts_with("async def async_get_pet("));
        assert!(out.contains("async with aiohttp.ClientSession(headers=headers) as session:"));
        assert!(out.contains("if response.status != 200:"));
        assert!(out.trim_end().ends_with("return body"));
    }

    fn complex_return(converted: &str, imports: &[&str], list_type: Option<&str>) -> OpReturnType {
        OpReturnType {
            type_conversion: Some(
                TypeConversion::new("oneOf", converted)
                    .with_imports(imports.iter().map(|s| s.to_string()).collect()),
            ),
            status_code: 200,
            complex_type: true,
            list_type: list_type.map(str::to_string),
        }
    }

    #[test]
    fn test_non_constructible_complex_returns_body() {
        let cases = [
            complex_return("Union[Cat, Dog]", &["Cat", "Dog"], None),
            complex_return("Dict[str, Pet]", &["Pet"], None),
            complex_return("List[Union[Cat, Dog]]", &["Cat", "Dog"], Some("Cat")),
        ];
        for template in ["httpx.py.j2", "requests.py.j2", "aiohttp.py.j2"] {
            let renderer = TemplateRenderer::new(template).unwrap();
            for rt in &cases {
                let out = renderer.render(&context(&[], &[], rt, None, true)).unwrap();
                assert!(!out.contains("(**body)"), "{template}: {out}");
                assert!(!out.contains("(**item)"), "{template}: {out}");
                assert!(out.trim_end().ends_with("return body"), "{template}: {out}");
            }
        }
    }

    #[test]
    fn test_escape_docstring() {
        assert_eq!(escape_docstring("a \"\"\" b".to_string()), "a \\\"\\\"\\\" b");
    }
}
