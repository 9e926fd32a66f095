use super::{OperationSite, TypeConverter};
use crate::error::{GenerateError, ResolveError};
use crate::parse::{Operation, Parameter, ParameterLocation, RefOr, Schema, SchemaOrRef, short_name};

/// Reserved name of the request body parameter.
pub const BODY_PARAM: &str = "data";

/// Parameters that apply to the operation, in declaration order.
///
/// Path-level parameters come first unless the operation redeclares the same
/// name and location.
pub fn declared_parameters<'a>(
    site: &OperationSite<'a>,
) -> Result<Vec<&'a Parameter>, ResolveError> {
    let own = site
        .operation
        .parameters
        .iter()
        .map(|p| p.resolve(site.components))
        .collect::<Result<Vec<_>, _>>()?;

    let mut params = Vec::with_capacity(own.len() + site.path_item.parameters.len());
    for shared in &site.path_item.parameters {
        let shared = shared.resolve(site.components)?;
        let overridden = own
            .iter()
            .any(|p| p.name == shared.name && p.location == shared.location);
        if !overridden {
            params.push(shared);
        }
    }
    params.extend(own);
    Ok(params)
}

/// Parameter declarations for the generated signature, body last.
pub fn resolve_params(
    site: &OperationSite<'_>,
    converter: &dyn TypeConverter,
) -> Result<Vec<String>, GenerateError> {
    let mut params: Vec<String> = declared_parameters(site)?
        .into_iter()
        .map(|p| parameter_declaration(p, converter))
        .collect();

    if let Some(body) = body_declaration(site, converter)? {
        params.push(body);
    }
    Ok(params)
}

/// `'name' : name` entries for every query parameter.
pub fn resolve_query_params(site: &OperationSite<'_>) -> Result<Vec<String>, ResolveError> {
    Ok(declared_parameters(site)?
        .into_iter()
        .filter(|p| p.location == ParameterLocation::Query)
        .map(|p| format!("'{}' : {}", p.name, p.name))
        .collect())
}

/// Name of the body parameter, if the operation takes a body.
pub fn resolve_body_param(operation: &Operation) -> Option<String> {
    operation
        .request_body
        .as_ref()
        .map(|_| BODY_PARAM.to_string())
}

fn parameter_declaration(param: &Parameter, converter: &dyn TypeConverter) -> String {
    let type_name = type_name(param.schema.as_ref(), param.required, converter);
    if param.required {
        format!("{} : {}", param.name, type_name)
    } else {
        format!("{} : {} = None", param.name, type_name)
    }
}

fn body_declaration(
    site: &OperationSite<'_>,
    converter: &dyn TypeConverter,
) -> Result<Option<String>, GenerateError> {
    let Some(body) = &site.operation.request_body else {
        return Ok(None);
    };
    let body = body.resolve(site.components)?;
    let media = body
        .json()
        .ok_or_else(|| GenerateError::UnsupportedRequestBody {
            operation: site.label(),
            media_types: body.content.keys().cloned().collect::<Vec<_>>().join(", "),
        })?;

    let type_name = type_name(media.schema.as_ref(), true, converter);
    Ok(Some(format!("{BODY_PARAM} : {type_name}")))
}

fn type_name(schema: Option<&SchemaOrRef>, required: bool, converter: &dyn TypeConverter) -> String {
    match schema {
        Some(RefOr::Ref { ref_path }) => short_name(ref_path).to_string(),
        Some(RefOr::Item(schema)) => converter.convert(schema, required).converted_type,
        None => converter.convert(&Schema::default(), required).converted_type,
    }
}
