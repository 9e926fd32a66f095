use log::debug;

use super::model::{OpReturnType, TypeConversion};
use super::{OperationSite, TypeConverter};
use crate::error::GenerateError;
use crate::parse::{RefOr, short_name};

/// Derive the return type from the first 2xx response, in document order.
pub fn resolve_return_type(
    site: &OperationSite<'_>,
    converter: &dyn TypeConverter,
) -> Result<OpReturnType, GenerateError> {
    let Some(responses) = &site.operation.responses else {
        return Ok(OpReturnType::none(OpReturnType::DEFAULT_STATUS));
    };

    let Some((key, status, response)) = responses
        .iter()
        .find_map(|(key, response)| success_status(key).map(|status| (key, status, response)))
    else {
        return Ok(OpReturnType::none(OpReturnType::DEFAULT_STATUS));
    };

    let response = response.resolve(site.components)?;
    let Some(media) = response.json() else {
        return Ok(OpReturnType::none(status));
    };

    match &media.schema {
        Some(RefOr::Ref { ref_path }) => {
            let name = short_name(ref_path).to_string();
            Ok(OpReturnType {
                type_conversion: Some(
                    TypeConversion::new(ref_path.clone(), name.clone()).with_imports(vec![name]),
                ),
                status_code: status,
                complex_type: true,
                list_type: None,
            })
        }
        Some(RefOr::Item(schema)) => {
            let conversion = converter.convert(schema, true);
            let list_type = if conversion.original_type.contains(TypeConversion::ARRAY_MARKER) {
                conversion.import_types.first().cloned()
            } else {
                None
            };
            Ok(OpReturnType {
                complex_type: !conversion.import_types.is_empty(),
                type_conversion: Some(conversion),
                status_code: status,
                list_type,
            })
        }
        None => Err(GenerateError::UnsupportedReturnSchema {
            operation: site.label(),
            status: key.clone(),
        }),
    }
}

/// Numeric status for a 2xx response key; the `2XX` range counts as 200.
fn success_status(key: &str) -> Option<u16> {
    if !key.starts_with('2') {
        return None;
    }
    if key.eq_ignore_ascii_case("2XX") {
        return Some(OpReturnType::DEFAULT_STATUS);
    }
    match key.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            debug!("ignoring unparseable response key `{key}`");
            None
        }
    }
}
