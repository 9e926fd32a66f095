use oapy_core::parse::schema::AdditionalProperties;
use oapy_core::parse::{RefOr, Schema, SchemaOrRef, SchemaType, TypeSet, short_name};
use oapy_core::services::{TypeConversion, TypeConverter};

/// Maps OpenAPI schemas to `typing`-style Python annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonTypeConverter;

impl TypeConverter for PythonTypeConverter {
    fn convert(&self, schema: &Schema, required: bool) -> TypeConversion {
        let conversion = schema_to_python(schema);
        if required {
            conversion
        } else {
            optional(conversion)
        }
    }
}

/// Convert a schema or reference; references become their short name.
pub fn schema_or_ref_to_python(schema: &SchemaOrRef) -> TypeConversion {
    match schema {
        RefOr::Ref { ref_path } => {
            let name = short_name(ref_path);
            TypeConversion::new(ref_path.clone(), name).with_imports(vec![name.to_string()])
        }
        RefOr::Item(schema) => schema_to_python(schema),
    }
}

/// Convert an inline schema, ignoring required-ness.
pub fn schema_to_python(schema: &Schema) -> TypeConversion {
    if !schema.one_of.is_empty() {
        return combine("oneOf", "Union", &schema.one_of);
    }
    if !schema.any_of.is_empty() {
        return combine("anyOf", "Union", &schema.any_of);
    }
    if !schema.all_of.is_empty() {
        if schema.all_of.len() == 1 {
            return schema_or_ref_to_python(&schema.all_of[0]);
        }
        return combine("allOf", "Tuple", &schema.all_of);
    }

    let conversion = match &schema.schema_type {
        Some(TypeSet::Single(t)) => single_type(*t, schema),
        Some(TypeSet::Multiple(types)) => {
            let non_null: Vec<SchemaType> = types
                .iter()
                .copied()
                .filter(|t| *t != SchemaType::Null)
                .collect();
            let has_null = non_null.len() != types.len();
            match non_null.as_slice() {
                [] => TypeConversion::new("null", "None"),
                [single] if has_null => optional(single_type(*single, schema)),
                [single] => single_type(*single, schema),
                many => {
                    let parts: Vec<TypeConversion> =
                        many.iter().map(|t| single_type(*t, schema)).collect();
                    let union = union_of("Union", &parts);
                    if has_null { optional(union) } else { union }
                }
            }
        }
        None if !schema.properties.is_empty() => object_type(schema),
        None => match &schema.items {
            Some(items) => array_type(Some(items)),
            None => TypeConversion::new("object", "Any"),
        },
    };

    if schema.nullable == Some(true) {
        optional(conversion)
    } else {
        conversion
    }
}

fn single_type(schema_type: SchemaType, schema: &Schema) -> TypeConversion {
    let converted = match schema_type {
        SchemaType::String => match schema.format.as_deref() {
            Some("binary") => "bytes",
            _ => "str",
        },
        SchemaType::Integer => "int",
        SchemaType::Number => "float",
        SchemaType::Boolean => "bool",
        SchemaType::Null => "None",
        SchemaType::Array => return array_type(schema.items.as_ref()),
        SchemaType::Object => return object_type(schema),
    };
    TypeConversion::new(schema_type.as_str(), converted)
}

fn array_type(items: Option<&SchemaOrRef>) -> TypeConversion {
    let inner = match items {
        Some(items) => schema_or_ref_to_python(items),
        None => TypeConversion::new("unknown", "Any"),
    };
    TypeConversion::new(
        format!("{}<{}>", TypeConversion::ARRAY_MARKER, inner.original_type),
        format!("List[{}]", inner.converted_type),
    )
    .with_imports(inner.import_types)
}

fn object_type(schema: &Schema) -> TypeConversion {
    match &schema.additional_properties {
        Some(AdditionalProperties::Schema(value)) if schema.properties.is_empty() => {
            let value = schema_or_ref_to_python(value);
            TypeConversion::new("object", format!("Dict[str, {}]", value.converted_type))
                .with_imports(value.import_types)
        }
        _ => TypeConversion::new("object", "Dict[str, Any]"),
    }
}

fn combine(keyword: &str, wrapper: &str, members: &[SchemaOrRef]) -> TypeConversion {
    let parts: Vec<TypeConversion> = members.iter().map(schema_or_ref_to_python).collect();
    TypeConversion {
        original_type: keyword.to_string(),
        ..union_of(wrapper, &parts)
    }
}

fn union_of(wrapper: &str, parts: &[TypeConversion]) -> TypeConversion {
    let converted: Vec<&str> = parts.iter().map(|p| p.converted_type.as_str()).collect();
    let original: Vec<&str> = parts.iter().map(|p| p.original_type.as_str()).collect();

    let mut imports: Vec<String> = Vec::new();
    for name in parts.iter().flat_map(|p| &p.import_types) {
        if !imports.contains(name) {
            imports.push(name.clone());
        }
    }

    TypeConversion::new(
        original.join(" | "),
        format!("{}[{}]", wrapper, converted.join(", ")),
    )
    .with_imports(imports)
}

fn optional(conversion: TypeConversion) -> TypeConversion {
    if conversion.converted_type == "Any"
        || conversion.converted_type == "None"
        || conversion.converted_type.starts_with("Optional[")
    {
        return conversion;
    }
    TypeConversion {
        converted_type: format!("Optional[{}]", conversion.converted_type),
        ..conversion
    }
}
