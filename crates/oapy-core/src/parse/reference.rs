use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::content::{RequestBody, Response};
use super::parameter::Parameter;
use super::spec::Components;
use crate::error::ResolveError;

/// Either a `$ref` pointer or an inline value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Item(T),
}

/// The type name a reference points at: its final `/` segment.
///
/// `#/components/schemas/Pet` → `Pet`
pub fn short_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Objects that can live under `components` and be pulled in by `$ref`.
pub trait Component: Sized {
    /// Section name under `#/components/`.
    const KIND: &'static str;

    fn table(components: &Components) -> &IndexMap<String, RefOr<Self>>;
}

impl Component for Parameter {
    const KIND: &'static str = "parameters";

    fn table(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.parameters
    }
}

impl Component for RequestBody {
    const KIND: &'static str = "requestBodies";

    fn table(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.request_bodies
    }
}

impl Component for Response {
    const KIND: &'static str = "responses";

    fn table(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.responses
    }
}

impl<T: Component> RefOr<T> {
    /// Follow `$ref` pointers into `components` until an inline value is found.
    pub fn resolve<'a>(&'a self, components: Option<&'a Components>) -> Result<&'a T, ResolveError> {
        let mut current = self;
        let mut seen: Vec<&'a str> = Vec::new();
        loop {
            match current {
                RefOr::Item(item) => return Ok(item),
                RefOr::Ref { ref_path } => {
                    if seen.contains(&ref_path.as_str()) {
                        return Err(ResolveError::CircularRef(ref_path.clone()));
                    }
                    seen.push(ref_path);
                    let name = component_name(ref_path, T::KIND)?;
                    current = components
                        .and_then(|c| T::table(c).get(name))
                        .ok_or_else(|| ResolveError::UnresolvedRef(ref_path.clone()))?;
                }
            }
        }
    }
}

/// Extract `<name>` from `#/components/<kind>/<name>`.
fn component_name<'r>(ref_path: &'r str, kind: &str) -> Result<&'r str, ResolveError> {
    ref_path
        .strip_prefix("#/components/")
        .and_then(|rest| rest.strip_prefix(kind))
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))
}
