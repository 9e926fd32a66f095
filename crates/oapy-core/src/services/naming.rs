use std::collections::HashSet;

use heck::ToSnakeCase;
use log::warn;

use super::OperationSite;
use super::model::ServiceTag;
use crate::parse::HttpMethod;

/// Prefix distinguishing async descriptors and service files.
pub const ASYNC_PREFIX: &str = "async_";

/// Stem used for the service file of untagged operations.
pub const UNTAGGED_STEM: &str = "untagged";

/// Operation identifier with hyphens turned into underscores.
///
/// Falls back to a route-derived name when the operation has no `operationId`.
pub fn operation_id(site: &OperationSite<'_>) -> String {
    match site.operation.operation_id.as_deref() {
        Some(id) => id.replace('-', "_"),
        None => route_to_name(site.method, site.path_name),
    }
}

/// Identifier for the given call style.
pub fn variant_operation_id(operation_id: &str, async_client: bool) -> String {
    if async_client {
        format!("{ASYNC_PREFIX}{operation_id}")
    } else {
        operation_id.to_string()
    }
}

/// Stem a tag normalizes to, before collisions are resolved.
pub fn tag_stem(tag: &ServiceTag) -> String {
    match tag.name().map(|name| name.to_snake_case()) {
        Some(name) if !name.is_empty() => name,
        _ => UNTAGGED_STEM.to_string(),
    }
}

/// One stem per tag, in order, such that no two service files share a name.
///
/// A stem that is already taken, or that would clash with another tag's
/// async file, gets the smallest free `_<n>` suffix starting at 2.
pub fn unique_tag_stems<'t>(tags: impl IntoIterator<Item = &'t ServiceTag>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut stems = Vec::new();

    for tag in tags {
        let base = tag_stem(tag);
        let mut stem = base.clone();
        let mut n = 2;
        while stem_clashes(&stem, &taken) {
            stem = format!("{base}_{n}");
            n += 1;
        }
        if stem != base {
            warn!("tag `{}` normalizes to taken stem `{}`, using `{}`", tag, base, stem);
        }
        taken.insert(stem.clone());
        stems.push(stem);
    }
    stems
}

fn stem_clashes(candidate: &str, taken: &HashSet<String>) -> bool {
    taken.contains(candidate)
        || candidate
            .strip_prefix(ASYNC_PREFIX)
            .is_some_and(|rest| taken.contains(rest))
        || taken.contains(&format!("{ASYNC_PREFIX}{candidate}"))
}

/// File name of the service module for a stem and call style.
pub fn service_file_name(stem: &str, async_client: bool) -> String {
    if async_client {
        format!("{ASYNC_PREFIX}{stem}_service")
    } else {
        format!("{stem}_service")
    }
}

/// Derive a snake_case operation name from HTTP method + path.
///
/// - `GET /users` → `list_users`
/// - `GET /users/{userId}` → `get_user`
/// - `POST /users/{userId}/messages` → `create_users_messages`
pub fn route_to_name(method: HttpMethod, path: &str) -> String {
    let mut resource_parts: Vec<&str> = Vec::new();
    let mut ends_with_param = false;

    for seg in path.split('/').filter(|s| !s.is_empty()) {
        if seg.starts_with('{') && seg.ends_with('}') {
            ends_with_param = true;
        } else {
            resource_parts.push(seg);
            ends_with_param = false;
        }
    }

    let prefix = match method {
        HttpMethod::Get if ends_with_param => "get",
        HttpMethod::Get => "list",
        HttpMethod::Post => "create",
        HttpMethod::Put => "update",
        other => other.as_str(),
    };

    let last = resource_parts.len().saturating_sub(1);
    let mut name = prefix.to_string();
    for (i, part) in resource_parts.iter().enumerate() {
        let word = if i == last && ends_with_param {
            singularize(part)
        } else {
            part.to_string()
        };
        name.push('_');
        name.push_str(&word.to_snake_case());
    }
    name
}

/// Naive singularization: strips a trailing plural suffix.
fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}
