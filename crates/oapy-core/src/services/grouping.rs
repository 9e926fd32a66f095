use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use log::warn;

use super::model::{Service, ServiceOperation, ServiceTag};
use super::naming::{service_file_name, unique_tag_stems};
use crate::config::LibraryConfig;

/// Partition descriptors into one service per (tag, configured call style).
///
/// Tags keep the order they were first seen in; sync services come before
/// async ones. Every combination yields a service, even an empty one.
pub fn group_services<'a>(
    operations: Vec<ServiceOperation<'a>>,
    config: &LibraryConfig,
) -> Vec<Service<'a>> {
    let mut tags: IndexSet<ServiceTag> = IndexSet::new();
    let mut buckets: IndexMap<(ServiceTag, bool), Vec<ServiceOperation<'a>>> = IndexMap::new();

    for so in operations {
        tags.insert(so.tag.clone());
        buckets
            .entry((so.tag.clone(), so.async_client))
            .or_default()
            .push(so);
    }

    let stems = unique_tag_stems(&tags);
    let variants = [(false, config.include_sync), (true, config.include_async)];
    let mut services = Vec::with_capacity(tags.len() * 2);

    for async_client in variants
        .into_iter()
        .filter_map(|(async_client, enabled)| enabled.then_some(async_client))
    {
        for (tag, stem) in tags.iter().zip(&stems) {
            let operations = buckets
                .swap_remove(&(tag.clone(), async_client))
                .unwrap_or_default();
            warn_duplicate_ids(tag, &operations);

            let content = operations
                .iter()
                .map(|so| so.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");

            services.push(Service {
                file_name: service_file_name(stem, async_client),
                operations,
                content,
                async_client,
                library_import: config.library_import.clone(),
            });
        }
    }

    services
}

fn warn_duplicate_ids(tag: &ServiceTag, operations: &[ServiceOperation<'_>]) {
    let mut seen = HashSet::new();
    for so in operations {
        if !seen.insert(so.operation_id.as_str()) {
            warn!(
                "operation id `{}` appears more than once in tag `{}`",
                so.operation_id, tag
            );
        }
    }
}
