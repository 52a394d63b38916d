// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! The cluster fetch pass: one bounded list call per resolved kind, plus a
//! list-parents-then-get loop for every subresource binding.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;

use kube::api::{DynamicObject, GroupVersionKind, ObjectList, TypeMeta};
use kube::core::GroupVersion;
use kube::ResourceExt;
use tracing::debug;

use super::{ClusterClient, SubresourceBinding};
use crate::resource::ResourceKey;

/// Fetch every instance of the resolved kinds from the cluster.
///
/// Failures never abort the whole pass: a kind that cannot be listed
/// contributes nothing, and a subresource instance that cannot be fetched
/// is reported on `out` while iteration continues. Later writes to a
/// colliding key overwrite earlier ones; callers supply disjoint kind sets.
pub async fn fetch_from_cluster<C, W>(
    out: &mut W,
    client: &C,
    kinds: &HashSet<GroupVersionKind>,
    subresources: &HashMap<GroupVersionKind, SubresourceBinding>,
    namespace: &str,
) -> BTreeMap<ResourceKey, DynamicObject>
where
    C: ClusterClient + ?Sized,
    W: Write,
{
    let mut fetched = BTreeMap::new();

    let mut kinds: Vec<&GroupVersionKind> = kinds.iter().collect();
    kinds.sort_by(|a, b| {
        (&a.group, &a.version, &a.kind).cmp(&(&b.group, &b.version, &b.kind))
    });
    for gvk in kinds {
        let list = match client
            .list_resources(&gvk.api_version(), &gvk.kind, namespace)
            .await
        {
            Ok(list) => list,
            Err(err) => {
                debug!(kind = %gvk.kind, error = %err, "failed to list resource");
                continue;
            }
        };
        // The list machinery may serve several API kinds at once; the
        // recorded kind is always the one that was requested, while
        // group/version follow the response.
        let gv = listed_group_version(&list, gvk);
        for mut item in list.items {
            item.types = Some(TypeMeta {
                api_version: gv.api_version(),
                kind: gvk.kind.clone(),
            });
            fetched.insert(ResourceKey::for_object(&gvk.kind, &item), item);
        }
    }

    let mut bindings: Vec<&SubresourceBinding> = subresources.values().collect();
    bindings.sort_by(|a, b| {
        (&a.subresource.group, &a.subresource.version, &a.subresource.kind)
            .cmp(&(&b.subresource.group, &b.subresource.version, &b.subresource.kind))
    });
    for binding in bindings {
        let parent_gv = GroupVersion {
            group: binding.parent.group.clone(),
            version: binding.parent.version.clone(),
        }
        .api_version();
        let list = match client
            .list_resources(&parent_gv, &binding.parent.kind, namespace)
            .await
        {
            Ok(list) => list,
            Err(err) => {
                debug!(kind = %binding.parent.kind, error = %err, "failed to list parent resource");
                continue;
            }
        };
        let Some(leaf) = binding.subresource.name.split('/').nth(1) else {
            debug!(subresource = %binding.subresource.name, "subresource name has no parent prefix");
            continue;
        };
        let parent_names: Vec<String> = list.items.iter().map(|item| item.name_any()).collect();
        for parent_name in &parent_names {
            let mut resource = match client
                .get_resource(&parent_gv, &binding.parent.kind, namespace, parent_name, leaf)
                .await
            {
                Ok(resource) => resource,
                Err(err) => {
                    let _ = writeln!(out, "Error: {err:#}");
                    continue;
                }
            };
            let child_gv = GroupVersion {
                group: binding.subresource.group.clone(),
                version: binding.subresource.version.clone(),
            };
            resource.types = Some(TypeMeta {
                api_version: child_gv.api_version(),
                kind: binding.subresource.kind.clone(),
            });
            fetched.insert(
                ResourceKey::for_object(&binding.subresource.kind, &resource),
                resource,
            );
        }
    }

    fetched
}

/// Group/version recorded on fetched instances: from the list response when
/// it carries one, otherwise from the requested kind.
fn listed_group_version(
    list: &ObjectList<DynamicObject>,
    requested: &GroupVersionKind,
) -> GroupVersion {
    if !list.types.api_version.is_empty()
        && let Ok(gv) = list.types.api_version.parse::<GroupVersion>()
    {
        return gv;
    }
    GroupVersion {
        group: requested.group.clone(),
        version: requested.version.clone(),
    }
}
