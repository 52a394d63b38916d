// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Expansion of raw kind selectors into concrete GroupVersionKinds.
//!
//! Each selector is resolved through the cluster's discovery data; ordinary
//! resources and subresources come back separated, with every subresource
//! keeping a link to its parent resource for the fetch pass.

use std::collections::{BTreeSet, HashMap, HashSet};

use kube::api::GroupVersionKind;
use tracing::debug;

use super::{ApiResourceSpec, ClusterClient, KindSelector};

/// Parent side of a subresource link: the resource whose instances are
/// listed before each subresource is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentResource {
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Plural resource name.
    pub resource: String,
}

/// A resolved subresource: its own descriptor plus the parent it hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubresourceBinding {
    pub subresource: ApiResourceSpec,
    pub parent: ParentResource,
}

/// Resolve raw kind selectors against cluster discovery.
///
/// Returns the ordinary kinds and the subresource bindings as disjoint
/// collections. A selector that fails to parse or that discovery cannot
/// answer is skipped with a debug event; one unknown kind never aborts
/// resolution of the others. With `cluster_wide` set, namespace-scoped
/// matches are dropped entirely.
pub async fn resolve_kinds<C>(
    client: &C,
    selectors: &BTreeSet<String>,
    cluster_wide: bool,
) -> (HashSet<GroupVersionKind>, HashMap<GroupVersionKind, SubresourceBinding>)
where
    C: ClusterClient + ?Sized,
{
    let mut kinds = HashSet::new();
    let mut subresources = HashMap::new();
    for raw in selectors {
        let selector = match KindSelector::parse(raw) {
            Ok(selector) => selector,
            Err(err) => {
                debug!(selector = %raw, error = %err, "skipping invalid kind selector");
                continue;
            }
        };
        let matches = match client.find_resources(&selector).await {
            Ok(matches) => matches,
            Err(err) => {
                debug!(selector = %raw, error = %err, "failed to find resource");
                continue;
            }
        };
        for found in matches {
            if cluster_wide && found.child.namespaced {
                continue;
            }
            if found.subresource.is_empty() {
                kinds.insert(found.parent.gvk());
            } else {
                subresources.insert(
                    found.child.gvk(),
                    SubresourceBinding {
                        subresource: found.child,
                        parent: ParentResource {
                            group: found.parent.group,
                            version: found.parent.version,
                            kind: found.parent.kind,
                            resource: found.parent.name,
                        },
                    },
                );
            }
        }
    }
    (kinds, subresources)
}
