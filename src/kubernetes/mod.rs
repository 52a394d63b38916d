// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Cluster-facing machinery: the discovery/list/get collaborator seam,
//! kind-selector parsing, and the resolution + fetch passes built on top.

use std::fmt;

use anyhow::{Result, bail};
use async_trait::async_trait;
use kube::api::{DynamicObject, GroupVersionKind, ObjectList};

mod client;
pub mod discovery;
mod fetch;
#[cfg(test)]
pub(crate) mod testing;

pub use client::KubeClient;
pub use discovery::{ParentResource, SubresourceBinding, resolve_kinds};
pub use fetch::fetch_from_cluster;

/// A parsed `group/version/kind[/subresource]` selector from a policy match
/// block. `"*"` (or an empty string) in any field means wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSelector {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub subresource: String,
}

impl KindSelector {
    /// Parse a raw kind string into its components.
    ///
    /// Two- and three-segment forms are ambiguous; a segment shaped like an
    /// API version (`v1`, `v2beta1`, ...) is taken as the version, and a
    /// lowercase second segment in the two-segment form is taken as a
    /// subresource (`Pod/status`).
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split('/').collect();
        let (group, version, kind, subresource) = match parts.as_slice() {
            [kind] => ("*", "*", *kind, ""),
            // `*/*` historically means every kind and every subresource.
            ["*", "*"] => ("*", "*", "*", "*"),
            [first, second] => {
                if looks_like_version(first) {
                    ("*", *first, *second, "")
                } else if second.starts_with(|c: char| c.is_lowercase()) {
                    ("*", "*", *first, *second)
                } else {
                    (*first, "*", *second, "")
                }
            }
            [first, kind, subresource] if looks_like_version(first) => {
                ("*", *first, *kind, *subresource)
            }
            [group, version, kind] => (*group, *version, *kind, ""),
            [group, version, kind, subresource] => (*group, *version, *kind, *subresource),
            _ => bail!("invalid kind selector {input:?}"),
        };
        if kind.is_empty() {
            bail!("invalid kind selector {input:?}");
        }
        Ok(Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            subresource: subresource.to_string(),
        })
    }
}

impl fmt::Display for KindSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.version, self.kind)?;
        if !self.subresource.is_empty() {
            write!(f, "/{}", self.subresource)?;
        }
        Ok(())
    }
}

/// `v1`, `v2beta1`, `v10alpha2`, ... but not `*` or arbitrary words.
fn looks_like_version(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix('v') else {
        return false;
    };
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    let tail = &rest[digits..];
    if tail.is_empty() {
        return true;
    }
    ["alpha", "beta"].iter().any(|stage| {
        tail.strip_prefix(stage)
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    })
}

/// True when a selector field accepts the discovered value.
pub(crate) fn segment_matches(pattern: &str, value: &str) -> bool {
    pattern.is_empty() || pattern == "*" || pattern == value
}

/// One discovered API resource or subresource as the apiserver reports it.
/// For subresources `name` is the full `parent-plural/leaf` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResourceSpec {
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Plural resource name.
    pub name: String,
    pub namespaced: bool,
}

impl ApiResourceSpec {
    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(&self.group, &self.version, &self.kind)
    }
}

/// One answer from `ClusterClient::find_resources`: the parent resource, the
/// matched subresource leaf (empty for ordinary resources), and the child
/// descriptor (identical to the parent for ordinary resources).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMatch {
    pub parent: ApiResourceSpec,
    pub subresource: String,
    pub child: ApiResourceSpec,
}

/// Discovery, list and get operations the resolution pipeline needs from a
/// cluster. Production uses [`KubeClient`]; tests substitute an in-memory
/// implementation.
#[async_trait]
pub trait ClusterClient {
    /// Expand a kind selector into all matching (parent, child) resource
    /// pairs. Errors when nothing matches.
    async fn find_resources(&self, selector: &KindSelector) -> Result<Vec<ResourceMatch>>;

    /// REST-mapper style lookup: resolve a plural resource name to its kind.
    async fn kind_for(
        &self,
        group: &str,
        version: &str,
        resource: &str,
    ) -> Result<Option<GroupVersionKind>>;

    /// List all instances of a kind. An empty `namespace` lists across all
    /// namespaces.
    async fn list_resources(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
    ) -> Result<ObjectList<DynamicObject>>;

    /// Get a single resource, or one of its subresources when `subresource`
    /// is non-empty.
    async fn get_resource(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
        subresource: &str,
    ) -> Result<DynamicObject>;
}
