// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! `kube`-backed implementation of the [`ClusterClient`] seam.
//!
//! Discovery is run once at construction and answered from the cached
//! groups afterwards; list and get go through dynamically-typed `Api`
//! handles scoped according to the discovered resource.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use kube::api::{Api, DynamicObject, GroupVersionKind, ListParams, ObjectList};
use kube::core::GroupVersion;
use kube::discovery::{Discovery, Scope};
use kube::Client;
use tracing::debug;

use super::{ApiResourceSpec, ClusterClient, KindSelector, ResourceMatch, segment_matches};

pub struct KubeClient {
    client: Client,
    discovery: Discovery,
}

impl KubeClient {
    /// Connect the resolution pipeline to a cluster. Runs a full discovery
    /// pass up front; the result is reused for every lookup afterwards.
    pub async fn new(client: Client) -> Result<Self> {
        let discovery = Discovery::new(client.clone())
            .run()
            .await
            .context("failed to run API discovery")?;
        Ok(Self { client, discovery })
    }

    /// Build a dynamically-typed API handle for a discovered kind,
    /// namespace-scoped only when the resource itself is namespaced and a
    /// namespace was given.
    fn api_for(&self, gvk: &GroupVersionKind, namespace: &str) -> Result<Api<DynamicObject>> {
        let (ar, caps) = self
            .discovery
            .resolve_gvk(gvk)
            .ok_or_else(|| anyhow!("kind {} is not served by the cluster", gvk.kind))?;
        let api = if caps.scope == Scope::Namespaced && !namespace.is_empty() {
            Api::namespaced_with(self.client.clone(), namespace, &ar)
        } else {
            Api::all_with(self.client.clone(), &ar)
        };
        Ok(api)
    }
}

#[async_trait]
impl ClusterClient for KubeClient {
    async fn find_resources(&self, selector: &KindSelector) -> Result<Vec<ResourceMatch>> {
        let mut matches = Vec::new();
        for group in self.discovery.groups() {
            if !segment_matches(&selector.group, group.name()) {
                continue;
            }
            for version in group.versions() {
                if !segment_matches(&selector.version, version) {
                    continue;
                }
                for (ar, caps) in group.versioned_resources(version) {
                    if !segment_matches(&selector.kind, &ar.kind) {
                        continue;
                    }
                    let parent = ApiResourceSpec {
                        group: ar.group.clone(),
                        version: ar.version.clone(),
                        kind: ar.kind.clone(),
                        name: ar.plural.clone(),
                        namespaced: caps.scope == Scope::Namespaced,
                    };
                    if selector.subresource.is_empty() || selector.subresource == "*" {
                        matches.push(ResourceMatch {
                            parent: parent.clone(),
                            subresource: String::new(),
                            child: parent.clone(),
                        });
                    }
                    if !selector.subresource.is_empty() {
                        for (sub_ar, sub_caps) in &caps.subresources {
                            if !segment_matches(&selector.subresource, &sub_ar.plural) {
                                continue;
                            }
                            matches.push(ResourceMatch {
                                parent: parent.clone(),
                                subresource: sub_ar.plural.clone(),
                                child: ApiResourceSpec {
                                    group: sub_ar.group.clone(),
                                    version: sub_ar.version.clone(),
                                    kind: sub_ar.kind.clone(),
                                    name: format!("{}/{}", parent.name, sub_ar.plural),
                                    namespaced: sub_caps.scope == Scope::Namespaced,
                                },
                            });
                        }
                    }
                }
            }
        }
        if matches.is_empty() {
            bail!("no API resource matches {selector}");
        }
        debug!(selector = %selector, matches = matches.len(), "expanded kind selector");
        Ok(matches)
    }

    async fn kind_for(
        &self,
        group: &str,
        version: &str,
        resource: &str,
    ) -> Result<Option<GroupVersionKind>> {
        for api_group in self.discovery.groups() {
            if !segment_matches(group, api_group.name()) {
                continue;
            }
            for served_version in api_group.versions() {
                if !segment_matches(version, served_version) {
                    continue;
                }
                for (ar, _) in api_group.versioned_resources(served_version) {
                    if ar.plural == resource {
                        return Ok(Some(GroupVersionKind::gvk(&ar.group, &ar.version, &ar.kind)));
                    }
                }
            }
        }
        Ok(None)
    }

    async fn list_resources(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
    ) -> Result<ObjectList<DynamicObject>> {
        let gv: GroupVersion = api_version
            .parse()
            .map_err(|err| anyhow!("invalid apiVersion {api_version:?}: {err}"))?;
        let gvk = GroupVersionKind::gvk(&gv.group, &gv.version, kind);
        let api = self.api_for(&gvk, namespace)?;
        api.list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list {api_version}/{kind}"))
    }

    async fn get_resource(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
        subresource: &str,
    ) -> Result<DynamicObject> {
        let gv: GroupVersion = api_version
            .parse()
            .map_err(|err| anyhow!("invalid apiVersion {api_version:?}: {err}"))?;
        let gvk = GroupVersionKind::gvk(&gv.group, &gv.version, kind);
        let api = self.api_for(&gvk, namespace)?;
        if subresource.is_empty() {
            api.get(name)
                .await
                .with_context(|| format!("failed to get {api_version}/{kind} {name}"))
        } else {
            api.get_subresource(subresource, name)
                .await
                .with_context(|| {
                    format!("failed to get {subresource} of {api_version}/{kind} {name}")
                })
        }
    }
}
