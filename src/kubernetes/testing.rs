// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory [`ClusterClient`] used by the crate's tests.

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use kube::ResourceExt;
use kube::api::{DynamicObject, GroupVersionKind, ObjectList, TypeMeta};
use serde_json::json;

use super::discovery::{ParentResource, SubresourceBinding};
use super::{ApiResourceSpec, ClusterClient, KindSelector, ResourceMatch, segment_matches};

pub(crate) struct FakeApi {
    pub spec: ApiResourceSpec,
    pub subresources: Vec<ApiResourceSpec>,
}

/// A canned cluster: a discovery table plus stored objects, with switches
/// to make individual list/get calls fail.
#[derive(Default)]
pub(crate) struct FakeCluster {
    pub apis: Vec<FakeApi>,
    /// (kind, object) pairs; objects carry no TypeMeta, as list items from
    /// a real apiserver do not.
    pub objects: Vec<(String, DynamicObject)>,
    /// (parent name, subresource leaf, object).
    pub subresource_objects: Vec<(String, String, DynamicObject)>,
    pub fail_list_kinds: Vec<String>,
    pub fail_get_parents: Vec<String>,
    pub list_api_version: Option<String>,
}

fn spec(group: &str, version: &str, kind: &str, name: &str, namespaced: bool) -> ApiResourceSpec {
    ApiResourceSpec {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        namespaced,
    }
}

pub(crate) fn bare_object(namespace: Option<&str>, name: &str) -> DynamicObject {
    let mut metadata = serde_json::Map::new();
    metadata.insert("name".to_string(), json!(name));
    if let Some(ns) = namespace {
        metadata.insert("namespace".to_string(), json!(ns));
    }
    serde_json::from_value(json!({ "metadata": metadata })).unwrap()
}

/// The subresource binding `resolve_kinds` produces for `Deployment/scale`.
pub(crate) fn scale_binding() -> HashMap<GroupVersionKind, SubresourceBinding> {
    HashMap::from([(
        GroupVersionKind::gvk("autoscaling", "v1", "Scale"),
        SubresourceBinding {
            subresource: spec("autoscaling", "v1", "Scale", "deployments/scale", true),
            parent: ParentResource {
                group: "apps".to_string(),
                version: "v1".to_string(),
                kind: "Deployment".to_string(),
                resource: "deployments".to_string(),
            },
        },
    )])
}

impl FakeCluster {
    /// Pods (with a status subresource), Deployments (with scale), and the
    /// cluster-scoped Namespaces.
    pub fn standard() -> Self {
        Self {
            apis: vec![
                FakeApi {
                    spec: spec("", "v1", "Pod", "pods", true),
                    subresources: vec![spec("", "v1", "Pod", "pods/status", true)],
                },
                FakeApi {
                    spec: spec("apps", "v1", "Deployment", "deployments", true),
                    subresources: vec![spec("autoscaling", "v1", "Scale", "deployments/scale", true)],
                },
                FakeApi {
                    spec: spec("", "v1", "Namespace", "namespaces", false),
                    subresources: vec![],
                },
            ],
            ..Self::default()
        }
    }

    pub fn with_object(mut self, kind: &str, namespace: Option<&str>, name: &str) -> Self {
        self.objects.push((kind.to_string(), bare_object(namespace, name)));
        self
    }

    pub fn with_subresource_object(
        mut self,
        parent: &str,
        leaf: &str,
        namespace: Option<&str>,
        name: &str,
    ) -> Self {
        self.subresource_objects
            .push((parent.to_string(), leaf.to_string(), bare_object(namespace, name)));
        self
    }

    pub fn with_list_failure(mut self, kind: &str) -> Self {
        self.fail_list_kinds.push(kind.to_string());
        self
    }

    pub fn with_get_failure(mut self, parent: &str) -> Self {
        self.fail_get_parents.push(parent.to_string());
        self
    }

    pub fn with_list_api_version(mut self, api_version: &str) -> Self {
        self.list_api_version = Some(api_version.to_string());
        self
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn find_resources(&self, selector: &KindSelector) -> Result<Vec<ResourceMatch>> {
        let mut matches = Vec::new();
        for api in &self.apis {
            if !(segment_matches(&selector.group, &api.spec.group)
                && segment_matches(&selector.version, &api.spec.version)
                && segment_matches(&selector.kind, &api.spec.kind))
            {
                continue;
            }
            if selector.subresource.is_empty() || selector.subresource == "*" {
                matches.push(ResourceMatch {
                    parent: api.spec.clone(),
                    subresource: String::new(),
                    child: api.spec.clone(),
                });
            }
            if !selector.subresource.is_empty() {
                for sub in &api.subresources {
                    let leaf = sub.name.split('/').nth(1).unwrap_or_default();
                    if segment_matches(&selector.subresource, leaf) {
                        matches.push(ResourceMatch {
                            parent: api.spec.clone(),
                            subresource: leaf.to_string(),
                            child: sub.clone(),
                        });
                    }
                }
            }
        }
        if matches.is_empty() {
            bail!("no API resource matches {selector}");
        }
        Ok(matches)
    }

    async fn kind_for(
        &self,
        group: &str,
        version: &str,
        resource: &str,
    ) -> Result<Option<GroupVersionKind>> {
        for api in &self.apis {
            if segment_matches(group, &api.spec.group)
                && segment_matches(version, &api.spec.version)
                && api.spec.name == resource
            {
                return Ok(Some(api.spec.gvk()));
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
        if self.fail_list_kinds.iter().any(|k| k == kind) {
            bail!("the server could not list {kind}");
        }
        let items: Vec<DynamicObject> = self
            .objects
            .iter()
            .filter(|(stored_kind, obj)| {
                stored_kind.as_str() == kind
                    && (namespace.is_empty()
                        || obj.namespace().is_none_or(|ns| ns == namespace))
            })
            .map(|(_, obj)| obj.clone())
            .collect();
        Ok(ObjectList {
            types: TypeMeta {
                api_version: self
                    .list_api_version
                    .clone()
                    .unwrap_or_else(|| api_version.to_string()),
                kind: format!("{kind}List"),
            },
            metadata: Default::default(),
            items,
        })
    }

    async fn get_resource(
        &self,
        api_version: &str,
        kind: &str,
        _namespace: &str,
        name: &str,
        subresource: &str,
    ) -> Result<DynamicObject> {
        if self.fail_get_parents.iter().any(|p| p == name) {
            bail!("the server could not get {subresource} of {name}");
        }
        self.subresource_objects
            .iter()
            .find(|(parent, leaf, _)| parent == name && leaf == subresource)
            .map(|(_, _, obj)| obj.clone())
            .ok_or_else(|| anyhow!("{subresource} of {api_version}/{kind} {name} not found"))
    }
}
