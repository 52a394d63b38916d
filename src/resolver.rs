// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Top-level resolution: which resources do these policies apply to, and
//! where do they come from.
//!
//! Cluster mode derives the kind universe from the policies and fetches the
//! instances; local mode decodes resource files instead. With both a
//! cluster and resource paths, the paths act as a name filter over the
//! fetched results.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{Result, bail};
use kube::api::DynamicObject;
use tracing::debug;

use crate::diagnostics;
use crate::kubernetes::{ClusterClient, fetch_from_cluster, resolve_kinds};
use crate::policy::{Policy, kinds_from_admission_policy, kinds_from_rule};
use crate::resource::{OsFs, fetch_from_paths};

/// Caller configuration for one resolution run.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Fetch from the cluster instead of local paths.
    pub cluster: bool,
    /// Namespace to list in; empty means all namespaces.
    pub namespace: String,
    /// Route non-fatal diagnostics to the structured log instead of the
    /// output stream.
    pub policy_report: bool,
    /// Restrict resolution to cluster-scoped kinds.
    pub cluster_wide_resources: bool,
}

/// Resolve and fetch the resources the given policies match.
///
/// In cluster mode, `resource_paths` entries are treated as resource name
/// filters and a name that matches nothing fails the whole resolution.
/// Without a cluster, `resource_paths` are files to decode. With neither,
/// the result is empty.
pub async fn get_resources<W: Write>(
    out: &mut W,
    policies: &[Policy],
    resource_paths: &[String],
    client: Option<&dyn ClusterClient>,
    options: &ResolveOptions,
) -> Result<Vec<DynamicObject>> {
    if options.cluster && let Some(client) = client {
        return fetch_for_policies(out, policies, resource_paths, client, options).await;
    }
    if !resource_paths.is_empty() {
        return fetch_from_paths(out, &OsFs, None, resource_paths, options.policy_report);
    }
    Ok(Vec::new())
}

async fn fetch_for_policies<W: Write>(
    out: &mut W,
    policies: &[Policy],
    resource_paths: &[String],
    client: &dyn ClusterClient,
    options: &ResolveOptions,
) -> Result<Vec<DynamicObject>> {
    let mut selectors = BTreeSet::new();
    for policy in policies {
        match policy {
            Policy::Kyverno(cluster_policy) => {
                for rule in &cluster_policy.spec.rules {
                    selectors.extend(kinds_from_rule(rule));
                }
            }
            Policy::ValidatingAdmission(admission_policy) => {
                selectors.extend(kinds_from_admission_policy(admission_policy, client).await);
            }
        }
    }
    debug!(policies = policies.len(), selectors = selectors.len(), "resolving policy kinds");

    let (kinds, subresources) =
        resolve_kinds(client, &selectors, options.cluster_wide_resources).await;
    let fetched =
        fetch_from_cluster(out, client, &kinds, &subresources, &options.namespace).await;

    if resource_paths.is_empty() {
        return Ok(fetched.into_values().collect());
    }

    let mut resources = Vec::new();
    for requested in resource_paths {
        let matched: Vec<DynamicObject> = fetched
            .iter()
            .filter(|(key, _)| key.name == *requested)
            .map(|(_, resource)| resource.clone())
            .collect();
        if matched.is_empty() {
            diagnostics::emit(
                out,
                options.policy_report,
                &format!("resource {requested} not found in cluster"),
            );
            bail!("{requested} not found in cluster");
        }
        resources.extend(matched);
    }
    Ok(resources)
}
