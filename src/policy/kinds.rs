// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Extraction of kind selectors from policy match expressions.

use std::collections::BTreeSet;

use k8s_openapi::api::admissionregistration::v1::ValidatingAdmissionPolicy;
use tracing::debug;

use super::Rule;
use crate::kubernetes::ClusterClient;

/// All kind selectors a rule's match block references: the direct
/// `resources.kinds` list plus every `any`/`all` filter's kinds.
pub fn kinds_from_rule(rule: &Rule) -> BTreeSet<String> {
    let mut kinds: BTreeSet<String> =
        rule.match_resources.resources.kinds.iter().cloned().collect();
    for filter in rule
        .match_resources
        .any
        .iter()
        .chain(rule.match_resources.all.iter())
    {
        kinds.extend(filter.resources.kinds.iter().cloned());
    }
    kinds
}

/// Kind selectors referenced by a validating-admission policy's match
/// constraints.
///
/// Constraint rules name plural resources, not kinds, so each entry is
/// mapped back through the client's REST-mapper lookup. Any resolution
/// failure degrades to an empty set for the whole policy; a policy that
/// cannot be resolved simply matches nothing.
pub async fn kinds_from_admission_policy<C>(
    policy: &ValidatingAdmissionPolicy,
    client: &C,
) -> BTreeSet<String>
where
    C: ClusterClient + ?Sized,
{
    let mut kinds = BTreeSet::new();
    let Some(constraints) = policy
        .spec
        .as_ref()
        .and_then(|spec| spec.match_constraints.as_ref())
    else {
        return kinds;
    };
    for rule in constraints.resource_rules.as_deref().unwrap_or_default() {
        let groups = wildcard_when_empty(rule.api_groups.as_deref());
        let versions = wildcard_when_empty(rule.api_versions.as_deref());
        let resources = rule.resources.as_deref().unwrap_or_default();
        for group in &groups {
            for version in &versions {
                for resource in resources {
                    let (plural, subresource) = match resource.split_once('/') {
                        Some((plural, subresource)) => (plural, subresource),
                        None => (resource.as_str(), ""),
                    };
                    if plural == "*" {
                        kinds.insert(format_selector(group, version, "*", subresource));
                        continue;
                    }
                    match client.kind_for(group, version, plural).await {
                        Ok(Some(gvk)) => {
                            kinds.insert(format_selector(
                                &gvk.group,
                                &gvk.version,
                                &gvk.kind,
                                subresource,
                            ));
                        }
                        Ok(None) => {
                            debug!(
                                resource = %resource,
                                "failed to get kinds from validating admission policy"
                            );
                            return BTreeSet::new();
                        }
                        Err(err) => {
                            debug!(
                                resource = %resource,
                                error = %err,
                                "failed to get kinds from validating admission policy"
                            );
                            return BTreeSet::new();
                        }
                    }
                }
            }
        }
    }
    kinds
}

fn wildcard_when_empty(list: Option<&[String]>) -> Vec<String> {
    match list {
        Some(list) if !list.is_empty() => list.to_vec(),
        _ => vec!["*".to_string()],
    }
}

/// Selector string in the form the kind parser accepts; the group segment
/// is dropped for core-group kinds.
fn format_selector(group: &str, version: &str, kind: &str, subresource: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !group.is_empty() {
        parts.push(group);
    }
    parts.push(if version.is_empty() { "*" } else { version });
    parts.push(kind);
    if !subresource.is_empty() {
        parts.push(subresource);
    }
    parts.join("/")
}
