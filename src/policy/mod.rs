// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! The two policy shapes the resolver understands.
//!
//! Kyverno-style policies carry free-form kind strings in their match
//! blocks; validating-admission policies reference plural resource names
//! that have to be mapped back to kinds through discovery.

use k8s_openapi::api::admissionregistration::v1::ValidatingAdmissionPolicy;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;

mod kinds;

pub use kinds::{kinds_from_admission_policy, kinds_from_rule};

/// A policy whose matched resources are to be resolved. Closed set: every
/// consumer dispatches by exhaustive match.
#[derive(Debug, Clone)]
pub enum Policy {
    Kyverno(ClusterPolicy),
    ValidatingAdmission(Box<ValidatingAdmissionPolicy>),
}

impl Policy {
    /// Policy name for diagnostics.
    pub fn name(&self) -> &str {
        match self {
            Policy::Kyverno(policy) => policy.metadata.name.as_deref().unwrap_or(""),
            Policy::ValidatingAdmission(policy) => policy.metadata.name.as_deref().unwrap_or(""),
        }
    }
}

/// Kyverno-style policy, reduced to the parts resolution needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterPolicy {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PolicySpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicySpec {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "match")]
    pub match_resources: MatchResources,
}

/// A rule's match block. Kinds may be listed directly under `resources` or
/// nested inside `any`/`all` filter lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchResources {
    #[serde(default)]
    pub any: Vec<ResourceFilter>,
    #[serde(default)]
    pub all: Vec<ResourceFilter>,
    #[serde(default)]
    pub resources: ResourceDescription,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceFilter {
    #[serde(default)]
    pub resources: ResourceDescription,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceDescription {
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub namespaces: Vec<String>,
}
