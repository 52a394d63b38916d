// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Decoding of raw resource files into `DynamicObject`s, and the structured
//! key fetched cluster resources are indexed by.

use anyhow::{Context, Result, bail};
use kube::ResourceExt;
use kube::api::DynamicObject;
use serde::Deserialize;
use serde_json::Value;

mod fs;

pub use fs::{MemoryFs, OsFs, ResourceFs, fetch_from_paths};

/// Identity of a fetched cluster resource. A structured key rather than a
/// joined string, so kinds or names containing `-` cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Key for an object under the kind it was resolved as.
    pub fn for_object(kind: &str, object: &DynamicObject) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: object.namespace().unwrap_or_default(),
            name: object.name_any(),
        }
    }
}

/// Decode every resource document in `bytes`.
///
/// Accepts multi-document YAML (and therefore JSON). Empty documents are
/// skipped, `kind: List` documents are flattened into their items, and any
/// malformed document fails the whole call; no partially decoded resources
/// are returned.
pub fn parse_resources(bytes: &[u8]) -> Result<Vec<DynamicObject>> {
    let mut resources = Vec::new();
    for document in serde_yaml::Deserializer::from_slice(bytes) {
        let value = Value::deserialize(document).context("malformed resource document")?;
        if value.is_null() {
            continue;
        }
        if value.get("kind").and_then(Value::as_str) == Some("List") {
            let Some(items) = value.get("items") else {
                continue;
            };
            let items = items
                .as_array()
                .context("List resource has a non-array items field")?;
            for item in items {
                resources.push(to_object(item.clone())?);
            }
        } else {
            resources.push(to_object(value)?);
        }
    }
    Ok(resources)
}

/// Decode the first resource document in `bytes`; used for patched and
/// generated resources which are always a single object.
pub fn parse_single(bytes: &[u8]) -> Result<DynamicObject> {
    let mut resources = parse_resources(bytes)?;
    if resources.is_empty() {
        bail!("no resource document found");
    }
    Ok(resources.remove(0))
}

fn to_object(value: Value) -> Result<DynamicObject> {
    serde_json::from_value(value).context("resource document is not a Kubernetes object")
}
