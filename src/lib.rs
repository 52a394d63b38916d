// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resolve which Kubernetes resources a set of admission policies matches
//! and fetch them, either from a live cluster or from local resource files,
//! into a uniform [`DynamicObject`](kube::api::DynamicObject) collection.
//!
//! The pipeline: policy match blocks are reduced to kind selectors, the
//! selectors are expanded against cluster discovery into concrete
//! GroupVersionKinds (subresources keep a link to their parent resource),
//! and instances are fetched kind by kind. Local resource files bypass
//! discovery and are decoded directly.

mod diagnostics;
pub mod kubernetes;
pub mod policy;
pub mod resolver;
pub mod resource;

pub use kubernetes::{ClusterClient, KindSelector, KubeClient};
pub use policy::Policy;
pub use resolver::{ResolveOptions, get_resources};
pub use resource::{MemoryFs, OsFs, ResourceFs};
