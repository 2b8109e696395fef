// src/kubeconfig/ops.rs
//
// Structural operations on a `KubeConfig`. Nothing in here touches the disk.
use std::collections::HashSet;

use super::model::KubeConfig;

fn suffixed_name(doc: &KubeConfig, base: &str) -> String {
    let mut index = 1usize;
    loop {
        let candidate = format!("{}-{}", base, index);
        if doc.find_context(&candidate).is_none() {
            return candidate;
        }
        index += 1;
    }
}

/// Name for a copy of `base`. Always suffixed (`base-1`, `base-2`, ...),
/// even when `base` itself would be free.
pub fn duplicate_name(doc: &KubeConfig, base: &str) -> String {
    suffixed_name(doc, base)
}

/// `base` if no context uses it yet, otherwise the first free suffixed name.
pub fn unique_context_name(doc: &KubeConfig, base: &str) -> String {
    if doc.find_context(base).is_none() {
        base.to_string()
    } else {
        suffixed_name(doc, base)
    }
}

/// Removes a context and any cluster/user it leaves unreferenced.
///
/// A cluster or user is dropped only when it was referenced by some context
/// before the removal and by none after it; entries that were already orphans
/// are kept. The current context is cleared if it named the removed context.
/// When `name` is unknown the document comes back unchanged.
pub fn remove_context(doc: &KubeConfig, name: &str) -> KubeConfig {
    if doc.find_context(name).is_none() {
        return doc.clone();
    }

    let clusters_before: HashSet<&str> = doc
        .contexts
        .iter()
        .map(|c| c.context.cluster.as_str())
        .collect();
    let users_before: HashSet<&str> = doc
        .contexts
        .iter()
        .map(|c| c.context.user.as_str())
        .collect();

    let contexts: Vec<_> = doc
        .contexts
        .iter()
        .filter(|c| c.name != name)
        .cloned()
        .collect();

    let clusters_after: HashSet<&str> = contexts
        .iter()
        .map(|c| c.context.cluster.as_str())
        .collect();
    let users_after: HashSet<&str> = contexts.iter().map(|c| c.context.user.as_str()).collect();

    let clusters = doc
        .clusters
        .iter()
        .filter(|c| {
            let name = c.name.as_str();
            clusters_after.contains(name) || !clusters_before.contains(name)
        })
        .cloned()
        .collect();
    let users = doc
        .users
        .iter()
        .filter(|u| {
            let name = u.name.as_str();
            users_after.contains(name) || !users_before.contains(name)
        })
        .cloned()
        .collect();

    let current_context = if doc.current_context == name {
        String::new()
    } else {
        doc.current_context.clone()
    };

    KubeConfig {
        api_version: doc.api_version.clone(),
        kind: doc.kind.clone(),
        clusters,
        users,
        contexts,
        current_context,
        preferences: doc.preferences.clone(),
        other: doc.other.clone(),
    }
}
