//! Turns naming requests into dependency ordered batches.
//!
//! A [`Batch`] groups every name that shares a depth and an immediate parent, so it can be
//! created with a single call. Batches are ordered shallow first, which guarantees that a
//! parent subname always exists before any of its children are created.

use crate::{
    ens::label_count,
    request::{NamingRequest, normalize_name},
};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A name in the graph, derived from a [`NamingRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainNode {
    pub full_name: String,
    /// Number of labels beyond the root parent, `1` for direct children.
    pub level: usize,
    pub immediate_parent: String,
    pub source: NamingRequest,
}

impl DomainNode {
    /// Returns the first label of the full name.
    pub fn label(&self) -> &str {
        self.full_name.split('.').next().unwrap_or_default()
    }

    pub fn address(&self) -> Address {
        self.source.address
    }

    /// Whether this node was synthesized or supplied without a contract.
    pub fn is_placeholder(&self) -> bool {
        self.source.is_placeholder()
    }
}

/// Entries sharing both `level` and `immediate_parent`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub immediate_parent: String,
    pub level: usize,
    /// Sorted by full name.
    pub entries: Vec<DomainNode>,
}

impl Batch {
    /// Entries backed by a real contract, in order.
    pub fn real_entries(&self) -> impl Iterator<Item = &DomainNode> {
        self.entries.iter().filter(|node| !node.is_placeholder())
    }
}

/// Errors produced while building the name graph.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("parent name is empty")]
    EmptyParent,
    #[error("`{name}` is not a subname of `{root}`")]
    NotASubname { name: String, root: String },
}

/// Builds the ordered batch list for `requests` under `root_parent`.
///
/// Requests are expected to have passed [`validate_requests`](crate::validate_requests); a
/// request resolving to the root parent itself is still rejected here.
pub fn build(requests: &[NamingRequest], root_parent: &str) -> Result<Vec<Batch>, GraphError> {
    let root = root_parent.trim().to_ascii_lowercase();
    if root.is_empty() {
        return Err(GraphError::EmptyParent);
    }
    let root_labels = label_count(&root);

    let mut nodes = BTreeMap::<String, DomainNode>::new();
    for request in requests {
        if request.label.trim().eq_ignore_ascii_case(&root) {
            return Err(GraphError::NotASubname { name: root.clone(), root });
        }
        let full_name = normalize_name(&request.label, &root);
        let labels = label_count(&full_name);
        if labels <= root_labels {
            return Err(GraphError::NotASubname { name: full_name, root });
        }
        let level = labels - root_labels;
        let node = DomainNode {
            immediate_parent: immediate_parent(&full_name, level, &root),
            source: NamingRequest::new(request.address, full_name.clone()),
            full_name: full_name.clone(),
            level,
        };
        nodes.insert(full_name, node);
    }

    complete_ancestors(&mut nodes, &root);

    let mut batches = BTreeMap::<(usize, String), Vec<DomainNode>>::new();
    for node in nodes.into_values() {
        batches.entry((node.level, node.immediate_parent.clone())).or_default().push(node);
    }

    let batches = batches
        .into_iter()
        .map(|((level, immediate_parent), entries)| Batch { immediate_parent, level, entries })
        .collect::<Vec<_>>();
    trace!(target: "enscribe::graph", batches = batches.len(), %root, "built name graph");
    Ok(batches)
}

/// Flattens batches back into requests, placeholders included.
pub fn flatten(batches: &[Batch]) -> Vec<NamingRequest> {
    batches.iter().flat_map(|batch| batch.entries.iter().map(|node| node.source.clone())).collect()
}

/// Inserts a zero address placeholder for every missing ancestor strictly between a node and
/// the root.
fn complete_ancestors(nodes: &mut BTreeMap<String, DomainNode>, root: &str) {
    let mut missing = Vec::new();
    for node in nodes.values() {
        let mut name = node.full_name.as_str();
        let mut level = node.level;
        while level > 1 {
            let Some((_, parent)) = name.split_once('.') else { break };
            name = parent;
            level -= 1;
            if !nodes.contains_key(name) {
                missing.push((name.to_string(), level));
            }
        }
    }

    for (full_name, level) in missing {
        nodes.entry(full_name.clone()).or_insert_with(|| {
            debug!(target: "enscribe::graph", name = %full_name, "adding placeholder ancestor");
            DomainNode {
                immediate_parent: immediate_parent(&full_name, level, root),
                source: NamingRequest::new(Address::ZERO, full_name.clone()),
                full_name,
                level,
            }
        });
    }
}

fn immediate_parent(full_name: &str, level: usize, root: &str) -> String {
    if level == 1 {
        return root.to_string();
    }
    full_name.split_once('.').map(|(_, parent)| parent.to_string()).unwrap_or_default()
}
