//! Naming requests and their planning-time validation.

use crate::ens::label_count;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// One user supplied intent: give `address` the name described by `label`.
///
/// A zero `address` marks a placeholder for an ancestor name without a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRequest {
    pub address: Address,
    /// Either a bare label (`app`) or a full name ending in the root parent.
    pub label: String,
}

impl NamingRequest {
    pub fn new(address: Address, label: impl Into<String>) -> Self {
        Self { address, label: label.into() }
    }

    /// Whether this request only stands in for a missing ancestor.
    pub fn is_placeholder(&self) -> bool {
        self.address.is_zero()
    }

    /// Returns the fully qualified name of this request under `root_parent`.
    pub fn full_name(&self, root_parent: &str) -> String {
        normalize_name(&self.label, root_parent)
    }
}

/// Normalizes a label into a full name under `root_parent`.
///
/// Input is trimmed and ASCII lower-cased; names already ending in `.{root_parent}` are kept.
pub fn normalize_name(label: &str, root_parent: &str) -> String {
    let label = label.trim().to_ascii_lowercase();
    let root = root_parent.trim().to_ascii_lowercase();
    if label.ends_with(&format!(".{root}")) { label } else { format!("{label}.{root}") }
}

/// A single rejected request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    #[error("empty label")]
    EmptyLabel,
    #[error("label `{0}` contains an empty segment")]
    EmptySegment(String),
    #[error("label `{0}` contains whitespace or `/`")]
    IllegalCharacter(String),
    #[error("`{0}` is the parent name itself")]
    IsRootParent(String),
    #[error("duplicate name `{name}`, first used by entry #{first}")]
    Duplicate { name: String, first: usize },
}

/// Planning-time validation failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("parent name is empty")]
    EmptyParent,
    #[error("parent name `{0}` is malformed")]
    MalformedParent(String),
    #[error("no naming requests given")]
    NoRequests,
    #[error("{}", DisplayRejected(.0))]
    Rejected(Vec<(usize, InvalidRequest)>),
}

struct DisplayRejected<'a>(&'a [(usize, InvalidRequest)]);

impl fmt::Display for DisplayRejected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid naming request(s):", self.0.len())?;
        for (idx, err) in self.0 {
            write!(f, "\n  entry #{idx}: {err}")?;
        }
        Ok(())
    }
}

/// Validates the root parent name.
pub fn validate_parent(root_parent: &str) -> Result<(), ValidationError> {
    let root = root_parent.trim();
    if root.is_empty() {
        return Err(ValidationError::EmptyParent);
    }
    if root.split('.').any(|segment| segment.is_empty() || has_illegal_chars(segment)) {
        return Err(ValidationError::MalformedParent(root.to_string()));
    }
    Ok(())
}

/// Validates user supplied requests before any graph is built.
///
/// All problems are collected so they can be reported together.
pub fn validate_requests(
    requests: &[NamingRequest],
    root_parent: &str,
) -> Result<(), ValidationError> {
    validate_parent(root_parent)?;
    if requests.is_empty() {
        return Err(ValidationError::NoRequests);
    }

    let root = root_parent.trim().to_ascii_lowercase();
    let mut seen = HashMap::<String, usize>::with_capacity(requests.len());
    let mut rejected = Vec::new();

    for (idx, request) in requests.iter().enumerate() {
        let label = request.label.trim();
        if label.is_empty() {
            rejected.push((idx, InvalidRequest::EmptyLabel));
            continue;
        }
        if label.split('.').any(str::is_empty) {
            rejected.push((idx, InvalidRequest::EmptySegment(label.to_string())));
            continue;
        }
        if has_illegal_chars(label) {
            rejected.push((idx, InvalidRequest::IllegalCharacter(label.to_string())));
            continue;
        }
        if label.eq_ignore_ascii_case(&root) {
            rejected.push((idx, InvalidRequest::IsRootParent(label.to_string())));
            continue;
        }

        let name = request.full_name(&root);
        debug_assert!(label_count(&name) > label_count(&root));
        if let Some(&first) = seen.get(&name) {
            rejected.push((idx, InvalidRequest::Duplicate { name, first }));
        } else {
            seen.insert(name, idx);
        }
    }

    if rejected.is_empty() { Ok(()) } else { Err(ValidationError::Rejected(rejected)) }
}

fn has_illegal_chars(s: &str) -> bool {
    s.chars().any(|c| c.is_whitespace() || c == '/')
}
