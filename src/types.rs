// types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// How an imported context whose name already exists is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    KeepBoth,
    Replace,
}

/// One context found in a file offered for import.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportCandidate {
    #[schema(example = "staging")]
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: Option<String>,
    #[schema(example = "https://10.0.0.1:6443")]
    pub server: Option<String>,
    pub has_conflict: bool,
    pub certificate_changed: bool,
}

/// Payload entry of the available-contexts channel.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    #[schema(example = "production")]
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: Option<String>,
    pub server: Option<String>,
    pub is_current: bool,
}

/// Replacement fields for an edited context. An empty namespace removes it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct ContextEdit {
    pub name: String,
    pub cluster: String,
    pub user: String,
    #[serde(default)]
    pub namespace: Option<String>,
}
