// src/kubeconfig/model.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys this crate does not interpret, carried through untouched so a
/// rewrite never loses them (`exec`, `proxy-url`, `extensions`, ...).
pub type Passthrough = BTreeMap<String, serde_yaml::Value>;

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    #[serde(default)]
    pub server: String,
    #[serde(
        rename = "insecure-skip-tls-verify",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub insecure_skip_tls_verify: bool,
    #[serde(
        rename = "certificate-authority",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_authority: Option<String>,
    #[serde(
        rename = "certificate-authority-data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_authority_data: Option<String>,
    #[serde(flatten)]
    pub other: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    #[serde(default)]
    pub cluster: ClusterEndpoint,
}

/// Credential material of a user entry. Two users are "the same credential"
/// when every field here compares equal, including passthrough keys such as
/// `exec` or `auth-provider`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserCredentials {
    #[serde(
        rename = "client-certificate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_certificate: Option<String>,
    #[serde(
        rename = "client-certificate-data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key", default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(
        rename = "client-key-data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_key_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub other: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: UserCredentials,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextRef {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(flatten)]
    pub other: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    #[serde(default)]
    pub context: ContextRef,
}

impl NamedContext {
    pub fn new(name: &str, cluster: &str, user: &str, namespace: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            context: ContextRef {
                cluster: cluster.to_string(),
                user: user.to_string(),
                namespace: namespace.map(str::to_string),
                other: Passthrough::new(),
            },
        }
    }
}

/// The whole kubeconfig document. References from contexts to clusters and
/// users are by name and may dangle in files written by other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context", default)]
    pub current_context: String,
    #[serde(default, skip_serializing_if = "Passthrough::is_empty")]
    pub preferences: Passthrough,
    #[serde(flatten)]
    pub other: Passthrough,
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            clusters: Vec::new(),
            users: Vec::new(),
            contexts: Vec::new(),
            current_context: String::new(),
            preferences: Passthrough::new(),
            other: Passthrough::new(),
        }
    }
}

impl KubeConfig {
    pub fn find_context(&self, name: &str) -> Option<&NamedContext> {
        self.contexts.iter().find(|c| c.name == name)
    }

    pub fn find_cluster(&self, name: &str) -> Option<&NamedCluster> {
        self.clusters.iter().find(|c| c.name == name)
    }

    pub fn find_user(&self, name: &str) -> Option<&NamedUser> {
        self.users.iter().find(|u| u.name == name)
    }

    pub fn has_current_context(&self) -> bool {
        !self.current_context.is_empty()
    }

    /// Server URL of the cluster a context points at, if it resolves.
    pub fn server_for(&self, context: &NamedContext) -> Option<&str> {
        self.find_cluster(&context.context.cluster)
            .map(|c| c.cluster.server.as_str())
    }

    /// Credentials of the user a context points at, if it resolves.
    pub fn credentials_for(&self, context: &NamedContext) -> Option<&UserCredentials> {
        self.find_user(&context.context.user).map(|u| &u.user)
    }
}
