// src/kubeconfig/mod.rs
mod error;
pub mod model;
pub mod ops;
mod persistence;

pub use error::ContextError;
pub use model::{
    ClusterEndpoint, ContextRef, KubeConfig, NamedCluster, NamedContext, NamedUser,
    Passthrough, UserCredentials,
};
pub use ops::{duplicate_name, remove_context, unique_context_name};
pub use persistence::{Persistence, YamlPersistence, KUBECONFIG_ENV};
