// src/lib.rs
pub mod app;
pub mod config;
pub mod kubeconfig;
pub mod subscription;
pub mod types;
pub mod ui;
pub mod utils;
pub mod web;

pub use app::{ContextManager, DocumentChanged};
pub use kubeconfig::{ContextError, KubeConfig, Persistence, YamlPersistence};
pub use subscription::{Channel, Dispatcher, SubscriptionRegistry};
