// src/kubeconfig/persistence.rs
use async_trait::async_trait;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::error::ContextError;
use super::model::KubeConfig;

pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Loading and storing of kubeconfig documents.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn load_from_path(&self, path: &Path) -> Result<KubeConfig, ContextError>;

    fn load_from_text(&self, text: &str) -> Result<KubeConfig, ContextError>;

    fn serialize(&self, doc: &KubeConfig) -> Result<String, ContextError>;

    async fn write(&self, path: &Path, text: &str) -> Result<(), ContextError>;

    /// Location of the canonical document.
    fn current_path(&self) -> Result<PathBuf, ContextError>;
}

pub struct YamlPersistence {
    explicit_path: Option<PathBuf>,
}

impl YamlPersistence {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self { explicit_path }
    }
}

impl Default for YamlPersistence {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Persistence for YamlPersistence {
    async fn load_from_path(&self, path: &Path) -> Result<KubeConfig, ContextError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContextError::NotFound(path.display().to_string()));
            }
            // not UTF-8 text
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(ContextError::ParseFailure(format!("{}: {}", path.display(), e)));
            }
            Err(e) => return Err(ContextError::Io(e)),
        };
        self.load_from_text(&content)
    }

    fn load_from_text(&self, text: &str) -> Result<KubeConfig, ContextError> {
        if text.trim().is_empty() {
            return Ok(KubeConfig::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    fn serialize(&self, doc: &KubeConfig) -> Result<String, ContextError> {
        serde_yaml::to_string(doc).map_err(|e| ContextError::Serialization(e.to_string()))
    }

    async fn write(&self, path: &Path, text: &str) -> Result<(), ContextError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, text).await?;
        Ok(())
    }

    fn current_path(&self) -> Result<PathBuf, ContextError> {
        if let Some(path) = &self.explicit_path {
            return Ok(path.clone());
        }

        if let Some(value) = env::var_os(KUBECONFIG_ENV) {
            if let Some(first) = env::split_paths(&value).find(|p| !p.as_os_str().is_empty()) {
                return Ok(first);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".kube").join("config"))
            .ok_or_else(|| {
                ContextError::ResolutionError("no home directory for ~/.kube/config".to_string())
            })
    }
}
