// config/types.rs
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

fn default_log_file() -> String {
    "logs/kube-contexts.log".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Overrides `$KUBECONFIG` and `~/.kube/config`.
    #[serde(default)]
    pub kubeconfig_path: Option<String>,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Answer given to confirmations when nobody is at the terminal.
    #[serde(default)]
    pub assume_yes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            kubeconfig_path: None,
            log_file: default_log_file(),
            port: default_port(),
            assume_yes: false,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> io::Result<Self> {
        let config_str = fs::read_to_string(path)?;
        serde_json::from_str(&config_str).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Like [`AppConfig::load_from_file`], but a missing file means defaults.
    pub fn load_or_default(path: &str) -> io::Result<Self> {
        match Self::load_from_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save_to_file(&self, path: &str) -> io::Result<()> {
        let config_str = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, config_str)
    }

    pub fn expanded_kubeconfig_path(&self) -> Option<String> {
        self.kubeconfig_path
            .as_deref()
            .map(|p| shellexpand::tilde(p).to_string())
    }
}
