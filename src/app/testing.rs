// In-memory fakes shared by the engine and dispatch tests.
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::ContextManager;
use crate::kubeconfig::{
    ClusterEndpoint, ContextError, KubeConfig, NamedCluster, NamedContext, NamedUser, Persistence,
    UserCredentials, YamlPersistence,
};
use crate::types::Severity;
use crate::ui::NotificationSink;
use crate::utils::logging::Logger;

pub const CANONICAL_PATH: &str = "/home/me/.kube/config";

pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _message: &str) {}
    fn debug_log(&self, _message: &str) {}
}

#[derive(Default)]
pub struct MemoryPersistence {
    files: Mutex<HashMap<PathBuf, String>>,
    writes: Mutex<usize>,
    fail_writes: Mutex<bool>,
}

impl MemoryPersistence {
    pub fn put_file(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub fn last_written(&self) -> Option<KubeConfig> {
        let files = self.files.lock().unwrap();
        files
            .get(Path::new(CANONICAL_PATH))
            .map(|text| serde_yaml::from_str(text).unwrap())
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn load_from_path(&self, path: &Path) -> Result<KubeConfig, ContextError> {
        let text = self.files.lock().unwrap().get(path).cloned();
        match text {
            Some(text) => self.load_from_text(&text),
            None => Err(ContextError::NotFound(path.display().to_string())),
        }
    }

    fn load_from_text(&self, text: &str) -> Result<KubeConfig, ContextError> {
        YamlPersistence::default().load_from_text(text)
    }

    fn serialize(&self, doc: &KubeConfig) -> Result<String, ContextError> {
        YamlPersistence::default().serialize(doc)
    }

    async fn write(&self, path: &Path, text: &str) -> Result<(), ContextError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(ContextError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            )));
        }
        *self.writes.lock().unwrap() += 1;
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    fn current_path(&self) -> Result<PathBuf, ContextError> {
        Ok(PathBuf::from(CANONICAL_PATH))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(String, String, Severity)>>,
    answer: Mutex<Option<String>>,
    confirmations: Mutex<usize>,
}

impl RecordingNotifier {
    pub fn answer(&self, label: &str) {
        *self.answer.lock().unwrap() = Some(label.to_string());
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, severity)| *severity == Severity::Error)
            .map(|(title, _, _)| title.clone())
            .collect()
    }

    pub fn confirmations(&self) -> usize {
        *self.confirmations.lock().unwrap()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str, severity: Severity) {
        self.notifications
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string(), severity));
    }

    async fn confirm(&self, _prompt: &str, _affirmative: &str, negative: &str) -> String {
        *self.confirmations.lock().unwrap() += 1;
        self.answer
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| negative.to_string())
    }
}

pub struct Harness {
    pub manager: Arc<ContextManager>,
    pub persistence: Arc<MemoryPersistence>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    let persistence = Arc::new(MemoryPersistence::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = Arc::new(ContextManager::new(
        persistence.clone(),
        notifier.clone(),
        Arc::new(NullLogger),
    ));
    Harness {
        manager,
        persistence,
        notifier,
    }
}

fn cluster(name: &str) -> NamedCluster {
    NamedCluster {
        name: name.to_string(),
        cluster: ClusterEndpoint {
            server: format!("https://{}.example:6443", name),
            ..Default::default()
        },
    }
}

fn user(name: &str) -> NamedUser {
    NamedUser {
        name: name.to_string(),
        user: UserCredentials {
            token: Some(format!("{}-token", name)),
            ..Default::default()
        },
    }
}

/// context1 -> cluster1/user1 (current), context2 -> cluster2/user2.
pub fn fixture_doc() -> KubeConfig {
    KubeConfig {
        clusters: vec![cluster("cluster1"), cluster("cluster2")],
        users: vec![user("user1"), user("user2")],
        contexts: vec![
            NamedContext::new("context1", "cluster1", "user1", None),
            NamedContext::new("context2", "cluster2", "user2", Some("kube-system")),
        ],
        current_context: "context1".to_string(),
        ..Default::default()
    }
}
