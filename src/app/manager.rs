// src/app/manager.rs
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

use super::phase::{OperationTrace, Phase};
use crate::kubeconfig::{
    duplicate_name, remove_context, unique_context_name, ContextError, ContextRef, KubeConfig,
    NamedContext, Persistence,
};
use crate::types::{ConflictResolution, ContextEdit, ContextSummary, ImportCandidate, Severity};
use crate::ui::NotificationSink;
use crate::utils::logging::Logger;

const CHANGE_CHANNEL_CAPACITY: usize = 64;
const CONFIRM_DELETE: &str = "Delete";
const CONFIRM_CANCEL: &str = "Cancel";

/// Raised once after every successful change to the held document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentChanged;

/// Owns the live kubeconfig and applies every change to it.
///
/// Mutating calls are serialized by `op_lock`; each one works on a copy of
/// the document, writes the copy to disk and only then swaps it in, so a
/// failed call leaves the held document untouched. Change events go out on
/// a broadcast channel and are never awaited.
pub struct ContextManager {
    document: RwLock<KubeConfig>,
    op_lock: Mutex<()>,
    persistence: Arc<dyn Persistence>,
    notifier: Arc<dyn NotificationSink>,
    logger: Arc<dyn Logger>,
    changes: broadcast::Sender<DocumentChanged>,
}

impl ContextManager {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        notifier: Arc<dyn NotificationSink>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            document: RwLock::new(KubeConfig::default()),
            op_lock: Mutex::new(()),
            persistence,
            notifier,
            logger,
            changes,
        }
    }

    /// Receiver for change events. Dropping it unregisters.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<DocumentChanged> {
        self.changes.subscribe()
    }

    pub async fn snapshot(&self) -> KubeConfig {
        self.document.read().await.clone()
    }

    pub async fn current_context(&self) -> String {
        self.document.read().await.current_context.clone()
    }

    /// Reads the canonical document. A missing file starts an empty one.
    pub async fn load(&self) -> Result<(), ContextError> {
        let path = self.persistence.current_path()?;
        let doc = match self.persistence.load_from_path(&path).await {
            Ok(doc) => doc,
            Err(ContextError::NotFound(_)) => {
                self.logger.log(&format!(
                    "No kubeconfig at {}, starting with an empty one",
                    path.display()
                ));
                KubeConfig::default()
            }
            Err(e) => return Err(e),
        };
        self.logger.log(&format!(
            "Loaded {} contexts from {}",
            doc.contexts.len(),
            path.display()
        ));
        self.update(doc).await;
        Ok(())
    }

    /// Replaces the held document without writing it. Waits for any
    /// mutation in flight so its commit cannot overwrite `doc`.
    pub async fn update(&self, doc: KubeConfig) {
        let _guard = self.op_lock.lock().await;
        self.swap(doc).await;
    }

    pub async fn set_current_context(&self, name: &str) -> bool {
        let _guard = self.op_lock.lock().await;
        let mut trace = OperationTrace::begin("set-current-context", Arc::clone(&self.logger));

        let mut doc = self.snapshot().await;
        if doc.find_context(name).is_none() {
            let err = ContextError::NotFound(format!("context '{}'", name));
            return self
                .fail(&mut trace, "Failed to switch context", &err)
                .await;
        }

        trace.advance(Phase::Mutating);
        doc.current_context = name.to_string();

        match self.commit(&mut trace, doc).await {
            Ok(()) => {
                self.logger.log(&format!("Switched to context '{}'", name));
                true
            }
            Err(e) => self.fail(&mut trace, "Failed to switch context", &e).await,
        }
    }

    pub async fn delete_context(&self, name: &str) -> bool {
        let _guard = self.op_lock.lock().await;
        let mut trace = OperationTrace::begin("delete-context", Arc::clone(&self.logger));

        let doc = self.snapshot().await;
        if doc.find_context(name).is_none() {
            let err = ContextError::NotFound(format!("context '{}'", name));
            return self
                .fail(&mut trace, "Failed to delete context", &err)
                .await;
        }

        if doc.current_context == name {
            let answer = self
                .notifier
                .confirm(
                    &format!("'{}' is the current context. Delete it anyway?", name),
                    CONFIRM_DELETE,
                    CONFIRM_CANCEL,
                )
                .await;
            if answer != CONFIRM_DELETE {
                trace.abort("deletion of current context declined");
                return false;
            }
        }

        trace.advance(Phase::Mutating);
        let doc = remove_context(&doc, name);

        match self.commit(&mut trace, doc).await {
            Ok(()) => {
                self.logger.log(&format!("Deleted context '{}'", name));
                true
            }
            Err(e) => self.fail(&mut trace, "Failed to delete context", &e).await,
        }
    }

    pub async fn duplicate_context(&self, name: &str) -> bool {
        let _guard = self.op_lock.lock().await;
        let mut trace = OperationTrace::begin("duplicate-context", Arc::clone(&self.logger));
        let title = format!("Failed to duplicate context '{}'", name);

        let mut doc = self.snapshot().await;
        let original = match doc.find_context(name) {
            Some(ctx) => ctx.clone(),
            None => {
                trace.abort("context not found");
                return false;
            }
        };
        if let Err(e) = check_references(&doc, &original) {
            return self.fail(&mut trace, &title, &e).await;
        }

        trace.advance(Phase::Mutating);
        let copy = NamedContext {
            name: duplicate_name(&doc, name),
            context: original.context.clone(),
        };
        let copy_name = copy.name.clone();
        doc.contexts.push(copy);

        match self.commit(&mut trace, doc).await {
            Ok(()) => {
                self.logger
                    .log(&format!("Duplicated context '{}' as '{}'", name, copy_name));
                true
            }
            Err(e) => self.fail(&mut trace, &title, &e).await,
        }
    }

    pub async fn edit_context(&self, name: &str, edit: ContextEdit) -> bool {
        let _guard = self.op_lock.lock().await;
        let mut trace = OperationTrace::begin("edit-context", Arc::clone(&self.logger));
        let title = format!("Failed to edit context '{}'", name);

        let mut doc = self.snapshot().await;
        let index = match doc.contexts.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                let err = ContextError::NotFound(format!("context '{}'", name));
                return self.fail(&mut trace, &title, &err).await;
            }
        };
        if edit.name != name && doc.find_context(&edit.name).is_some() {
            let err = ContextError::AlreadyExists(edit.name.clone());
            return self.fail(&mut trace, &title, &err).await;
        }

        let replacement = NamedContext {
            name: edit.name.clone(),
            context: ContextRef {
                cluster: edit.cluster,
                user: edit.user,
                namespace: edit.namespace.filter(|ns| !ns.is_empty()),
                other: doc.contexts[index].context.other.clone(),
            },
        };
        if let Err(e) = check_references(&doc, &replacement) {
            return self.fail(&mut trace, &title, &e).await;
        }

        trace.advance(Phase::Mutating);
        doc.contexts[index] = replacement;
        if doc.current_context == name {
            doc.current_context = edit.name.clone();
        }

        match self.commit(&mut trace, doc).await {
            Ok(()) => {
                self.logger.log(&format!("Edited context '{}'", name));
                true
            }
            Err(e) => self.fail(&mut trace, &title, &e).await,
        }
    }

    /// Lists the contexts of a file offered for import, in file order.
    pub async fn get_import_contexts(&self, path: &Path) -> Vec<ImportCandidate> {
        let foreign = match self.persistence.load_from_path(path).await {
            Ok(doc) => doc,
            Err(e) => {
                self.report_load_failure(path, &e).await;
                return Vec::new();
            }
        };

        let live = self.document.read().await;
        foreign
            .contexts
            .iter()
            .map(|ctx| {
                let existing = live.find_context(&ctx.name);
                let certificate_changed = existing
                    .map(|own| live.credentials_for(own) != foreign.credentials_for(ctx))
                    .unwrap_or(false);
                ImportCandidate {
                    name: ctx.name.clone(),
                    cluster: ctx.context.cluster.clone(),
                    user: ctx.context.user.clone(),
                    namespace: ctx.context.namespace.clone(),
                    server: foreign.server_for(ctx).map(str::to_string),
                    has_conflict: existing.is_some(),
                    certificate_changed,
                }
            })
            .collect()
    }

    /// Merges the selected contexts of a foreign file into the live document.
    ///
    /// Only a dangling cluster/user reference inside the foreign file is
    /// returned as an error; every other failure is reported to the notifier
    /// and yields `Ok(false)`.
    pub async fn import_contexts_from_file(
        &self,
        path: &Path,
        selected: &[String],
        resolutions: &HashMap<String, ConflictResolution>,
    ) -> Result<bool, ContextError> {
        let _guard = self.op_lock.lock().await;
        let mut trace = OperationTrace::begin("import-contexts", Arc::clone(&self.logger));

        let foreign = match self.persistence.load_from_path(path).await {
            Ok(doc) => doc,
            Err(e) => {
                self.report_load_failure(path, &e).await;
                trace.abort("import file unreadable");
                return Ok(false);
            }
        };

        trace.advance(Phase::Mutating);
        let mut working = self.snapshot().await;
        let mut merged = 0;
        for name in selected {
            let source = match foreign.find_context(name) {
                Some(ctx) => ctx,
                None => continue,
            };
            let cluster = foreign.find_cluster(&source.context.cluster);
            let user = foreign.find_user(&source.context.user);
            let (cluster, user) = match (cluster, user) {
                (Some(cluster), Some(user)) => (cluster.clone(), user.clone()),
                _ => {
                    let err = check_references(&foreign, source)
                        .err()
                        .unwrap_or_else(|| ContextError::NotFound(name.clone()));
                    self.logger.log(&format!("Import aborted: {}", err));
                    trace.abort("dangling reference in import file");
                    return Err(err);
                }
            };

            let conflicting = working.find_context(name).is_some();
            let resolution = if conflicting {
                resolutions
                    .get(name)
                    .copied()
                    .unwrap_or(ConflictResolution::KeepBoth)
            } else {
                ConflictResolution::KeepBoth
            };

            match resolution {
                ConflictResolution::KeepBoth => {
                    let target = unique_context_name(&working, name);
                    if working.find_cluster(&cluster.name).is_none() {
                        working.clusters.push(cluster);
                    }
                    if working.find_user(&user.name).is_none() {
                        working.users.push(user);
                    }
                    working.contexts.push(NamedContext {
                        name: target,
                        context: source.context.clone(),
                    });
                }
                ConflictResolution::Replace => {
                    let current = working.current_context.clone();
                    working = remove_context(&working, name);
                    working.current_context = current;
                    working.clusters.retain(|c| c.name != cluster.name);
                    working.users.retain(|u| u.name != user.name);
                    working.clusters.push(cluster);
                    working.users.push(user);
                    working.contexts.push(source.clone());
                }
            }
            merged += 1;
        }

        match self.commit(&mut trace, working).await {
            Ok(()) => {
                self.logger.log(&format!(
                    "Imported {} context(s) from {}",
                    merged,
                    path.display()
                ));
                Ok(true)
            }
            Err(e) => Ok(self
                .fail(&mut trace, "Failed to import contexts", &e)
                .await),
        }
    }

    pub async fn available_contexts(&self) -> Vec<ContextSummary> {
        let doc = self.document.read().await;
        doc.contexts.iter().map(|ctx| summarize(&doc, ctx)).collect()
    }

    pub async fn current_context_summary(&self) -> Option<ContextSummary> {
        let doc = self.document.read().await;
        if !doc.has_current_context() {
            return None;
        }
        doc.find_context(&doc.current_context)
            .map(|ctx| summarize(&doc, ctx))
    }

    async fn commit(
        &self,
        trace: &mut OperationTrace,
        doc: KubeConfig,
    ) -> Result<(), ContextError> {
        trace.advance(Phase::Persisting);
        let path = self.persistence.current_path()?;
        let text = self.persistence.serialize(&doc)?;
        self.persistence.write(&path, &text).await?;

        trace.advance(Phase::NotifyingObservers);
        self.swap(doc).await;
        trace.finish();
        Ok(())
    }

    async fn fail(&self, trace: &mut OperationTrace, title: &str, error: &ContextError) -> bool {
        self.logger.log(&format!("{}: {}", title, error));
        self.notifier
            .notify(title, &error.to_string(), Severity::Error)
            .await;
        trace.abort(&error.to_string());
        false
    }

    async fn report_load_failure(&self, path: &Path, error: &ContextError) {
        let title = match error {
            ContextError::NotFound(_) => "Import file not found",
            _ => "Failed to read import file",
        };
        self.logger
            .log(&format!("{} ({}): {}", title, path.display(), error));
        self.notifier
            .notify(title, &error.to_string(), Severity::Error)
            .await;
    }

    /// Caller must hold `op_lock`.
    async fn swap(&self, doc: KubeConfig) {
        *self.document.write().await = doc;
        self.emit_change();
    }

    fn emit_change(&self) {
        // no receivers is fine
        let _ = self.changes.send(DocumentChanged);
    }
}

fn check_references(doc: &KubeConfig, ctx: &NamedContext) -> Result<(), ContextError> {
    if doc.find_cluster(&ctx.context.cluster).is_none() {
        return Err(ContextError::MissingReference {
            context: ctx.name.clone(),
            reference: format!("cluster '{}'", ctx.context.cluster),
        });
    }
    if doc.find_user(&ctx.context.user).is_none() {
        return Err(ContextError::MissingReference {
            context: ctx.name.clone(),
            reference: format!("user '{}'", ctx.context.user),
        });
    }
    Ok(())
}

fn summarize(doc: &KubeConfig, ctx: &NamedContext) -> ContextSummary {
    ContextSummary {
        name: ctx.name.clone(),
        cluster: ctx.context.cluster.clone(),
        user: ctx.context.user.clone(),
        namespace: ctx.context.namespace.clone(),
        server: doc.server_for(ctx).map(str::to_string),
        is_current: doc.current_context == ctx.name,
    }
}
