//! Webhook handling
//!
//! [`HookController`] is what the HTTP layer calls for every push. It
//! decodes the payload, classifies the repository and runs one fan-out per
//! trigger, in order. Failures are logged and never reach the caller: a
//! webhook sender only ever learns that its delivery was received.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

use crate::classify::{Classification, RepositoryClassifier};
use crate::config::Settings;
use crate::deploy::R10kPaths;
use crate::git::{BareRepoStore, BlobReader};
use crate::parallel::FanOutDispatcher;
use crate::remote::{RemoteExecutor, SshExecutor};

pub mod payload;

pub use payload::{PayloadError, WebhookPayload};

/// Deploy targets the controller hands to every fan-out.
#[derive(Debug, Clone)]
pub struct DeployTargets {
    pub hosts: Vec<String>,
    pub r10k: R10kPaths,
}

impl From<&Settings> for DeployTargets {
    fn from(settings: &Settings) -> Self {
        Self {
            hosts: settings.hook.puppetservers.clone(),
            r10k: R10kPaths::from(&settings.hook),
        }
    }
}

/// One async mutex per repository name.
///
/// An entry lives only while some request holds or waits for its lock, so
/// the map stays bounded by the number of in-flight repositories.
#[derive(Default)]
struct RepoLocks {
    locks: Mutex<HashMap<String, RepoLockEntry>>,
}

struct RepoLockEntry {
    lock: Arc<tokio::sync::Mutex<()>>,
    users: usize,
}

impl RepoLocks {
    async fn acquire(&self, repo_full_name: &str) -> RepoLockGuard<'_> {
        let lease = self.lease(repo_full_name);
        let guard = Arc::clone(&lease.lock).lock_owned().await;
        RepoLockGuard { _guard: guard, _lease: lease }
    }

    fn lease(&self, repo_full_name: &str) -> RepoLease<'_> {
        let mut locks = self.map();
        let entry = locks
            .entry(repo_full_name.to_string())
            .or_insert_with(|| RepoLockEntry {
                lock: Arc::default(),
                users: 0,
            });
        entry.users += 1;
        RepoLease {
            locks: self,
            repository: repo_full_name.to_string(),
            lock: Arc::clone(&entry.lock),
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, RepoLockEntry>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map().len()
    }
}

/// Registration of one holder or waiter. Dropping the last one removes the entry.
struct RepoLease<'a> {
    locks: &'a RepoLocks,
    repository: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for RepoLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.map();
        if let Some(entry) = locks.get_mut(&self.repository) {
            entry.users -= 1;
            if entry.users == 0 {
                locks.remove(&self.repository);
            }
        }
    }
}

/// Held for the whole deploy of one push. The mutex is released before the lease.
struct RepoLockGuard<'a> {
    _guard: OwnedMutexGuard<()>,
    _lease: RepoLease<'a>,
}

pub struct HookController<E, B> {
    targets: DeployTargets,
    classifier: Arc<RepositoryClassifier<B>>,
    dispatcher: FanOutDispatcher<E>,
    locks: Option<RepoLocks>,
}

impl<E: RemoteExecutor, B: BlobReader> HookController<E, B> {
    pub fn new(targets: DeployTargets, classifier: RepositoryClassifier<B>, dispatcher: FanOutDispatcher<E>) -> Self {
        Self {
            targets,
            classifier: Arc::new(classifier),
            dispatcher,
            locks: Some(RepoLocks::default()),
        }
    }

    /// Let pushes of the same repository deploy concurrently.
    pub fn without_repository_locks(mut self) -> Self {
        self.locks = None;
        self
    }

    pub fn targets(&self) -> &DeployTargets {
        &self.targets
    }

    pub fn dispatcher(&self) -> &FanOutDispatcher<E> {
        &self.dispatcher
    }

    /// Handle a raw webhook body. Malformed payloads are logged and dropped.
    pub async fn handle_hook(&self, body: &[u8]) {
        tracing::debug!(bytes = body.len(), "Start processing hook");

        match WebhookPayload::from_slice(body) {
            Ok(payload) => self.handle_payload(&payload).await,
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed webhook payload"),
        }
    }

    /// Classify the pushed repository and deploy every trigger in turn.
    pub async fn handle_payload(&self, payload: &WebhookPayload) {
        let repository = payload.full_name();

        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(repository).await),
            None => None,
        };

        let classification = match self.classify(repository).await {
            Ok(classification) => classification,
            Err(e) => {
                tracing::error!(repository, error = %format!("{e:#}"), "Classification failed");
                return;
            }
        };

        if classification.is_empty() {
            tracing::info!(repository, "Nothing to deploy");
            return;
        }

        for trigger in &classification.triggers {
            let command = trigger.command(&self.targets.r10k);
            tracing::info!(
                repository,
                category = %trigger.category(),
                target = trigger.target().unwrap_or("-"),
                "Deploying"
            );
            self.dispatcher.dispatch(&self.targets.hosts, &command).await;
        }
    }

    /// Classification reads git objects, so it runs on the blocking pool.
    pub async fn classify(&self, repository: &str) -> Result<Classification> {
        let classifier = Arc::clone(&self.classifier);
        let repository = repository.to_string();
        tokio::task::spawn_blocking(move || classifier.classify(&repository))
            .await
            .context("Classification task panicked")
    }
}

/// Controller that reads the bare mirrors under `hook.githome` and deploys over ssh.
pub type SshHookController = HookController<SshExecutor, BareRepoStore>;

impl SshHookController {
    pub fn from_settings(settings: &Settings) -> Self {
        let controller = HookController::new(
            DeployTargets::from(settings),
            RepositoryClassifier::new(BareRepoStore::new(&settings.hook.githome)),
            FanOutDispatcher::new(SshExecutor::new(&settings.ssh)),
        );
        if settings.hook.serialize_per_repository {
            controller
        } else {
            controller.without_repository_locks()
        }
    }
}
