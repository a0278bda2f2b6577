use std::sync::Arc;
use tokio::task::JoinSet;

use crate::remote::{ExecutionError, RemoteExecutor};

/// Runs one command on every host concurrently and waits for all of them.
pub struct FanOutDispatcher<E> {
    executor: Arc<E>,
}

impl<E> Clone for FanOutDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: RemoteExecutor> FanOutDispatcher<E> {
    pub fn new(executor: E) -> Self {
        Self::from_shared(Arc::new(executor))
    }

    pub fn from_shared(executor: Arc<E>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Run `command` once on each of `hosts` and return when every run has
    /// finished, successfully or not.
    pub async fn dispatch(&self, hosts: &[String], command: &str) {
        if hosts.is_empty() {
            tracing::warn!(command, "No puppet servers configured, nothing to dispatch");
            return;
        }

        tracing::info!(command, hosts = hosts.len(), "Dispatching to puppet servers");

        let command: Arc<str> = Arc::from(command);
        let mut jobs = JoinSet::new();
        for host in hosts {
            let executor = Arc::clone(&self.executor);
            let command = Arc::clone(&command);
            let host = host.clone();
            jobs.spawn(async move {
                let result = executor.execute(&host, &command).await;
                (host, result)
            });
        }

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((host, Ok(output))) => {
                    succeeded += 1;
                    tracing::info!(
                        host = %host,
                        command = %command,
                        output = %output.trim(),
                        "Remote command finished"
                    );
                }
                Ok((host, Err(err))) => {
                    failed += 1;
                    log_failure(&host, &command, &err);
                }
                Err(join_err) => {
                    failed += 1;
                    tracing::error!(command = %command, error = %join_err, "Dispatch task did not complete");
                }
            }
        }

        tracing::info!(command = %command, succeeded, failed, "Dispatch finished");
    }
}

fn log_failure(host: &str, command: &str, err: &ExecutionError) {
    tracing::warn!(
        host,
        command,
        error = %err,
        output = %err.output().trim(),
        "Remote command failed"
    );
}
