/**
 * Document Checkpoints
 *
 * Persists the participant's document snapshot to the session directory as a
 * single-field overwrite. Two triggers exist: a periodic ticker (one minute
 * by default) and one final persist when the participant leaves, bounded by
 * the exit timeout and never retried.
 *
 * Progress is published on a `watch` channel so a UI can show a "saving"
 * indicator.
 */
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::client::directory::SessionDirectory;
use crate::client::error::ClientError;
use crate::shared::{ClientConfig, SessionPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Failed,
}

/// Result of the persist on leave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Persisted,
    TimedOut,
    Failed,
}

pub struct Checkpointer<D> {
    directory: Arc<D>,
    session_id: String,
    period: Duration,
    exit_timeout: Duration,
    status: watch::Sender<SaveStatus>,
    last_saved: Option<Vec<u8>>,
}

impl<D: SessionDirectory> Checkpointer<D> {
    pub fn new(directory: Arc<D>, session_id: impl Into<String>, config: &ClientConfig) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            directory,
            session_id: session_id.into(),
            period: config.checkpoint_interval,
            exit_timeout: config.exit_timeout,
            status,
            last_saved: None,
        }
    }

    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status.subscribe()
    }

    /// Ticker whose first tick fires one full period from now
    pub fn interval(&self) -> Interval {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    /// Whether `blob` differs from the last snapshot this checkpointer saved
    pub fn is_stale(&self, blob: &[u8]) -> bool {
        self.last_saved.as_deref() != Some(blob)
    }

    /// Overwrite the session's stored document with `blob`
    pub async fn persist(&mut self, blob: Vec<u8>) -> Result<(), ClientError> {
        self.status.send_replace(SaveStatus::Saving);
        let patch = SessionPatch::document(blob.clone());

        match self.directory.patch(&self.session_id, &patch).await {
            Ok(_) => {
                tracing::debug!(
                    "[Checkpoint] Saved {} bytes for session {}",
                    blob.len(),
                    self.session_id
                );
                self.last_saved = Some(blob);
                self.status.send_replace(SaveStatus::Saved);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("[Checkpoint] Save failed for session {}: {}", self.session_id, e);
                self.status.send_replace(SaveStatus::Failed);
                Err(e)
            }
        }
    }

    /// Final persist on leave, bounded by the exit timeout
    pub async fn persist_before_exit(&mut self, blob: Vec<u8>) -> ExitOutcome {
        let session_id = self.session_id.clone();
        match tokio::time::timeout(self.exit_timeout, self.persist(blob)).await {
            Ok(Ok(())) => {
                tracing::info!("[Checkpoint] Final snapshot saved for session {}", session_id);
                ExitOutcome::Persisted
            }
            Ok(Err(_)) => ExitOutcome::Failed,
            Err(_) => {
                tracing::warn!(
                    "[Checkpoint] Final save for session {} timed out after {:?}",
                    session_id,
                    self.exit_timeout
                );
                self.status.send_replace(SaveStatus::Failed);
                ExitOutcome::TimedOut
            }
        }
    }
}
