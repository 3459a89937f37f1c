//! Background precompute: rankings run off the request path to warm the
//! assessment cache.
//!
//! A bounded queue feeds one worker loop, which runs up to
//! `precompute_workers` rankings at once with `force_refresh` set. Results are
//! discarded; only the cache side effect matters. A job that is still waiting
//! in the queue is not queued twice.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex, PoisonError},
};

use hirerank_core::{narrative::NarrativeGenerator, profile::JobId};
use tokio::{
  sync::mpsc::{self, error::TrySendError},
  task::{JoinHandle, JoinSet},
};

use crate::{Backend, Engine, EngineConfig, Error, Result};

/// Handle to the precompute worker.
pub struct Precompute {
  sender: Mutex<Option<mpsc::Sender<JobId>>>,
  queued: Arc<Mutex<HashSet<JobId>>>,
  worker: Mutex<Option<JoinHandle<()>>>,
}

impl Precompute {
  /// Start the worker loop on the current runtime.
  pub fn spawn<S, N>(engine: Engine<S, N>, config: &EngineConfig) -> Self
  where
    S: Backend,
    N: NarrativeGenerator + 'static,
  {
    let (sender, receiver) = mpsc::channel(config.precompute_queue_capacity.max(1));
    let queued = Arc::new(Mutex::new(HashSet::new()));
    let worker = tokio::spawn(run(
      engine,
      receiver,
      Arc::clone(&queued),
      config.precompute_workers.max(1),
    ));

    Self {
      sender: Mutex::new(Some(sender)),
      queued,
      worker: Mutex::new(Some(worker)),
    }
  }

  /// Enqueue a forced re-ranking of `job_id` and return immediately.
  ///
  /// Fails with [`Error::AlreadyQueued`] if the job is waiting to start,
  /// [`Error::QueueFull`] if the queue is at capacity, and [`Error::Closed`]
  /// after [`shutdown`](Self::shutdown).
  pub fn schedule_precompute(&self, job_id: JobId) -> Result<()> {
    let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(sender) = sender.as_ref() else {
      return Err(Error::Closed);
    };

    let mut queued = self.queued.lock().unwrap_or_else(PoisonError::into_inner);
    if queued.contains(&job_id) {
      return Err(Error::AlreadyQueued(job_id));
    }

    match sender.try_send(job_id.clone()) {
      Ok(()) => {
        tracing::debug!(job_id = %job_id, "precompute scheduled");
        queued.insert(job_id);
        Ok(())
      }
      Err(TrySendError::Full(_)) => Err(Error::QueueFull),
      Err(TrySendError::Closed(_)) => Err(Error::Closed),
    }
  }

  /// Number of jobs waiting to start.
  pub fn pending(&self) -> usize {
    self.queued.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  /// Stop accepting work, let queued jobs run, and wait for them to finish.
  pub async fn shutdown(&self) {
    drop(self.sender.lock().unwrap_or_else(PoisonError::into_inner).take());
    let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(worker) = worker {
      if let Err(e) = worker.await {
        tracing::error!(error = %e, "precompute worker terminated abnormally");
      }
    }
    tracing::info!("precompute stopped");
  }
}

async fn run<S, N>(
  engine: Engine<S, N>,
  mut receiver: mpsc::Receiver<JobId>,
  queued: Arc<Mutex<HashSet<JobId>>>,
  workers: usize,
) where
  S: Backend,
  N: NarrativeGenerator + 'static,
{
  let mut running = JoinSet::new();

  loop {
    tokio::select! {
      Some(joined) = running.join_next(), if !running.is_empty() => {
        if let Err(e) = joined {
          tracing::error!(error = %e, "precompute task panicked");
        }
      }
      next = receiver.recv(), if running.len() < workers => {
        let Some(job_id) = next else { break };
        queued.lock().unwrap_or_else(PoisonError::into_inner).remove(&job_id);

        let engine = engine.clone();
        running.spawn(async move {
          match engine.rank(&job_id, true).await {
            Ok(result) => tracing::info!(
              job_id = %job_id,
              ranked = result.total_candidates,
              skipped = result.skipped.len(),
              "precompute finished"
            ),
            Err(e) => tracing::warn!(job_id = %job_id, error = %e, "precompute failed"),
          }
        });
      }
    }
  }

  while let Some(joined) = running.join_next().await {
    if let Err(e) = joined {
      tracing::error!(error = %e, "precompute task panicked");
    }
  }
}
