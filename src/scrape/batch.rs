//! Bounded worker pool scraping many identifiers against one browser.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::models::IdentifierTarget;
use crate::session::SessionFactory;
use crate::storage::ReviewSink;

use super::error::FailureKind;
use super::pipeline::{IdentifierOutcome, IdentifierPipeline};

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    TargetStarted {
        worker_id: usize,
        id: String,
    },
    /// Scraped and written to `path`.
    TargetCompleted {
        worker_id: usize,
        id: String,
        records: usize,
        attempts: u32,
        path: PathBuf,
    },
    /// Retries exhausted.
    TargetFailed {
        worker_id: usize,
        id: String,
        kind: FailureKind,
        attempts: u32,
        error: String,
    },
    /// Scraped, but the output file could not be written.
    WriteFailed {
        worker_id: usize,
        id: String,
        error: String,
    },
}

/// One identifier that did not produce an output file.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFailure {
    pub id: String,
    pub kind: Option<FailureKind>,
    pub error: String,
}

/// Totals for a finished batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub completed: usize,
    pub records: usize,
    pub written: Vec<PathBuf>,
    pub failures: Vec<TargetFailure>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    fn merge(&mut self, other: BatchSummary) {
        self.completed += other.completed;
        self.records += other.records;
        self.written.extend(other.written);
        self.failures.extend(other.failures);
    }
}

/// Send a progress event without waiting on the consumer.
fn emit(event_tx: &mpsc::Sender<BatchEvent>, event: BatchEvent) {
    match event_tx.try_send(event) {
        Ok(()) | Err(TrySendError::Closed(_)) => {}
        Err(TrySendError::Full(event)) => {
            tracing::debug!("Event channel full, dropping {:?}", event);
        }
    }
}

/// Runs identifier pipelines on a fixed number of workers.
pub struct BatchRunner<F: SessionFactory> {
    pipeline: IdentifierPipeline<F>,
    sink: Arc<ReviewSink>,
    workers: usize,
}

impl<F: SessionFactory> BatchRunner<F> {
    /// `workers == 0` runs one worker per target.
    pub fn new(pipeline: IdentifierPipeline<F>, sink: ReviewSink, workers: usize) -> Self {
        Self {
            pipeline,
            sink: Arc::new(sink),
            workers,
        }
    }

    fn worker_count(&self, targets: usize) -> usize {
        if self.workers == 0 {
            targets
        } else {
            self.workers.min(targets)
        }
    }

    /// Scrape every target, then shut the browser down.
    ///
    /// A failing identifier never affects the others. Events are dropped
    /// rather than awaited when `event_tx` is full; the returned summary is
    /// always complete.
    pub async fn run(
        &self,
        targets: Vec<IdentifierTarget>,
        event_tx: mpsc::Sender<BatchEvent>,
    ) -> BatchSummary {
        let workers = self.worker_count(targets.len());
        tracing::info!("Scraping {} targets with {} workers", targets.len(), workers);

        let (target_tx, target_rx) = mpsc::channel::<IdentifierTarget>(targets.len().max(1));
        for target in targets {
            // Capacity covers every target, so this never waits
            if target_tx.send(target).await.is_err() {
                break;
            }
        }
        drop(target_tx);

        let target_rx = Arc::new(tokio::sync::Mutex::new(target_rx));
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let target_rx = target_rx.clone();
            let pipeline = self.pipeline.clone();
            let sink = self.sink.clone();
            let event_tx = event_tx.clone();

            let handle = tokio::spawn(async move {
                let mut summary = BatchSummary::default();

                loop {
                    let target = {
                        let mut rx = target_rx.lock().await;
                        rx.recv().await
                    };
                    let target = match target {
                        Some(t) => t,
                        None => break,
                    };

                    emit(
                        &event_tx,
                        BatchEvent::TargetStarted {
                            worker_id,
                            id: target.id.clone(),
                        },
                    );

                    let event = match pipeline.run(&target).await {
                        IdentifierOutcome::Completed { records, attempts } => {
                            match sink.write(&target.id, &records) {
                                Ok(path) => {
                                    summary.completed += 1;
                                    summary.records += records.len();
                                    summary.written.push(path.clone());
                                    BatchEvent::TargetCompleted {
                                        worker_id,
                                        id: target.id,
                                        records: records.len(),
                                        attempts,
                                        path,
                                    }
                                }
                                Err(e) => {
                                    tracing::error!("{}: {}", target.id, e);
                                    summary.failures.push(TargetFailure {
                                        id: target.id.clone(),
                                        kind: None,
                                        error: e.to_string(),
                                    });
                                    BatchEvent::WriteFailed {
                                        worker_id,
                                        id: target.id,
                                        error: e.to_string(),
                                    }
                                }
                            }
                        }
                        IdentifierOutcome::Failed {
                            kind,
                            attempts,
                            error,
                        } => {
                            summary.failures.push(TargetFailure {
                                id: target.id.clone(),
                                kind: Some(kind),
                                error: error.clone(),
                            });
                            BatchEvent::TargetFailed {
                                worker_id,
                                id: target.id,
                                kind,
                                attempts,
                                error,
                            }
                        }
                    };

                    emit(&event_tx, event);
                }

                summary
            });

            handles.push(handle);
        }
        drop(event_tx);

        let mut summary = BatchSummary::default();
        for handle in handles {
            match handle.await {
                Ok(worker_summary) => summary.merge(worker_summary),
                Err(e) => tracing::error!("Scrape worker failed: {}", e),
            }
        }

        self.pipeline.factory().shutdown().await;

        tracing::info!(
            "Batch finished: {} completed, {} failed, {} reviews",
            summary.completed,
            summary.failed(),
            summary.records
        );
        summary
    }
}
