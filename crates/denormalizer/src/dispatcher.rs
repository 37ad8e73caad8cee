//! Batch dispatcher and acknowledgment tracking.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use change_stream::{ChangeEnvelope, ChangeRecord, ChangeStream, Offset};
use common::EntityId;
use futures_util::StreamExt;
use futures_util::stream;

use crate::{Disposition, HandlerRegistry, Outcome, Projector, Result};

/// Tuning for [`BatchDispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Maximum records pulled per poll.
    pub batch_size: usize,

    /// Maximum aggregates projected in parallel within a batch.
    pub max_concurrency: usize,

    /// Wait after an empty poll or a failed batch.
    pub poll_interval: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_concurrency: 4,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// What happened to one polled batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Records returned by the poll.
    pub polled: usize,

    /// Envelopes applied to the store.
    pub applied: usize,

    /// Records skipped: tombstones, ignored envelopes and structural errors.
    pub skipped: usize,

    /// Envelopes that failed with a retryable error.
    pub failed: usize,

    /// Checkpoint committed for this batch, if any.
    pub committed: Option<Offset>,
}

impl BatchReport {
    /// True when the batch will be redelivered.
    pub fn needs_redelivery(&self) -> bool {
        self.polled > 0 && self.committed.is_none()
    }
}

/// One decoded envelope ready for its projector.
struct Work {
    offset: Offset,
    envelope: ChangeEnvelope,
    projector: Arc<dyn Projector>,
}

/// Pulls batches from a change stream and applies them through the
/// registered projectors.
///
/// Within a batch, envelopes are sorted by event timestamp and grouped by
/// aggregate identity. Groups run concurrently; envelopes inside a group
/// run one after another. The checkpoint advances past the whole batch
/// only when no envelope failed with a retryable error.
pub struct BatchDispatcher<C> {
    stream: C,
    registry: Arc<HandlerRegistry>,
    options: DispatchOptions,
}

impl<C: ChangeStream> BatchDispatcher<C> {
    pub fn new(stream: C, registry: Arc<HandlerRegistry>, options: DispatchOptions) -> Self {
        Self {
            stream,
            registry,
            options,
        }
    }

    /// Returns the underlying stream.
    pub fn stream(&self) -> &C {
        &self.stream
    }

    /// Returns the handler registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Polls one batch, applies it and commits the checkpoint if allowed.
    ///
    /// Only poll and commit failures are returned as errors; envelope
    /// failures are reflected in the report. Lock entries left idle by the
    /// batch are released before returning.
    #[tracing::instrument(skip(self))]
    pub async fn process_batch(&self) -> Result<BatchReport> {
        let result = self.apply_batch().await;
        self.registry.locks().prune();
        result
    }

    async fn apply_batch(&self) -> Result<BatchReport> {
        let records = self.stream.poll(self.options.batch_size).await?;
        let mut report = BatchReport {
            polled: records.len(),
            ..BatchReport::default()
        };
        let Some(last_offset) = records.iter().map(|r| r.offset).max() else {
            return Ok(report);
        };

        let mut work = Vec::with_capacity(records.len());
        for record in records {
            match self.prepare(&record) {
                Ok(Some(item)) => work.push(item),
                Ok(None) => {
                    tracing::debug!(topic = %record.topic, offset = %record.offset, "tombstone skipped");
                    metrics::counter!("denormalizer_envelopes_skipped", "reason" => "tombstone")
                        .increment(1);
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        topic = %record.topic,
                        offset = %record.offset,
                        error = %e,
                        "skipping undeliverable record"
                    );
                    metrics::counter!("denormalizer_envelopes_skipped", "reason" => e.reason())
                        .increment(1);
                    report.skipped += 1;
                }
            }
        }

        // Stable sort keeps stream order for equal timestamps.
        work.sort_by_key(|item| item.envelope.event_timestamp());
        let groups = group_by_aggregate(work);

        let results: Vec<Vec<(Offset, Result<Outcome>)>> = stream::iter(groups)
            .map(|group| async move {
                let mut results = Vec::with_capacity(group.len());
                for item in group {
                    let outcome = item.projector.apply(&item.envelope).await;
                    results.push((item.offset, outcome));
                }
                results
            })
            .buffer_unordered(self.options.max_concurrency.max(1))
            .collect()
            .await;

        for (offset, result) in results.into_iter().flatten() {
            match result {
                Ok(Outcome::Applied) => {
                    metrics::counter!("denormalizer_envelopes_applied").increment(1);
                    report.applied += 1;
                }
                Ok(Outcome::Ignored(reason)) => {
                    metrics::counter!("denormalizer_envelopes_skipped", "reason" => reason)
                        .increment(1);
                    report.skipped += 1;
                }
                Err(e) => match e.disposition() {
                    Disposition::Skip => {
                        tracing::warn!(%offset, error = %e, "skipping envelope");
                        metrics::counter!("denormalizer_envelopes_skipped", "reason" => e.reason())
                            .increment(1);
                        report.skipped += 1;
                    }
                    Disposition::Retry => {
                        tracing::error!(%offset, error = %e, "envelope failed, batch will be redelivered");
                        report.failed += 1;
                    }
                },
            }
        }

        if report.failed > 0 {
            metrics::counter!("denormalizer_batches_redelivered").increment(1);
            tracing::warn!(
                polled = report.polled,
                failed = report.failed,
                "checkpoint withheld"
            );
            return Ok(report);
        }

        self.stream.commit(last_offset).await?;
        metrics::counter!("denormalizer_batches_committed").increment(1);
        report.committed = Some(last_offset);
        tracing::info!(
            polled = report.polled,
            applied = report.applied,
            skipped = report.skipped,
            offset = %last_offset,
            "batch committed"
        );

        Ok(report)
    }

    /// Runs the consumer loop until `shutdown` completes.
    ///
    /// A batch in flight when shutdown is requested is abandoned without
    /// committing, so it is redelivered on the next start.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        tracing::info!(
            batch_size = self.options.batch_size,
            max_concurrency = self.options.max_concurrency,
            "consumer loop started"
        );

        loop {
            let idle = tokio::select! {
                biased;
                () = &mut shutdown => break,
                result = self.process_batch() => match result {
                    Ok(report) => report.polled == 0 || report.needs_redelivery(),
                    Err(e) => {
                        tracing::error!(error = %e, "batch processing failed");
                        true
                    }
                },
            };

            if idle {
                tokio::select! {
                    biased;
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(self.options.poll_interval) => {}
                }
            }
        }

        tracing::info!("consumer loop stopped");
        Ok(())
    }

    fn prepare(&self, record: &ChangeRecord) -> Result<Option<Work>> {
        // Tombstones are skipped as such even on topics nobody handles.
        let Some(envelope) = ChangeEnvelope::decode(&record.topic, &record.message)? else {
            return Ok(None);
        };
        let projector = self.registry.resolve(&record.topic)?;

        Ok(Some(Work {
            offset: record.offset,
            envelope,
            projector,
        }))
    }
}

/// Splits sorted work into per-aggregate groups, keeping order inside
/// each group. Envelopes whose key cannot be derived form their own
/// group so the projector reports the problem.
fn group_by_aggregate(work: Vec<Work>) -> Vec<Vec<Work>> {
    let mut groups: Vec<Vec<Work>> = Vec::new();
    let mut index: HashMap<EntityId, usize> = HashMap::new();

    for item in work {
        match item.projector.aggregate_key(&item.envelope) {
            Ok(key) => {
                let slot = *index.entry(key).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[slot].push(item);
            }
            Err(_) => groups.push(vec![item]),
        }
    }

    groups
}
