//! Per-event entry point for the ingestion pipeline.
//!
//! ```text
//! Idle ─► Validating ─► Fetching ─► Streaming ─► Flushing ─► Closing ─► Done
//!              │             │            │            │
//!              └─────────────┴────────────┴────────────┴──► Aborted
//! ```
//!
//! [`Ingestor::handle`] never returns an error: every failure is logged with
//! invocation context and reported as [`Outcome::Aborted`]. The store session
//! created in `Fetching` is closed exactly once, on every path, including a
//! failed connect and the invocation deadline firing.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::application::accumulator::BatchAccumulator;
use crate::application::decoder::RecordStream;
use crate::domain::{
    BlobEvent, EventMatch, IngestConfig, IngestReport, InvocationId, ObjectName, Outcome, Phase,
    Settings, SettingsLookup, SkipReason,
};
use crate::error::{Error, Result};
use crate::port::{DocumentStore, StoreSession, StreamSource};

/// Runs one event through validate → fetch → stream → flush → close.
///
/// Settings are resolved from the lookup at the start of every invocation,
/// so a missing variable fails that invocation only.
pub struct Ingestor {
    source: Arc<dyn StreamSource>,
    store: Arc<dyn DocumentStore>,
    lookup: SettingsLookup,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn StreamSource>,
        store: Arc<dyn DocumentStore>,
        lookup: SettingsLookup,
        config: IngestConfig,
    ) -> Self {
        Self {
            source,
            store,
            lookup,
            config,
        }
    }

    /// Handle one storage event.
    pub async fn handle(&self, event: &BlobEvent) -> Outcome {
        let id = InvocationId::new();
        let span = info_span!(
            "invocation",
            id = %id,
            event_id = event.id.as_deref().unwrap_or(""),
        );
        self.run(event).instrument(span).await
    }

    async fn run(&self, event: &BlobEvent) -> Outcome {
        let mut phase = Phase::Idle;
        enter(&mut phase, Phase::Validating);

        let settings = match Settings::from_lookup(self.lookup.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "Required configuration missing, aborting");
                return abort(phase, e.into());
            }
        };

        let object = match event.match_container(&settings.blob.container) {
            EventMatch::Matched(object) => object,
            EventMatch::WrongType => {
                debug!(event_type = %event.event_type, "Ignoring event type");
                return Outcome::Skipped(SkipReason::WrongEventType);
            }
            EventMatch::WrongContainer => {
                debug!(subject = %event.subject, "Ignoring event for other container");
                return Outcome::Skipped(SkipReason::WrongContainer);
            }
            EventMatch::EmptyName => {
                warn!(subject = %event.subject, "Event subject has no object name, skipping");
                return Outcome::Skipped(SkipReason::EmptyObjectName);
            }
        };

        info!(
            container = %settings.blob.container,
            object = %object,
            "Ingesting blob"
        );

        let deadline = self.config.invocation_timeout();
        let mut session: Option<Arc<dyn StoreSession>> = None;
        let result = tokio::time::timeout(
            deadline,
            self.ingest(&settings, &object, &mut session, &mut phase),
        )
        .await
        .unwrap_or(Err(Error::Timeout(deadline)));

        let failed_in = phase;
        if let Some(session) = session {
            enter(&mut phase, Phase::Closing);
            if let Err(e) = session.close().await {
                warn!(error = %e, "Failed to close store session");
            }
        }

        match result {
            Ok(report) => {
                enter(&mut phase, Phase::Done);
                info!(
                    object = %object,
                    records = report.records_parsed,
                    batches = report.batches_dispatched,
                    written = report.records_written,
                    failed = report.records_failed,
                    "Ingestion finished"
                );
                Outcome::Completed(report)
            }
            Err(e) => {
                error!(
                    object = %object,
                    phase = %failed_in,
                    kind = e.kind(),
                    error = %e,
                    "Ingestion aborted"
                );
                abort(failed_in, e)
            }
        }
    }

    /// Fetching through Flushing. The session is handed back through
    /// `session` before it connects so the caller can close it even when
    /// connecting fails or this future is cancelled.
    async fn ingest(
        &self,
        settings: &Settings,
        object: &ObjectName,
        session: &mut Option<Arc<dyn StoreSession>>,
        phase: &mut Phase,
    ) -> Result<IngestReport> {
        enter(phase, Phase::Fetching);
        let opened = self.store.session(&settings.store);
        *session = Some(Arc::clone(&opened));
        opened.connect().await?;

        let bytes = self
            .source
            .open(&settings.blob, object)
            .await?
            .ok_or_else(|| Error::StreamUnavailable {
                container: settings.blob.container.clone(),
                object: object.to_string(),
            })?;

        enter(phase, Phase::Streaming);
        let mut records = RecordStream::new(bytes);
        let mut batches = BatchAccumulator::new(
            opened,
            self.config.batch_size,
            self.config.max_pending_batches,
        );

        while let Some(item) = records.next_record().await {
            match item {
                Ok(record) => batches.accept(record).await?,
                Err(e) => {
                    match batches.abandon().await {
                        Ok(committed) => warn!(
                            bytes_read = records.bytes_read(),
                            records_written = committed.records_written,
                            "Input stream failed, keeping batches already written"
                        ),
                        Err(drain) => warn!(
                            bytes_read = records.bytes_read(),
                            error = %drain,
                            "Input stream failed and pending flushes could not be drained"
                        ),
                    }
                    return Err(e);
                }
            }
        }

        enter(phase, Phase::Flushing);
        debug!(bytes_read = records.bytes_read(), "End of stream");
        batches.finish().await
    }
}

fn enter(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "Phase transition");
    *phase = next;
}

fn abort(phase: Phase, error: Error) -> Outcome {
    debug!(from = %phase, to = %Phase::Aborted, "Phase transition");
    Outcome::Aborted { phase, error }
}
