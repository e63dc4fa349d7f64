use std::sync::Arc;

use futures_util::StreamExt;
use scout_core::{JobId, SessionId};
use scout_logging::{scout_debug, scout_info};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::{ApiError, EngineEvent, JobApi};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Background listener for one job's progress stream.
///
/// Payloads reach the sink one at a time in arrival order. After `close` (or
/// drop) nothing more is emitted for this session.
pub struct ProgressSubscription {
    session: SessionId,
    job_id: JobId,
    cancel: CancellationToken,
}

impl ProgressSubscription {
    pub fn open(
        runtime: &Handle,
        api: Arc<dyn JobApi>,
        session: SessionId,
        job_id: JobId,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let cancel = CancellationToken::new();
        scout_info!("Subscribing to progress of job {} (session {})", job_id, session);
        runtime.spawn(pump(
            api,
            session,
            job_id.clone(),
            sink,
            cancel.clone(),
        ));
        Self {
            session,
            job_id,
            cancel,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Idempotent.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            scout_debug!("Closing progress stream of job {} (session {})", self.job_id, self.session);
            self.cancel.cancel();
        }
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

async fn pump(
    api: Arc<dyn JobApi>,
    session: SessionId,
    job_id: JobId,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = api.open_progress_stream(&job_id) => opened,
    };
    let mut payloads = match opened {
        Ok(payloads) => payloads,
        Err(error) => {
            if !cancel.is_cancelled() {
                sink.emit(EngineEvent::StreamFailed { session, error });
            }
            return;
        }
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = payloads.next() => next,
        };
        if cancel.is_cancelled() {
            return;
        }
        match next {
            Some(Ok(data)) => sink.emit(EngineEvent::StreamPayload { session, data }),
            Some(Err(error)) => {
                sink.emit(EngineEvent::StreamFailed { session, error });
                return;
            }
            None => {
                sink.emit(EngineEvent::StreamFailed {
                    session,
                    error: ApiError::Disconnected,
                });
                return;
            }
        }
    }
}
