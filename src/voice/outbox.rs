use std::collections::VecDeque;
use std::future::Future;

use crate::api::ApiError;

/// Backend operations the voice screen triggers.
pub trait Backend {
    fn delete_mission(&self, id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn delete_routine(&self, id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn complete_mission(&self, id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    DeleteMission(String),
    DeleteRoutine(String),
    CompleteMission(String),
}

impl BackendCall {
    pub async fn perform<B: Backend>(&self, backend: &B) -> Result<(), ApiError> {
        match self {
            Self::DeleteMission(id) => backend.delete_mission(id).await,
            Self::DeleteRoutine(id) => backend.delete_routine(id).await,
            Self::CompleteMission(id) => backend.complete_mission(id).await,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Backend calls queued by local state changes.
///
/// Local state is already updated by the time a call is queued. A failed call
/// is logged and dropped; nothing is rolled back and nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    pending: VecDeque<BackendCall>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, call: BackendCall) {
        log::debug!("Queued backend call: {:?}", call);
        self.pending.push_back(call);
    }

    pub fn pending(&self) -> impl Iterator<Item = &BackendCall> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Detach everything queued so far, e.g. to hand off to a spawned task.
    pub fn take(&mut self) -> Outbox {
        std::mem::take(self)
    }

    /// Perform every queued call in order.
    pub async fn flush<B: Backend>(&mut self, backend: &B) -> FlushReport {
        let mut report = FlushReport::default();
        while let Some(call) = self.pending.pop_front() {
            match call.perform(backend).await {
                Ok(()) => {
                    log::info!("Backend call done: {:?}", call);
                    report.succeeded += 1;
                }
                Err(e) => {
                    log::error!("Backend call {:?} failed: {}", call, e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}
