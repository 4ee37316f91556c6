use std::time::Instant;

use chrono::{DateTime, Utc};

use super::call::{CallController, VoiceSdk};
use super::event::InboundEvent;
use super::outbox::{Backend, FlushReport};
use super::reconciler::{ItemRef, VoiceReconciler};
use crate::config::NeuriConfig;

/// One activation of the voice screen: the call it drives and the items
/// derived from it. Dropped when the screen is torn down.
pub struct VoiceScreen<S> {
    call: CallController<S>,
    reconciler: VoiceReconciler,
}

impl<S: VoiceSdk> VoiceScreen<S> {
    pub fn new(sdk: S, config: &NeuriConfig) -> Self {
        Self {
            call: CallController::new(sdk, config.assistant_id().map(str::to_string)),
            reconciler: VoiceReconciler::from_config(config),
        }
    }

    pub fn call(&self) -> &CallController<S> {
        &self.call
    }

    pub fn call_mut(&mut self) -> &mut CallController<S> {
        &mut self.call
    }

    pub fn reconciler(&self) -> &VoiceReconciler {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut VoiceReconciler {
        &mut self.reconciler
    }

    /// Screen mounted: try to start the call right away.
    pub async fn mount(&mut self) {
        self.call.auto_start().await;
    }

    /// Events are applied in delivery order, one at a time.
    pub fn dispatch(&mut self, event: &InboundEvent, now: DateTime<Utc>, at: Instant) -> Vec<ItemRef> {
        self.call.observe(event, at);
        self.reconciler.handle_event(event, now)
    }

    pub fn focus_lost(&mut self) {
        self.reconciler.on_focus_lost();
    }

    /// Send queued backend calls.
    pub async fn flush<B: Backend>(&mut self, backend: &B) -> FlushReport {
        self.reconciler.outbox_mut().flush(backend).await
    }

    /// Screen unmounted: end the call.
    pub async fn unmount(&mut self) {
        self.call.stop().await;
    }
}
