//! Reconciles voice-assistant SDK events into the voice screen's task, note,
//! reminder and routine lists.

pub mod builder;
pub mod call;
pub mod event;
pub mod extract;
pub mod ledger;
pub mod outbox;
pub mod reconciler;
pub mod screen;
pub mod suggestions;

pub use builder::ItemKind;
pub use call::{CallController, CallState, SdkError, VoiceSdk};
pub use event::InboundEvent;
pub use outbox::{Backend, BackendCall, Outbox};
pub use reconciler::{ItemRef, VoiceReconciler};
pub use screen::VoiceScreen;
