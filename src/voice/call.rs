use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::event::{InboundEvent, is_user_transcript};

/// How long the user counts as speaking after their last transcript.
pub const USER_SPEECH_HOLD: Duration = Duration::from_millis(1200);

#[derive(Debug, Error)]
pub enum SdkError {
    /// The platform refused to open audio without a user gesture.
    #[error("start blocked by autoplay policy: {0}")]
    AutoplayBlocked(String),

    #[error("voice transport error: {0}")]
    Transport(String),
}

/// The voice-call SDK surface used by the screen.
pub trait VoiceSdk {
    fn start(&mut self, assistant_id: &str) -> impl Future<Output = Result<(), SdkError>>;
    fn stop(&mut self) -> impl Future<Output = Result<(), SdkError>>;
    fn set_muted(&mut self, muted: bool) -> Result<(), SdkError>;
    fn set_paused(&mut self, paused: bool) -> Result<(), SdkError>;
}

/// What is happening inside a connected call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub assistant_speaking: bool,
    pub user_speaking: bool,
    pub muted: bool,
    pub paused: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CallState {
    #[default]
    Idle,
    Connecting,
    Connected(Activity),
}

impl CallState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Drives the animated voice indicator.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Connected(a) => !a.paused && (a.assistant_speaking || a.user_speaking),
            _ => false,
        }
    }
}

/// Call lifecycle as mirrored from SDK events.
#[derive(Debug, Clone, Default)]
pub struct CallSession {
    state: CallState,
    user_speech_until: Option<Instant>,
}

impl CallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    fn activity_mut(&mut self) -> Option<&mut Activity> {
        match &mut self.state {
            CallState::Connected(a) => Some(a),
            _ => None,
        }
    }

    /// idle -> connecting. Returns false from any other state.
    pub fn begin_connecting(&mut self) -> bool {
        if self.state != CallState::Idle {
            return false;
        }
        self.state = CallState::Connecting;
        true
    }

    pub fn start_failed(&mut self) {
        if self.state == CallState::Connecting {
            self.state = CallState::Idle;
        }
    }

    pub fn call_started(&mut self) {
        if !self.state.is_connected() {
            self.state = CallState::Connected(Activity::default());
        }
    }

    /// Back to idle; mute and pause do not carry over to the next call.
    pub fn call_ended(&mut self) {
        self.state = CallState::Idle;
        self.user_speech_until = None;
    }

    pub fn assistant_speaking(&mut self, speaking: bool) {
        if let Some(a) = self.activity_mut() {
            a.assistant_speaking = speaking;
        }
    }

    pub fn user_transcript(&mut self, now: Instant) {
        if let CallState::Connected(a) = &mut self.state {
            a.user_speaking = true;
            self.user_speech_until = Some(now + USER_SPEECH_HOLD);
        }
    }

    /// Expire the user-speaking flag once the hold has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.user_speech_until.is_some_and(|until| now >= until) {
            self.user_speech_until = None;
            if let Some(a) = self.activity_mut() {
                a.user_speaking = false;
            }
        }
    }

    pub fn set_muted(&mut self, muted: bool) -> bool {
        self.activity_mut().map(|a| a.muted = muted).is_some()
    }

    pub fn set_paused(&mut self, paused: bool) -> bool {
        self.activity_mut().map(|a| a.paused = paused).is_some()
    }

    /// Apply an SDK event. Message events only matter for user transcripts.
    pub fn observe(&mut self, event: &InboundEvent, now: Instant) {
        match event {
            InboundEvent::CallStart => self.call_started(),
            InboundEvent::CallEnd => self.call_ended(),
            InboundEvent::SpeechStart => self.assistant_speaking(true),
            InboundEvent::SpeechEnd => self.assistant_speaking(false),
            InboundEvent::Message(m) if is_user_transcript(m) => self.user_transcript(now),
            InboundEvent::Message(_) | InboundEvent::Error(_) => {}
        }
    }
}

/// Issues SDK commands and keeps the mirrored [`CallSession`] consistent.
pub struct CallController<S> {
    sdk: S,
    session: CallSession,
    assistant_id: Option<String>,
    resume_on_gesture: bool,
}

impl<S: VoiceSdk> CallController<S> {
    pub fn new(sdk: S, assistant_id: Option<String>) -> Self {
        Self {
            sdk,
            session: CallSession::new(),
            assistant_id,
            resume_on_gesture: false,
        }
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn state(&self) -> CallState {
        self.session.state()
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    pub fn waiting_for_gesture(&self) -> bool {
        self.resume_on_gesture
    }

    /// Start on screen mount. If the platform blocks audio autoplay, the
    /// next [`user_gesture`](Self::user_gesture) retries once.
    pub async fn auto_start(&mut self) {
        match self.try_start().await {
            Ok(()) => {}
            Err(SdkError::AutoplayBlocked(reason)) => {
                log::warn!("Auto-start blocked, waiting for user interaction: {}", reason);
                self.resume_on_gesture = true;
            }
            Err(e) => log::error!("Failed to auto-start call: {}", e),
        }
    }

    /// A click or touch on the screen.
    pub async fn user_gesture(&mut self) {
        if !std::mem::take(&mut self.resume_on_gesture) {
            return;
        }
        if let Err(e) = self.try_start().await {
            log::error!("Start after interaction failed: {}", e);
        }
    }

    /// Start a call from the speaker button.
    pub async fn start(&mut self) {
        if let Err(e) = self.try_start().await {
            log::error!("Failed to start call: {}", e);
        }
    }

    async fn try_start(&mut self) -> Result<(), SdkError> {
        let Some(assistant_id) = self.assistant_id.clone() else {
            log::warn!("No voice assistant id configured");
            return Ok(());
        };
        if !self.session.begin_connecting() {
            log::debug!("Start ignored in state {:?}", self.session.state());
            return Ok(());
        }
        self.sdk.start(&assistant_id).await.inspect_err(|_| {
            self.session.start_failed();
        })
    }

    /// Best-effort stop. The session goes idle on the resulting call-end event.
    pub async fn stop(&mut self) {
        if let Err(e) = self.sdk.stop().await {
            log::error!("Failed to stop call: {}", e);
        }
    }

    pub fn toggle_mute(&mut self) {
        let CallState::Connected(activity) = self.session.state() else {
            return;
        };
        match self.sdk.set_muted(!activity.muted) {
            Ok(()) => {
                self.session.set_muted(!activity.muted);
            }
            Err(e) => log::error!("Failed to toggle mute: {}", e),
        }
    }

    pub fn toggle_pause(&mut self) {
        let CallState::Connected(activity) = self.session.state() else {
            return;
        };
        match self.sdk.set_paused(!activity.paused) {
            Ok(()) => {
                self.session.set_paused(!activity.paused);
            }
            Err(e) => log::error!("Failed to toggle pause: {}", e),
        }
    }

    pub fn observe(&mut self, event: &InboundEvent, now: Instant) {
        self.session.observe(event, now);
    }

    pub fn tick(&mut self, now: Instant) {
        self.session.tick(now);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;

    /// Scripted SDK: each start pops the next queued result.
    #[derive(Default)]
    pub(crate) struct FakeSdk {
        pub starts: Vec<String>,
        pub start_results: VecDeque<Result<(), SdkError>>,
        pub stop_fails: bool,
        pub stops: usize,
        pub muted: Option<bool>,
    }

    impl VoiceSdk for FakeSdk {
        async fn start(&mut self, assistant_id: &str) -> Result<(), SdkError> {
            self.starts.push(assistant_id.to_string());
            self.start_results.pop_front().unwrap_or(Ok(()))
        }

        async fn stop(&mut self) -> Result<(), SdkError> {
            self.stops += 1;
            if self.stop_fails {
                return Err(SdkError::Transport("socket closed".into()));
            }
            Ok(())
        }

        fn set_muted(&mut self, muted: bool) -> Result<(), SdkError> {
            self.muted = Some(muted);
            Ok(())
        }

        fn set_paused(&mut self, _paused: bool) -> Result<(), SdkError> {
            Err(SdkError::Transport("not supported".into()))
        }
    }

    fn controller(sdk: FakeSdk) -> CallController<FakeSdk> {
        CallController::new(sdk, Some("asst-1".into()))
    }

    #[test]
    fn session_transitions() {
        let now = Instant::now();
        let mut s = CallSession::new();
        assert!(s.begin_connecting());
        assert!(!s.begin_connecting());
        assert_eq!(s.state(), CallState::Connecting);

        s.observe(&InboundEvent::CallStart, now);
        assert_eq!(s.state(), CallState::Connected(Activity::default()));
        assert!(!s.state().is_active());

        s.observe(&InboundEvent::SpeechStart, now);
        assert!(s.state().is_active());
        assert!(s.set_paused(true));
        assert!(!s.state().is_active());

        s.observe(&InboundEvent::CallEnd, now);
        assert_eq!(s.state(), CallState::Idle);
        assert!(!s.set_muted(true));
    }

    #[test]
    fn speech_events_ignored_when_idle() {
        let mut s = CallSession::new();
        s.observe(&InboundEvent::SpeechStart, Instant::now());
        assert_eq!(s.state(), CallState::Idle);
    }

    #[test]
    fn user_speech_decays() {
        let t0 = Instant::now();
        let mut s = CallSession::new();
        s.call_started();
        s.observe(
            &InboundEvent::Message(json!({"type": "transcript", "role": "user"})),
            t0,
        );
        let CallState::Connected(a) = s.state() else {
            panic!("expected connected");
        };
        assert!(a.user_speaking && !a.assistant_speaking);

        s.tick(t0 + Duration::from_millis(500));
        assert!(s.state().is_active());
        s.tick(t0 + USER_SPEECH_HOLD);
        assert!(!s.state().is_active());
    }

    #[tokio::test]
    async fn start_failure_returns_to_idle() {
        let mut sdk = FakeSdk::default();
        sdk.start_results.push_back(Err(SdkError::Transport("denied".into())));
        let mut c = controller(sdk);

        c.start().await;
        assert_eq!(c.state(), CallState::Idle);
        assert!(!c.waiting_for_gesture());
    }

    #[tokio::test]
    async fn blocked_autostart_retries_once_on_gesture() {
        let mut sdk = FakeSdk::default();
        sdk.start_results
            .push_back(Err(SdkError::AutoplayBlocked("NotAllowedError".into())));
        sdk.start_results
            .push_back(Err(SdkError::AutoplayBlocked("still blocked".into())));
        let mut c = controller(sdk);

        c.auto_start().await;
        assert!(c.waiting_for_gesture());
        assert_eq!(c.state(), CallState::Idle);

        c.user_gesture().await;
        assert!(!c.waiting_for_gesture());
        c.user_gesture().await;
        assert_eq!(c.sdk().starts, vec!["asst-1", "asst-1"]);
    }

    #[tokio::test]
    async fn failed_autostart_is_logged_without_retry() {
        crate::test_log::start();
        let mut sdk = FakeSdk::default();
        sdk.start_results.push_back(Err(SdkError::Transport("mic denied".into())));
        let mut c = controller(sdk);

        c.auto_start().await;
        assert_eq!(c.state(), CallState::Idle);
        assert!(!c.waiting_for_gesture());
        assert_eq!(
            crate::test_log::messages(log::Level::Error),
            vec!["Failed to auto-start call: voice transport error: mic denied"]
        );

        c.user_gesture().await;
        assert_eq!(c.sdk().starts, vec!["asst-1"]);
    }

    #[tokio::test]
    async fn blocked_autostart_is_a_warning() {
        crate::test_log::start();
        let mut sdk = FakeSdk::default();
        sdk.start_results
            .push_back(Err(SdkError::AutoplayBlocked("NotAllowedError".into())));
        let mut c = controller(sdk);

        c.auto_start().await;
        assert!(crate::test_log::messages(log::Level::Error).is_empty());
        assert_eq!(crate::test_log::messages(log::Level::Warn).len(), 1);
    }

    #[tokio::test]
    async fn successful_start_waits_for_call_start_event() {
        let mut c = controller(FakeSdk::default());
        c.start().await;
        assert_eq!(c.state(), CallState::Connecting);
        c.observe(&InboundEvent::CallStart, Instant::now());
        assert!(c.state().is_connected());
    }

    #[tokio::test]
    async fn missing_assistant_skips_start() {
        let mut c = CallController::new(FakeSdk::default(), None);
        c.auto_start().await;
        assert!(c.sdk().starts.is_empty());
        assert_eq!(c.state(), CallState::Idle);
    }

    #[tokio::test]
    async fn stop_swallows_errors_and_stays_connected_until_event() {
        let sdk = FakeSdk {
            stop_fails: true,
            ..Default::default()
        };
        let mut c = controller(sdk);
        c.start().await;
        c.observe(&InboundEvent::CallStart, Instant::now());
        c.stop().await;
        assert_eq!(c.sdk().stops, 1);
        assert!(c.state().is_connected());
    }

    #[tokio::test]
    async fn toggles_only_commit_on_sdk_success() {
        let mut c = controller(FakeSdk::default());
        c.toggle_mute();
        assert_eq!(c.sdk().muted, None);

        c.start().await;
        c.observe(&InboundEvent::CallStart, Instant::now());
        c.toggle_mute();
        c.toggle_pause();
        let CallState::Connected(a) = c.state() else {
            panic!("expected connected");
        };
        assert!(a.muted);
        assert!(!a.paused);
        assert_eq!(c.sdk().muted, Some(true));
    }
}
