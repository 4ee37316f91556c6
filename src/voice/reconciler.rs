use chrono::{DateTime, Utc};
use serde_json::Value;

use super::builder::{BuiltItem, ItemBuilder, ItemKind};
use super::event::{self, InboundEvent};
use super::extract::{self, ExtractScope};
use super::ledger::{self, Ledger};
use super::outbox::{BackendCall, Outbox};
use super::suggestions::{RecentFeed, SuggestionEntry, ToolResponse};
use crate::config::NeuriConfig;
use crate::core::format::DisplayZone;
use crate::core::mission::MissionPayload;
use crate::core::note::NoteItem;
use crate::core::reminder::ReminderItem;
use crate::core::routine::{RoutineItem, RoutinePayload};
use crate::core::task::TaskItem;

/// A record created by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub ui_id: String,
}

/// Screen-scoped state derived from a voice session.
///
/// Built once per screen activation. All four lists are newest-first.
#[derive(Debug, Clone)]
pub struct VoiceReconciler {
    builder: ItemBuilder,
    scope: ExtractScope,
    /// Semantic content already turned into items.
    applied: Ledger,
    /// SDK message ids already mined for payloads.
    messages: Ledger,
    tasks: Vec<TaskItem>,
    notes: Vec<NoteItem>,
    reminders: Vec<ReminderItem>,
    routines: Vec<RoutineItem>,
    suggestions: RecentFeed<SuggestionEntry>,
    tool_responses: RecentFeed<ToolResponse>,
    outbox: Outbox,
}

impl VoiceReconciler {
    pub fn new(
        zone: DisplayZone,
        scope: ExtractScope,
        suggestion_limit: usize,
        tool_response_limit: usize,
    ) -> Self {
        Self {
            builder: ItemBuilder::new(zone),
            scope,
            applied: Ledger::new(),
            messages: Ledger::new(),
            tasks: Vec::new(),
            notes: Vec::new(),
            reminders: Vec::new(),
            routines: Vec::new(),
            suggestions: RecentFeed::new(suggestion_limit),
            tool_responses: RecentFeed::new(tool_response_limit),
            outbox: Outbox::new(),
        }
    }

    pub fn from_config(config: &NeuriConfig) -> Self {
        Self::new(
            config.display_zone(),
            config.extract_scope,
            config.suggestion_limit,
            config.tool_response_limit,
        )
    }

    pub fn tasks(&self) -> &[TaskItem] {
        &self.tasks
    }

    pub fn notes(&self) -> &[NoteItem] {
        &self.notes
    }

    pub fn reminders(&self) -> &[ReminderItem] {
        &self.reminders
    }

    pub fn routines(&self) -> &[RoutineItem] {
        &self.routines
    }

    pub fn suggestions(&self) -> &RecentFeed<SuggestionEntry> {
        &self.suggestions
    }

    pub fn tool_responses(&self) -> &RecentFeed<ToolResponse> {
        &self.tool_responses
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    /// True when no list holds anything (the "start a conversation" state).
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.notes.is_empty()
            && self.reminders.is_empty()
            && self.routines.is_empty()
    }

    pub fn ledgers_empty(&self) -> bool {
        self.applied.is_empty() && self.messages.is_empty()
    }

    /// Apply one SDK event, returning the records it created.
    pub fn handle_event(&mut self, event: &InboundEvent, now: DateTime<Utc>) -> Vec<ItemRef> {
        match event {
            InboundEvent::CallStart => {
                self.on_call_start();
                Vec::new()
            }
            InboundEvent::Message(message) => self.handle_message(message, now),
            InboundEvent::Error(err) => {
                log::error!("Voice SDK error: {}", err);
                Vec::new()
            }
            InboundEvent::CallEnd | InboundEvent::SpeechStart | InboundEvent::SpeechEnd => Vec::new(),
        }
    }

    /// A new call may legitimately redeliver message ids from an earlier one.
    pub fn on_call_start(&mut self) {
        log::debug!("Call started, forgetting {} message ids", self.messages.len());
        self.messages.clear();
    }

    pub fn handle_message(&mut self, message: &Value, now: DateTime<Utc>) -> Vec<ItemRef> {
        if event::is_tool_result(message) {
            self.tool_responses.push(ToolResponse {
                timestamp: self.builder.zone().clock_time(&now),
                kind: event::message_type(message).map(str::to_string),
                data: message.clone(),
            });
        }

        if event::is_transcript(message) {
            return Vec::new();
        }

        let found = extract::extract(message, self.scope);
        if found.is_empty() {
            return Vec::new();
        }

        let message_id = event::message_id(message, now);
        if !self.messages.mark_seen(message_id.as_str()) {
            log::debug!("Message {} already processed", message_id);
            return Vec::new();
        }

        log::debug!(
            "Message {}: {} mission(s), {} routine(s)",
            message_id,
            found.missions.len(),
            found.routines.len()
        );

        let mut created = Vec::new();
        for mission in &found.missions {
            created.extend(self.apply_mission(mission.raw(), now));
        }
        for routine in &found.routines {
            created.extend(self.apply_routine(routine.raw(), now));
        }
        created
    }

    /// Turn a mission-shaped value into a task, note or reminder.
    ///
    /// Returns `None` for payloads without a title and for content already applied.
    pub fn apply_mission(&mut self, raw: &Value, now: DateTime<Utc>) -> Option<ItemRef> {
        let Some(mission) = MissionPayload::new(raw) else {
            log::warn!("Invalid mission data: {}", raw);
            return None;
        };

        let key = ledger::mission_key(&mission);
        if !self.applied.mark_seen(key) {
            log::info!("Duplicate mission detected, skipping: {}", mission.title());
            return None;
        }

        let item = self.builder.build_mission(&mission, now);
        Some(self.insert(item, now))
    }

    pub fn apply_routine(&mut self, raw: &Value, now: DateTime<Utc>) -> Option<ItemRef> {
        let Some(routine) = RoutinePayload::new(raw) else {
            log::warn!("Invalid routine data: {}", raw);
            return None;
        };

        let schedule = routine.schedule();
        let key = ledger::routine_key(&routine, &schedule);
        if !self.applied.mark_seen(key) {
            log::info!("Duplicate routine detected, skipping: {}", routine.title());
            return None;
        }

        let item = BuiltItem::Routine(self.builder.build_routine(&routine, &schedule));
        Some(self.insert(item, now))
    }

    fn insert(&mut self, item: BuiltItem, now: DateTime<Utc>) -> ItemRef {
        let item_ref = ItemRef {
            kind: item.kind(),
            ui_id: item.id().to_string(),
        };
        log::info!("Added {} '{}' ({})", item_ref.kind.as_str(), item.title(), item_ref.ui_id);

        self.suggestions.push(SuggestionEntry {
            ui_id: item_ref.ui_id.clone(),
            backend_id: item.backend_id().map(str::to_string),
            title: item.title().to_string(),
            kind: item_ref.kind,
            created_at: now,
        });

        match item {
            BuiltItem::Task(t) => self.tasks.insert(0, t),
            BuiltItem::Note(n) => self.notes.insert(0, n),
            BuiltItem::Reminder(r) => self.reminders.insert(0, r),
            BuiltItem::Routine(r) => self.routines.insert(0, r),
        }
        item_ref
    }

    fn remove_item(&mut self, kind: ItemKind, ui_id: &str) {
        match kind {
            ItemKind::Task => self.tasks.retain(|t| t.id != ui_id),
            ItemKind::Note => self.notes.retain(|n| n.id != ui_id),
            ItemKind::Reminder => self.reminders.retain(|r| r.id != ui_id),
            ItemKind::Routine => self.routines.retain(|r| r.id != ui_id),
        }
    }

    /// Undo a suggestion: drop it from the feed and its list, and queue a
    /// backend delete when the record exists remotely.
    pub fn remove_suggestion(&mut self, ui_id: &str) -> bool {
        let Some(entry) = self.suggestions.remove_where(|s| s.ui_id == ui_id) else {
            log::debug!("No suggestion {}", ui_id);
            return false;
        };

        self.remove_item(entry.kind, &entry.ui_id);

        if let Some(backend_id) = entry.backend_id {
            let call = match entry.kind {
                ItemKind::Routine => BackendCall::DeleteRoutine(backend_id),
                _ => BackendCall::DeleteMission(backend_id),
            };
            self.outbox.push(call);
        }
        true
    }

    /// UI-only on/off switch for tasks, reminders and routines.
    pub fn set_enabled(&mut self, ui_id: &str, enabled: bool) -> bool {
        if let Some(t) = self.tasks.iter_mut().find(|t| t.id == ui_id) {
            t.enabled = enabled;
        } else if let Some(r) = self.reminders.iter_mut().find(|r| r.id == ui_id) {
            r.enabled = enabled;
        } else if let Some(r) = self.routines.iter_mut().find(|r| r.id == ui_id) {
            r.enabled = enabled;
        } else {
            return false;
        }
        log::debug!("{} {}", ui_id, if enabled { "enabled" } else { "disabled" });
        true
    }

    /// Mark a task done. Tasks known to the backend also get a complete call.
    pub fn complete_task(&mut self, ui_id: &str) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == ui_id) else {
            return false;
        };
        if task.completed {
            return false;
        }
        task.completed = true;
        if let Some(backend_id) = task.backend_id.clone() {
            self.outbox.push(BackendCall::CompleteMission(backend_id));
        }
        true
    }

    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> bool {
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .is_some_and(|t| t.toggle_subtask(subtask_id))
    }

    /// Forget everything derived from the voice session. Queued backend calls
    /// and the id counter survive.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.notes.clear();
        self.reminders.clear();
        self.routines.clear();
        self.suggestions.clear();
        self.tool_responses.clear();
        self.applied.clear();
        self.messages.clear();
    }

    /// The screen lost navigation focus.
    pub fn on_focus_lost(&mut self) {
        log::info!("Voice screen lost focus, clearing session state");
        self.clear();
    }
}
