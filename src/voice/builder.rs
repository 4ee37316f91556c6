use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::core::format::{DisplayZone, NO_DEADLINE};
use crate::core::mission::{MissionPayload, MissionType, display_value};
use crate::core::note::{NoteItem, body_lines};
use crate::core::reminder::ReminderItem;
use crate::core::routine::{RoutineItem, RoutinePayload, ScheduleEntry};
use crate::core::task::TaskItem;

/// First id handed out by a fresh builder.
pub const FIRST_ITEM_ID: u64 = 1000;

/// Which list a view-model record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Note,
    Reminder,
    Routine,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
            Self::Reminder => "reminder",
            Self::Routine => "routine",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltItem {
    Task(TaskItem),
    Note(NoteItem),
    Reminder(ReminderItem),
    Routine(RoutineItem),
}

impl BuiltItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Task(_) => ItemKind::Task,
            Self::Note(_) => ItemKind::Note,
            Self::Reminder(_) => ItemKind::Reminder,
            Self::Routine(_) => ItemKind::Routine,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Task(t) => &t.id,
            Self::Note(n) => &n.id,
            Self::Reminder(r) => &r.id,
            Self::Routine(r) => &r.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Task(t) => &t.title,
            Self::Note(n) => &n.title,
            Self::Reminder(r) => &r.title,
            Self::Routine(r) => &r.title,
        }
    }

    pub fn backend_id(&self) -> Option<&str> {
        match self {
            Self::Task(t) => t.backend_id.as_deref(),
            Self::Note(n) => n.backend_id.as_deref(),
            Self::Reminder(r) => r.backend_id.as_deref(),
            Self::Routine(r) => r.backend_id.as_deref(),
        }
    }
}

/// Turns classified payloads into display-ready records.
///
/// Ids are `<kind>-<counter>`; the counter only ever grows for the lifetime of
/// the builder.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    next_id: u64,
    zone: DisplayZone,
}

impl ItemBuilder {
    pub fn new(zone: DisplayZone) -> Self {
        Self {
            next_id: FIRST_ITEM_ID,
            zone,
        }
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    fn next_id(&mut self, kind: ItemKind) -> String {
        let id = format!("{}-{}", kind.as_str(), self.next_id);
        self.next_id += 1;
        id
    }

    fn deadline(&self, mission: &MissionPayload<'_>) -> Option<DateTime<FixedOffset>> {
        let raw = mission.deadline_value()?;
        let parsed = self.zone.deadline(raw);
        if parsed.is_none() {
            log::warn!("Unreadable deadline '{}' on '{}'", display_value(raw), mission.title());
        }
        parsed
    }

    pub fn build_mission(&mut self, mission: &MissionPayload<'_>, now: DateTime<Utc>) -> BuiltItem {
        let title = mission.title();
        let backend_id = mission.backend_id();

        match mission.mission_type() {
            MissionType::Note => BuiltItem::Note(NoteItem {
                id: self.next_id(ItemKind::Note),
                title,
                body: mission.body().map(|b| body_lines(&b)).unwrap_or_default(),
                backend_id,
            }),
            MissionType::Reminder => {
                let when = self.deadline(mission).unwrap_or_else(|| now.fixed_offset());
                BuiltItem::Reminder(ReminderItem {
                    id: self.next_id(ItemKind::Reminder),
                    title,
                    time: self.zone.short_time(&when),
                    date: self.zone.long_date(&when),
                    enabled: true,
                    backend_id,
                })
            }
            MissionType::Task | MissionType::Project => {
                let date = self
                    .deadline(mission)
                    .map(|d| self.zone.long_date(&d))
                    .unwrap_or_else(|| NO_DEADLINE.to_string());
                let mut task = TaskItem::new(self.next_id(ItemKind::Task), title, date);
                task.backend_id = backend_id;
                BuiltItem::Task(task)
            }
        }
    }

    /// `schedule` is the routine's already-parsed schedule.
    pub fn build_routine(
        &mut self,
        routine: &RoutinePayload<'_>,
        schedule: &[ScheduleEntry],
    ) -> RoutineItem {
        RoutineItem::from_schedule(
            self.next_id(ItemKind::Routine),
            routine.title(),
            schedule,
            routine.backend_id(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::routine::CUSTOM_SCHEDULE;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn builder() -> ItemBuilder {
        ItemBuilder::new(DisplayZone::Fixed(FixedOffset::east_opt(0).unwrap()))
    }

    fn build_routine(b: &mut ItemBuilder, v: &Value) -> RoutineItem {
        let routine = RoutinePayload::new(v).unwrap();
        b.build_routine(&routine, &routine.schedule())
    }

    fn build(b: &mut ItemBuilder, v: &Value) -> BuiltItem {
        b.build_mission(&MissionPayload::new(v).unwrap(), Utc::now())
    }

    #[test]
    fn task_without_deadline() {
        let mut b = builder();
        match build(&mut b, &json!({"title": "Buy milk", "type": "task"})) {
            BuiltItem::Task(t) => {
                assert_eq!(t.id, "task-1000");
                assert_eq!(t.date, NO_DEADLINE);
                assert!(t.subtasks.is_empty());
                assert!(t.enabled && !t.completed);
            }
            other => panic!("expected task, got {:?}", other),
        }
    }

    #[test]
    fn project_builds_task_with_date() {
        let mut b = builder();
        let item = build(
            &mut b,
            &json!({"title": "Move", "type": "project", "true_deadline": "2025-11-01T00:00:00Z", "id": "m-9"}),
        );
        let BuiltItem::Task(t) = item else {
            panic!("expected task");
        };
        assert_eq!(t.date, "Saturday, November 1");
        assert_eq!(t.backend_id.as_deref(), Some("m-9"));
    }

    #[test]
    fn unreadable_deadline_is_no_deadline() {
        let mut b = builder();
        let BuiltItem::Task(t) = build(&mut b, &json!({"title": "x", "personal_deadline": "soonish"}))
        else {
            panic!("expected task");
        };
        assert_eq!(t.date, NO_DEADLINE);
    }

    #[test]
    fn note_body_split() {
        let mut b = builder();
        let BuiltItem::Note(n) =
            build(&mut b, &json!({"title": "Ideas", "type": "note", "body": "Line 1\n\nLine 2"}))
        else {
            panic!("expected note");
        };
        assert_eq!(n.id, "note-1000");
        assert_eq!(n.title, "Ideas");
        assert_eq!(n.body, vec!["Line 1", "Line 2"]);
    }

    #[test]
    fn reminder_defaults_to_now() {
        let mut b = builder();
        let now = Utc.with_ymd_and_hms(2026, 2, 3, 14, 7, 0).unwrap();
        let item = b.build_mission(
            &MissionPayload::new(&json!({"title": "Meds", "type": "reminder"})).unwrap(),
            now,
        );
        let BuiltItem::Reminder(r) = item else {
            panic!("expected reminder");
        };
        assert_eq!(r.time, "2:07 PM");
        assert_eq!(r.date, "Tuesday, February 3");
        assert!(r.enabled);
    }

    #[test]
    fn reminder_uses_deadline() {
        let mut b = builder();
        let BuiltItem::Reminder(r) = build(
            &mut b,
            &json!({"title": "Call", "type": "reminder", "personal_deadline": "2025-11-01T09:05:00Z"}),
        ) else {
            panic!("expected reminder");
        };
        assert_eq!(r.time, "9:05 AM");
        assert_eq!(r.date, "Saturday, November 1");
    }

    #[test]
    fn epoch_millis_deadline() {
        let mut b = builder();
        let BuiltItem::Task(t) = build(
            &mut b,
            &json!({"title": "Renew lease", "type": "task", "true_deadline": 1_761_955_200_000_i64}),
        ) else {
            panic!("expected task");
        };
        assert_eq!(t.date, "Saturday, November 1");
    }

    #[test]
    fn routine_with_broken_schedule() {
        let mut b = builder();
        let raw = json!({"title": "Gym", "schedule": "{not valid json"});
        let r = build_routine(&mut b, &raw);
        assert_eq!(r.frequency, CUSTOM_SCHEDULE);
        assert_eq!(r.time, "");
    }

    #[test]
    fn ids_are_monotonic_across_kinds() {
        let mut b = builder();
        let a = build(&mut b, &json!({"title": "a", "type": "task"}));
        let n = build(&mut b, &json!({"title": "b", "type": "note"}));
        let raw = json!({"title": "c", "frequency": "daily"});
        let r = build_routine(&mut b, &raw);
        assert_eq!(a.id(), "task-1000");
        assert_eq!(n.id(), "note-1001");
        assert_eq!(r.id, "routine-1002");
    }
}
