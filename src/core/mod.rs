pub mod format;
pub mod mission;
pub mod note;
pub mod reminder;
pub mod routine;
pub mod task;

pub use format::DisplayZone;
pub use mission::{MissionPayload, MissionType};
pub use note::NoteItem;
pub use reminder::ReminderItem;
pub use routine::{RoutineItem, RoutinePayload, ScheduleEntry};
pub use task::{Subtask, TaskItem};
