use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One extracted weekly schedule. Built fresh per request, never cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub current_week: u32,
    pub selected_item: String,
    pub days: Vec<DayRow>,
}

/// Row of the schedule grid. The header row appears at most once, always
/// first; every other row is one time slot across all day columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(untagged)]
pub enum DayRow {
    Header(HeaderRow),
    Lessons(LessonRow),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct HeaderRow {
    pub date: String,
    pub lessons: Vec<DayHeading>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DayHeading {
    pub weekday: String,
    pub date: String,
}

/// Slot 0 is the time label; slots 1..=dayCount are lessons, `None` where the
/// grid has no lesson at that coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct LessonRow {
    pub lessons: Vec<Option<SlotCell>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(untagged)]
pub enum SlotCell {
    Time(TimeCell),
    Lesson(Lesson),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TimeCell {
    pub time: String,
}

/// Group view carries the instructor, staff view carries the groups. A cell
/// can never hold both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(untagged)]
pub enum Lesson {
    Group(GroupLesson),
    Staff(StaffLesson),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GroupLesson {
    pub subject: String,
    pub place: String,
    pub teacher: LinkedName,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StaffLesson {
    pub subject: String,
    pub place: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<LinkedName>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct LinkedName {
    pub name: String,
    pub link: Option<String>,
}
