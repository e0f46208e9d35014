use utoipa::OpenApi;

use crate::directory::{DirectoryMatch, MatchKind};
use crate::models::{
    DayHeading, DayRow, GroupLesson, HeaderRow, Lesson, LessonRow, LinkedName, Schedule, SlotCell,
    StaffLesson, TimeCell,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::get_group_schedule,
        crate::handlers::get_teacher_schedule,
        crate::handlers::search_directory
    ),
    components(schemas(
        Schedule,
        DayRow,
        HeaderRow,
        DayHeading,
        LessonRow,
        SlotCell,
        TimeCell,
        Lesson,
        GroupLesson,
        StaffLesson,
        LinkedName,
        DirectoryMatch,
        MatchKind
    )),
    tags(
        (name = "schedule", description = "SSAU timetable operations")
    )
)]
pub struct ApiDoc;
