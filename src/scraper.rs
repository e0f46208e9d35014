use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::models::{
    DayHeading, DayRow, GroupLesson, HeaderRow, Lesson, LessonRow, LinkedName, Schedule, SlotCell,
    StaffLesson, TimeCell,
};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Which timetable variant the upstream page renders. The staff page embeds
/// group links in each cell, the group page embeds the instructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTarget {
    Group,
    Staff,
}

impl ScheduleTarget {
    fn id_param(self) -> &'static str {
        match self {
            ScheduleTarget::Group => "groupId",
            ScheduleTarget::Staff => "staffId",
        }
    }

    pub fn for_teacher(self) -> bool {
        matches!(self, ScheduleTarget::Staff)
    }
}

#[derive(Clone)]
pub struct ScheduleScraper {
    client: reqwest::Client,
    base_url: Arc<Url>,
    week_regex: Regex,
}

impl ScheduleScraper {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
            .timeout(timeout)
            .build()
            .expect("client builds");
        Self {
            client,
            base_url: Arc::new(base_url),
            week_regex: Regex::new(r"\d+").expect("regex compiles"),
        }
    }

    /// Builds the upstream query URL. The id is passed through verbatim;
    /// an empty week behaves like an absent one and the upstream falls back
    /// to the current week.
    pub fn schedule_url(&self, target: ScheduleTarget, id: &str, week: Option<&str>) -> Url {
        let mut params = vec![(target.id_param(), id)];
        if let Some(week) = week.filter(|week| !week.is_empty()) {
            params.push(("selectedWeek", week));
        }
        Url::parse_with_params(self.base_url.as_str(), &params).unwrap()
    }

    async fn fetch_html(&self, url: &Url) -> Result<String, ScrapeError> {
        let response = self.client.get(url.as_str()).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(body)
    }

    pub async fn fetch_schedule(
        &self,
        target: ScheduleTarget,
        id: &str,
        week: Option<&str>,
    ) -> Result<Schedule, ScrapeError> {
        let url = self.schedule_url(target, id, week);
        let html = self.fetch_html(&url).await?;
        Ok(self.extract_schedule(&html, target.for_teacher()))
    }

    /// Reconstructs the schedule grid from the upstream markup. Best-effort:
    /// every expected node that is missing degrades to an empty string or a
    /// null slot, never an error.
    pub fn extract_schedule(&self, html: &str, for_teacher: bool) -> Schedule {
        let document = Html::parse_document(html);

        let week_sel = Selector::parse(".week-nav-current_week").unwrap();
        let title_sel = Selector::parse(".info-block__title").unwrap();
        let weekday_sel = Selector::parse(".schedule__head-weekday").unwrap();
        let date_sel = Selector::parse(".schedule__head-date").unwrap();
        let time_sel = Selector::parse(".schedule__time-item").unwrap();
        let item_sel =
            Selector::parse(".schedule__item:not(.schedule__head):not(.schedule__time)").unwrap();
        let discipline_sel = Selector::parse(".schedule__discipline").unwrap();
        let place_sel = Selector::parse(".schedule__place").unwrap();
        let group_sel = Selector::parse(".schedule__group").unwrap();
        let teacher_name_sel = Selector::parse(".schedule__teacher .caption-text").unwrap();
        let teacher_link_sel = Selector::parse(".schedule__teacher a").unwrap();

        let current_week = document
            .select(&week_sel)
            .next()
            .map(element_text)
            .and_then(|text| {
                self.week_regex
                    .find(&text)
                    .and_then(|digits| digits.as_str().parse().ok())
            })
            .unwrap_or(1);

        let selected_item = document
            .select(&title_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let weekdays: Vec<String> = document.select(&weekday_sel).map(element_text).collect();
        let dates: Vec<String> = document.select(&date_sel).map(element_text).collect();

        let mut days = Vec::new();

        // The i-th weekday label is assumed to belong to the i-th date label
        // by document order; on a count mismatch the header is dropped.
        if !weekdays.is_empty() && weekdays.len() == dates.len() {
            let headings = weekdays
                .iter()
                .cloned()
                .zip(dates)
                .map(|(weekday, date)| DayHeading { weekday, date })
                .collect();
            days.push(DayRow::Header(HeaderRow {
                date: "Время".to_string(),
                lessons: headings,
            }));
        }

        // Time fragments come flat: start, end, start, end, ... A lone
        // trailing fragment becomes a start-only label.
        let fragments: Vec<String> = document.select(&time_sel).map(element_text).collect();
        let times: Vec<String> = fragments
            .chunks(2)
            .map(|pair| {
                let start = pair.first().map(String::as_str).unwrap_or("");
                let end = pair.get(1).map(String::as_str).unwrap_or("");
                format!("{start} {end}").trim().to_string()
            })
            .collect();

        let items: Vec<ElementRef> = document.select(&item_sel).collect();
        let day_count = weekdays.len();
        if day_count == 0 {
            return Schedule {
                current_week,
                selected_item,
                days,
            };
        }

        let pair_count = items.len().div_ceil(day_count);
        for pair_index in 0..pair_count {
            let time = times.get(pair_index).cloned().unwrap_or_default();
            let mut row: Vec<Option<SlotCell>> = Vec::with_capacity(day_count + 1);
            row.push(Some(SlotCell::Time(TimeCell { time })));

            for day_index in 0..day_count {
                let Some(item) = items.get(slot_index(pair_index, day_index, day_count)) else {
                    row.push(None);
                    continue;
                };
                let Some(discipline) = item.select(&discipline_sel).next() else {
                    row.push(None);
                    continue;
                };

                let subject = element_text(discipline);
                let place = item
                    .select(&place_sel)
                    .next()
                    .map(element_text)
                    .unwrap_or_default();

                let lesson = if for_teacher {
                    let groups = item.select(&group_sel).next().map(|el| LinkedName {
                        name: element_text(el),
                        link: el.value().attr("href").map(str::to_string),
                    });
                    Lesson::Staff(StaffLesson {
                        subject,
                        place,
                        groups,
                    })
                } else {
                    // Name and link live in different subtrees and are read
                    // independently; either may be missing on its own.
                    let teacher = LinkedName {
                        name: item
                            .select(&teacher_name_sel)
                            .next()
                            .map(element_text)
                            .unwrap_or_default(),
                        link: item
                            .select(&teacher_link_sel)
                            .next()
                            .and_then(|a| a.value().attr("href"))
                            .map(str::to_string),
                    };
                    Lesson::Group(GroupLesson {
                        subject,
                        place,
                        teacher,
                    })
                };
                row.push(Some(SlotCell::Lesson(lesson)));
            }

            days.push(DayRow::Lessons(LessonRow { lessons: row }));
        }

        Schedule {
            current_week,
            selected_item,
            days,
        }
    }
}

/// Maps a grid coordinate onto the flat, document-ordered lesson list.
/// The markup carries no explicit day/time keys: each consecutive run of
/// `day_count` items is one time slot across all days.
fn slot_index(pair_index: usize, day_index: usize, day_count: usize) -> usize {
    pair_index * day_count + day_index
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> ScheduleScraper {
        ScheduleScraper::new(
            Url::parse("https://ssau.ru/rasp").unwrap(),
            Duration::from_secs(10),
        )
    }

    fn lesson_item(subject: &str) -> String {
        format!(
            r#"<div class="schedule__item">
                <div class="schedule__discipline">{subject}</div>
                <div class="schedule__place">Корпус 3, ауд. 112</div>
                <div class="schedule__teacher">
                    <a href="/rasp?staffId=900"><span class="caption-text">Иванов И.И.</span></a>
                </div>
            </div>"#
        )
    }

    fn grid_html(weekdays: &[&str], dates: &[&str], times: &[&str], items: &[String]) -> String {
        let mut html = String::from(
            r#"<html><body>
            <div class="week-nav-current_week">22 неделя</div>
            <h2 class="info-block__title">6101-020302D</h2>
            <div class="schedule">"#,
        );
        for weekday in weekdays {
            html.push_str(&format!(
                r#"<div class="schedule__item schedule__head">
                    <div class="schedule__head-weekday">{weekday}</div>
                </div>"#
            ));
        }
        for date in dates {
            html.push_str(&format!(
                r#"<div class="schedule__item schedule__head">
                    <div class="schedule__head-date">{date}</div>
                </div>"#
            ));
        }
        for time in times {
            html.push_str(&format!(
                r#"<div class="schedule__item schedule__time">
                    <div class="schedule__time-item">{time}</div>
                </div>"#
            ));
        }
        for item in items {
            html.push_str(item);
        }
        html.push_str("</div></body></html>");
        html
    }

    #[test]
    fn test_schedule_url_for_group_omits_week() {
        let scraper = scraper();
        let url = scraper.schedule_url(ScheduleTarget::Group, "1282690279", None);
        assert_eq!(url.as_str(), "https://ssau.ru/rasp?groupId=1282690279");

        let url = scraper.schedule_url(ScheduleTarget::Group, "1282690279", Some(""));
        assert_eq!(url.as_str(), "https://ssau.ru/rasp?groupId=1282690279");
    }

    #[test]
    fn test_schedule_url_for_staff_with_week() {
        let scraper = scraper();
        let url = scraper.schedule_url(ScheduleTarget::Staff, "233", Some("5"));
        assert_eq!(url.as_str(), "https://ssau.ru/rasp?staffId=233&selectedWeek=5");
    }

    #[test]
    fn test_slot_index_is_row_major() {
        assert_eq!(slot_index(0, 0, 6), 0);
        assert_eq!(slot_index(0, 5, 6), 5);
        assert_eq!(slot_index(1, 0, 6), 6);
        assert_eq!(slot_index(4, 5, 6), 29);
    }

    #[test]
    fn test_extract_full_grid() {
        let weekdays = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб"];
        let dates = ["07.04", "08.04", "09.04", "10.04", "11.04", "12.04"];
        let times = [
            "08:00", "09:35", "09:45", "11:20", "11:30", "13:05", "13:30", "15:05", "15:15",
            "16:50",
        ];
        let items: Vec<String> = (0..30).map(|i| lesson_item(&format!("Предмет {i}"))).collect();
        let html = grid_html(&weekdays, &dates, &times, &items);

        let schedule = scraper().extract_schedule(&html, false);

        assert_eq!(schedule.current_week, 22);
        assert_eq!(schedule.selected_item, "6101-020302D");
        assert_eq!(schedule.days.len(), 6);

        let DayRow::Header(header) = &schedule.days[0] else {
            panic!("first row must be the header");
        };
        assert_eq!(header.date, "Время");
        assert_eq!(header.lessons.len(), 6);
        assert_eq!(header.lessons[0].weekday, "Пн");
        assert_eq!(header.lessons[0].date, "07.04");

        for day in &schedule.days[1..] {
            let DayRow::Lessons(row) = day else {
                panic!("only the first row may be a header");
            };
            assert_eq!(row.lessons.len(), 7);
            assert!(row.lessons.iter().all(Option::is_some));
        }

        let DayRow::Lessons(first_row) = &schedule.days[1] else {
            unreachable!();
        };
        assert_eq!(
            first_row.lessons[0],
            Some(SlotCell::Time(TimeCell {
                time: "08:00 09:35".to_string()
            }))
        );

        // Extraction is pure; a second pass over the same input is identical.
        assert_eq!(schedule, scraper().extract_schedule(&html, false));
    }

    #[test]
    fn test_missing_discipline_yields_null() {
        let weekdays = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб"];
        let dates = ["07.04", "08.04", "09.04", "10.04", "11.04", "12.04"];
        let times = ["08:00", "09:35"];
        let mut items: Vec<String> = (0..6).map(|i| lesson_item(&format!("Предмет {i}"))).collect();
        items[3] = r#"<div class="schedule__item"></div>"#.to_string();
        let html = grid_html(&weekdays, &dates, &times, &items);

        let schedule = scraper().extract_schedule(&html, false);

        let DayRow::Lessons(row) = &schedule.days[1] else {
            panic!("expected a lesson row");
        };
        assert!(row.lessons[4].is_none());
        for (i, cell) in row.lessons.iter().enumerate() {
            if i != 4 {
                assert!(cell.is_some(), "slot {i} should be populated");
            }
        }
    }

    #[test]
    fn test_no_headers_produces_empty_grid() {
        let items: Vec<String> = (0..4).map(|i| lesson_item(&format!("Предмет {i}"))).collect();
        let html = grid_html(&[], &[], &["08:00", "09:35"], &items);

        let schedule = scraper().extract_schedule(&html, false);

        assert!(schedule.days.is_empty());
        assert_eq!(schedule.current_week, 22);
    }

    #[test]
    fn test_header_count_mismatch_drops_header_only() {
        let items: Vec<String> = (0..2).map(|i| lesson_item(&format!("Предмет {i}"))).collect();
        let html = grid_html(&["Пн", "Вт"], &["07.04"], &["08:00", "09:35"], &items);

        let schedule = scraper().extract_schedule(&html, false);

        // No header row, but the weekday count still sizes the grid.
        assert_eq!(schedule.days.len(), 1);
        let DayRow::Lessons(row) = &schedule.days[0] else {
            panic!("mismatched header must not be emitted");
        };
        assert_eq!(row.lessons.len(), 3);
    }

    #[test]
    fn test_lone_time_fragment_keeps_start_only() {
        let items: Vec<String> = (0..2).map(|i| lesson_item(&format!("Предмет {i}"))).collect();
        let html = grid_html(&["Пн"], &["07.04"], &["08:00", "09:35", "09:45"], &items);

        let schedule = scraper().extract_schedule(&html, false);

        let times: Vec<String> = schedule.days[1..]
            .iter()
            .map(|day| {
                let DayRow::Lessons(row) = day else {
                    panic!("expected lesson rows");
                };
                let Some(SlotCell::Time(cell)) = &row.lessons[0] else {
                    panic!("slot 0 must be the time cell");
                };
                cell.time.clone()
            })
            .collect();
        assert_eq!(times, vec!["08:00 09:35".to_string(), "09:45".to_string()]);
    }

    #[test]
    fn test_metadata_defaults_on_empty_page() {
        let schedule = scraper().extract_schedule("<html><body></body></html>", false);
        assert_eq!(schedule.current_week, 1);
        assert_eq!(schedule.selected_item, "");
        assert!(schedule.days.is_empty());
    }

    #[test]
    fn test_group_mode_extracts_teacher() {
        let items = vec![lesson_item("Математический анализ")];
        let html = grid_html(&["Пн"], &["07.04"], &["08:00", "09:35"], &items);

        let schedule = scraper().extract_schedule(&html, false);

        let DayRow::Lessons(row) = &schedule.days[1] else {
            panic!("expected a lesson row");
        };
        let Some(SlotCell::Lesson(Lesson::Group(lesson))) = &row.lessons[1] else {
            panic!("group mode must yield group lessons");
        };
        assert_eq!(lesson.subject, "Математический анализ");
        assert_eq!(lesson.place, "Корпус 3, ауд. 112");
        assert_eq!(lesson.teacher.name, "Иванов И.И.");
        assert_eq!(lesson.teacher.link.as_deref(), Some("/rasp?staffId=900"));
    }

    #[test]
    fn test_group_mode_teacher_defaults_when_absent() {
        let items = vec![
            r#"<div class="schedule__item">
                <div class="schedule__discipline">Физика</div>
            </div>"#
                .to_string(),
        ];
        let html = grid_html(&["Пн"], &["07.04"], &[], &items);

        let schedule = scraper().extract_schedule(&html, false);

        let DayRow::Lessons(row) = &schedule.days[1] else {
            panic!("expected a lesson row");
        };
        let Some(SlotCell::Lesson(Lesson::Group(lesson))) = &row.lessons[1] else {
            panic!("expected a group lesson");
        };
        assert_eq!(lesson.place, "");
        assert_eq!(lesson.teacher.name, "");
        assert_eq!(lesson.teacher.link, None);
    }

    #[test]
    fn test_staff_mode_extracts_groups() {
        let items = vec![
            r#"<div class="schedule__item">
                <div class="schedule__discipline">Физика</div>
                <div class="schedule__place">Корпус 5, ауд. 404</div>
                <a class="schedule__group" href="/rasp?groupId=123">6101-020302D</a>
            </div>"#
                .to_string(),
        ];
        let html = grid_html(&["Пн"], &["07.04"], &["08:00", "09:35"], &items);

        let schedule = scraper().extract_schedule(&html, true);

        let DayRow::Lessons(row) = &schedule.days[1] else {
            panic!("expected a lesson row");
        };
        let Some(SlotCell::Lesson(Lesson::Staff(lesson))) = &row.lessons[1] else {
            panic!("staff mode must yield staff lessons");
        };
        let groups = lesson.groups.as_ref().expect("groups node is present");
        assert_eq!(groups.name, "6101-020302D");
        assert_eq!(groups.link.as_deref(), Some("/rasp?groupId=123"));
    }

    #[test]
    fn test_staff_mode_without_groups_node() {
        let items = vec![
            r#"<div class="schedule__item">
                <div class="schedule__discipline">Физика</div>
            </div>"#
                .to_string(),
        ];
        let html = grid_html(&["Пн"], &["07.04"], &[], &items);

        let schedule = scraper().extract_schedule(&html, true);

        let DayRow::Lessons(row) = &schedule.days[1] else {
            panic!("expected a lesson row");
        };
        let Some(SlotCell::Lesson(Lesson::Staff(lesson))) = &row.lessons[1] else {
            panic!("expected a staff lesson");
        };
        assert!(lesson.groups.is_none());
    }
}
