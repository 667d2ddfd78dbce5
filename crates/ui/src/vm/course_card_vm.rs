use services::CourseSummary;

use crate::vm::format::{format_bytes, format_datetime, percent};

/// Dashboard card for one course.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseCardVm {
    pub id: u64,
    pub name: String,
    pub root_str: String,
    pub percent: u32,
    pub lessons_label: String,
    pub bytes_label: String,
    pub last_opened_str: Option<String>,
    pub available: bool,
}

impl From<&CourseSummary> for CourseCardVm {
    fn from(summary: &CourseSummary) -> Self {
        Self {
            id: summary.id.value(),
            name: summary.name.clone(),
            root_str: summary.root.display().to_string(),
            percent: percent(summary.completion_ratio),
            lessons_label: format!(
                "{} / {} lessons",
                summary.completed_count, summary.lesson_count
            ),
            bytes_label: format!(
                "{} / {}",
                format_bytes(summary.completed_bytes),
                format_bytes(summary.total_bytes)
            ),
            last_opened_str: summary.last_opened.as_ref().map(|last| {
                format!("{} ({})", last.lesson.file_name(), format_datetime(last.at))
            }),
            available: summary.available,
        }
    }
}

#[must_use]
pub fn map_course_cards(summaries: &[CourseSummary]) -> Vec<CourseCardVm> {
    summaries.iter().map(CourseCardVm::from).collect()
}
