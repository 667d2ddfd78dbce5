use course_core::model::Course;

use crate::vm::format::{format_bytes, format_datetime, percent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonRowVm {
    /// Relative lesson path, used as the key for service calls.
    pub path: String,
    pub name: String,
    pub size_str: String,
    pub completed: bool,
    pub last_opened: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionVm {
    pub key: String,
    pub title: String,
    pub done: usize,
    pub total: usize,
    /// Folded as remembered for this course.
    pub collapsed: bool,
    pub lessons: Vec<LessonRowVm>,
}

/// Narrows the lesson rows shown in the course view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub hide_completed: bool,
    query: String,
}

impl RowFilter {
    #[must_use]
    pub fn new(hide_completed: bool, query: &str) -> Self {
        Self {
            hide_completed,
            query: query.trim().to_lowercase(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.hide_completed || !self.query.is_empty()
    }

    #[must_use]
    pub fn keeps(&self, row: &LessonRowVm) -> bool {
        !(self.hide_completed && row.completed)
            && (self.query.is_empty() || row.name.to_lowercase().contains(&self.query))
    }
}

impl SectionVm {
    pub fn visible_lessons<'a>(
        &'a self,
        filter: &'a RowFilter,
    ) -> impl Iterator<Item = &'a LessonRowVm> + 'a {
        self.lessons.iter().filter(move |lesson| filter.keeps(lesson))
    }
}

/// Sections with their rows narrowed by `filter`.
///
/// While a filter is active, sections left without rows are dropped.
#[must_use]
pub fn visible_sections(sections: &[SectionVm], filter: &RowFilter) -> Vec<SectionVm> {
    sections
        .iter()
        .map(|section| SectionVm {
            lessons: section.visible_lessons(filter).cloned().collect(),
            ..section.clone()
        })
        .filter(|section| !(filter.is_active() && section.lessons.is_empty()))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseDetailVm {
    pub id: u64,
    pub name: String,
    pub root_str: String,
    pub percent: u32,
    pub progress_label: String,
    pub bytes_label: String,
    pub last_opened_str: Option<String>,
    pub available: bool,
    pub sections: Vec<SectionVm>,
}

#[must_use]
pub fn map_course_detail(course: &Course) -> CourseDetailVm {
    let last = course.last_opened();
    let sections = course
        .sections()
        .iter()
        .map(|section| {
            let lessons: Vec<LessonRowVm> = section
                .lessons()
                .iter()
                .map(|lesson| LessonRowVm {
                    path: lesson.path().as_str().to_owned(),
                    name: lesson.name().to_owned(),
                    size_str: format_bytes(lesson.size_bytes()),
                    completed: course.is_completed(lesson.path()),
                    last_opened: last.is_some_and(|last| &last.lesson == lesson.path()),
                })
                .collect();
            let title = section.name().unwrap_or("Course files").to_owned();
            SectionVm {
                key: section.key().to_owned(),
                title,
                collapsed: course.is_section_collapsed(section.key()),
                done: lessons.iter().filter(|lesson| lesson.completed).count(),
                total: lessons.len(),
                lessons,
            }
        })
        .collect();

    CourseDetailVm {
        id: course.id().value(),
        name: course.name().to_owned(),
        root_str: course.root().display().to_string(),
        percent: percent(course.completion_ratio()),
        progress_label: format!(
            "{} / {} lessons",
            course.completed_count(),
            course.lesson_count()
        ),
        bytes_label: format!(
            "{} / {}",
            format_bytes(course.completed_bytes()),
            format_bytes(course.total_bytes())
        ),
        last_opened_str: last.map(|last| {
            format!("{} ({})", last.lesson.as_str(), format_datetime(last.at))
        }),
        available: course.is_scanned(),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    use course_core::model::{CourseId, LastOpened, Lesson, LessonPath, Section};
    use course_core::time::fixed_now;

    use super::*;

    fn sample_course() -> Course {
        let completed: BTreeSet<LessonPath> = [LessonPath::new("01-intro.mp4")].into();
        let mut course = Course::from_persisted(
            CourseId::new(4),
            "Rust".into(),
            PathBuf::from("/courses/rust"),
            completed,
            fixed_now(),
            Some(LastOpened {
                lesson: LessonPath::new("Week 1/02-lab.pdf"),
                at: fixed_now(),
            }),
        )
        .unwrap();
        course.apply_scan(vec![
            Section::new(None, vec![Lesson::new(LessonPath::new("01-intro.mp4"), 2048)]),
            Section::new(
                Some("Week 1".into()),
                vec![Lesson::new(LessonPath::new("Week 1/02-lab.pdf"), 2048)],
            ),
        ]);
        course.set_section_collapsed("Week 1", true).unwrap();
        course
    }

    #[test]
    fn detail_groups_rows_by_section() {
        let vm = map_course_detail(&sample_course());
        assert_eq!(vm.percent, 50);
        assert_eq!(vm.progress_label, "1 / 2 lessons");
        assert_eq!(vm.bytes_label, "2.00 KB / 4.00 KB");
        assert_eq!(vm.sections.len(), 2);
        assert_eq!(vm.sections[0].title, "Course files");
        assert_eq!(vm.sections[1].title, "Week 1");
        assert!(vm.sections[0].lessons[0].completed);
        assert!(vm.sections[1].lessons[0].last_opened);
        assert_eq!(vm.sections[0].key, "");
        assert!(!vm.sections[0].collapsed);
        assert!(vm.sections[1].collapsed);
    }

    #[test]
    fn hide_completed_filters_rows() {
        let vm = map_course_detail(&sample_course());
        let hide = RowFilter::new(true, "");
        assert_eq!(vm.sections[0].visible_lessons(&hide).count(), 0);
        assert_eq!(vm.sections[0].visible_lessons(&RowFilter::default()).count(), 1);
    }

    #[test]
    fn name_filter_ignores_case_and_padding() {
        let vm = map_course_detail(&sample_course());
        let filter = RowFilter::new(false, "  LAB ");
        let shown = visible_sections(&vm.sections, &filter);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Week 1");
        assert_eq!(shown[0].lessons[0].name, "02-lab.pdf");
        assert_eq!(shown[0].total, 1);

        assert!(visible_sections(&vm.sections, &RowFilter::new(false, "zzz")).is_empty());
        assert_eq!(visible_sections(&vm.sections, &RowFilter::new(false, "   ")).len(), 2);
    }
}
