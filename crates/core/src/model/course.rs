use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::ids::CourseId;
use crate::model::lesson::{Lesson, LessonPath, Section};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course name cannot be empty")]
    EmptyName,

    #[error("lesson {0} is not part of this course")]
    UnknownLesson(LessonPath),

    #[error("section \"{0}\" is not part of this course")]
    UnknownSection(String),
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// The lesson a user opened most recently in a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastOpened {
    pub lesson: LessonPath,
    pub at: DateTime<Utc>,
}

/// A folder-backed course and the user's progress through it.
///
/// Lessons come from the most recent scan. Once a scan has been applied the
/// completion set only ever holds paths of scanned lessons; a course restored
/// from disk keeps its stored set as-is until its folder can be scanned.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    name: String,
    root: PathBuf,
    sections: Vec<Section>,
    completed: BTreeSet<LessonPath>,
    added_at: DateTime<Utc>,
    last_opened: Option<LastOpened>,
    /// Section keys the user folded away; see `Section::key`.
    collapsed_sections: BTreeSet<String>,
    scanned: bool,
}

impl Course {
    /// Creates a course for `root`, named after the folder.
    ///
    /// Roots without a final component (`/`, `D:\`) are named by the whole path.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyName` if `root` is an empty path.
    pub fn new(id: CourseId, root: PathBuf, added_at: DateTime<Utc>) -> Result<Self, CourseError> {
        let name = default_name(&root).ok_or(CourseError::EmptyName)?;
        Ok(Self {
            id,
            name,
            root,
            sections: Vec::new(),
            completed: BTreeSet::new(),
            added_at,
            last_opened: None,
            collapsed_sections: BTreeSet::new(),
            scanned: false,
        })
    }

    /// Rebuilds a course from persisted progress. The course is unscanned.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyName` if `name` is blank and `root` is empty.
    pub fn from_persisted(
        id: CourseId,
        name: String,
        root: PathBuf,
        completed: impl IntoIterator<Item = LessonPath>,
        added_at: DateTime<Utc>,
        last_opened: Option<LastOpened>,
    ) -> Result<Self, CourseError> {
        let name = if name.trim().is_empty() {
            default_name(&root).ok_or(CourseError::EmptyName)?
        } else {
            name.trim().to_string()
        };
        Ok(Self {
            id,
            name,
            root,
            sections: Vec::new(),
            completed: completed.into_iter().collect(),
            added_at,
            last_opened,
            collapsed_sections: BTreeSet::new(),
            scanned: false,
        })
    }

    /// Restore remembered collapsed sections.
    #[must_use]
    pub fn with_collapsed_sections(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.collapsed_sections = keys.into_iter().collect();
        self
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Stored completion set, including paths not yet confirmed by a scan.
    #[must_use]
    pub fn completed(&self) -> &BTreeSet<LessonPath> {
        &self.completed
    }

    #[must_use]
    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    #[must_use]
    pub fn last_opened(&self) -> Option<&LastOpened> {
        self.last_opened.as_ref()
    }

    #[must_use]
    pub fn collapsed_sections(&self) -> &BTreeSet<String> {
        &self.collapsed_sections
    }

    #[must_use]
    pub fn is_section_collapsed(&self, key: &str) -> bool {
        self.collapsed_sections.contains(key)
    }

    /// Remember whether a section is folded. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownSection` if the course is scanned and has no
    /// section with that key.
    pub fn set_section_collapsed(&mut self, key: &str, collapsed: bool) -> Result<bool, CourseError> {
        if self.scanned && !self.sections.iter().any(|section| section.key() == key) {
            return Err(CourseError::UnknownSection(key.to_string()));
        }
        Ok(if collapsed {
            self.collapsed_sections.insert(key.to_string())
        } else {
            self.collapsed_sections.remove(key)
        })
    }

    /// Forget every collapsed section. Returns whether anything changed.
    pub fn expand_all_sections(&mut self) -> bool {
        let changed = !self.collapsed_sections.is_empty();
        self.collapsed_sections.clear();
        changed
    }

    /// False until a scan of the course folder has been applied.
    #[must_use]
    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    /// Replace the lesson list with a fresh scan.
    ///
    /// Completion flags and the last-opened marker for paths that are gone are
    /// dropped. Returns how many completion flags were pruned.
    pub fn apply_scan(&mut self, sections: Vec<Section>) -> usize {
        self.sections = sections.into_iter().filter(|s| !s.is_empty()).collect();
        self.scanned = true;

        let present: BTreeSet<&LessonPath> = self.lessons().map(Lesson::path).collect();
        let before = self.completed.len();
        let kept: BTreeSet<LessonPath> = self
            .completed
            .iter()
            .filter(|path| present.contains(path))
            .cloned()
            .collect();
        let last_still_present = self
            .last_opened
            .as_ref()
            .is_some_and(|last| present.contains(&last.lesson));

        self.completed = kept;
        if !last_still_present {
            self.last_opened = None;
        }
        let sections = &self.sections;
        self.collapsed_sections
            .retain(|key| sections.iter().any(|section| section.key() == key));
        before - self.completed.len()
    }

    /// Lessons in course order: root files first, then each section.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.sections.iter().flat_map(|section| section.lessons().iter())
    }

    #[must_use]
    pub fn lesson(&self, path: &LessonPath) -> Option<&Lesson> {
        self.lessons().find(|lesson| lesson.path() == path)
    }

    #[must_use]
    pub fn contains_lesson(&self, path: &LessonPath) -> bool {
        self.lesson(path).is_some()
    }

    #[must_use]
    pub fn is_completed(&self, path: &LessonPath) -> bool {
        self.completed.contains(path)
    }

    /// Flip a lesson's completion flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownLesson` if the lesson is not in the current scan.
    pub fn toggle(&mut self, path: &LessonPath) -> Result<bool, CourseError> {
        self.ensure_lesson(path)?;
        if self.completed.remove(path) {
            Ok(false)
        } else {
            self.completed.insert(path.clone());
            Ok(true)
        }
    }

    /// Set a lesson's completion flag. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownLesson` if the lesson is not in the current scan.
    pub fn set_completed(&mut self, path: &LessonPath, done: bool) -> Result<bool, CourseError> {
        self.ensure_lesson(path)?;
        Ok(if done {
            self.completed.insert(path.clone())
        } else {
            self.completed.remove(path)
        })
    }

    /// Remember `path` as the lesson opened last.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownLesson` if the lesson is not in the current scan.
    pub fn record_open(&mut self, path: &LessonPath, at: DateTime<Utc>) -> Result<(), CourseError> {
        self.ensure_lesson(path)?;
        self.last_opened = Some(LastOpened {
            lesson: path.clone(),
            at,
        });
        Ok(())
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|s| s.lessons().len()).sum()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.lessons()
            .filter(|lesson| self.completed.contains(lesson.path()))
            .count()
    }

    /// Completed lessons over total lessons, `0.0` for an empty course.
    #[must_use]
    pub fn completion_ratio(&self) -> f64 {
        ratio(self.completed_count() as u64, self.lesson_count() as u64)
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.lessons().map(Lesson::size_bytes).sum()
    }

    #[must_use]
    pub fn completed_bytes(&self) -> u64 {
        self.lessons()
            .filter(|lesson| self.completed.contains(lesson.path()))
            .map(Lesson::size_bytes)
            .sum()
    }

    /// Completed bytes over total bytes, `0.0` when the course has no data.
    #[must_use]
    pub fn byte_ratio(&self) -> f64 {
        ratio(self.completed_bytes(), self.total_bytes())
    }

    /// The lesson following `path` in course order.
    #[must_use]
    pub fn next_lesson_after(&self, path: &LessonPath) -> Option<&Lesson> {
        self.lessons()
            .skip_while(|lesson| lesson.path() != path)
            .nth(1)
    }

    #[must_use]
    pub fn first_incomplete(&self) -> Option<&Lesson> {
        self.lessons()
            .find(|lesson| !self.completed.contains(lesson.path()))
    }

    fn ensure_lesson(&self, path: &LessonPath) -> Result<(), CourseError> {
        if self.contains_lesson(path) {
            Ok(())
        } else {
            Err(CourseError::UnknownLesson(path.clone()))
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64).clamp(0.0, 1.0)
    }
}

fn default_name(root: &Path) -> Option<String> {
    root.file_name()
        .map(|name| name.to_string_lossy().trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| Some(root.display().to_string()).filter(|name| !name.trim().is_empty()))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn lesson(path: &str, size: u64) -> Lesson {
        Lesson::new(LessonPath::new(path), size)
    }

    fn scanned_course() -> Course {
        let mut course =
            Course::new(CourseId::new(1), PathBuf::from("/courses/Rust 101"), fixed_now()).unwrap();
        course.apply_scan(vec![
            Section::new(None, vec![lesson("01-intro.mp4", 300), lesson("02-lab.pdf", 100)]),
            Section::new(
                Some("Module 2".into()),
                vec![lesson("Module 2/03-traits.mp4", 600)],
            ),
        ]);
        course
    }

    #[test]
    fn new_course_takes_folder_name() {
        let course =
            Course::new(CourseId::new(1), PathBuf::from("/courses/Rust 101"), fixed_now()).unwrap();
        assert_eq!(course.name(), "Rust 101");
        assert!(!course.is_scanned());
        assert_eq!(course.completion_ratio(), 0.0);
    }

    #[test]
    fn filesystem_root_is_named_by_its_path() {
        let course = Course::new(CourseId::new(1), PathBuf::from("/"), fixed_now()).unwrap();
        assert_eq!(course.name(), "/");
    }

    #[test]
    fn new_course_rejects_empty_root() {
        let err = Course::new(CourseId::new(1), PathBuf::new(), fixed_now()).unwrap_err();
        assert_eq!(err, CourseError::EmptyName);
    }

    #[test]
    fn collapsed_sections_follow_the_scan() {
        let mut course = scanned_course();
        assert!(course.set_section_collapsed("Module 2", true).unwrap());
        assert!(!course.set_section_collapsed("Module 2", true).unwrap());
        assert!(course.set_section_collapsed("", true).unwrap());
        assert!(course.is_section_collapsed("Module 2"));

        let err = course.set_section_collapsed("Module 9", true).unwrap_err();
        assert_eq!(err, CourseError::UnknownSection("Module 9".into()));

        course.apply_scan(vec![Section::new(None, vec![lesson("01-intro.mp4", 300)])]);
        assert_eq!(course.collapsed_sections().len(), 1);
        assert!(course.is_section_collapsed(""));

        assert!(course.expand_all_sections());
        assert!(course.collapsed_sections().is_empty());
        assert!(!course.expand_all_sections());
    }

    #[test]
    fn toggle_twice_restores_state() {
        let mut course = scanned_course();
        let path = LessonPath::new("01-intro.mp4");
        assert!(course.toggle(&path).unwrap());
        assert!(course.is_completed(&path));
        assert!(!course.toggle(&path).unwrap());
        assert!(!course.is_completed(&path));
    }

    #[test]
    fn toggle_unknown_lesson_fails() {
        let mut course = scanned_course();
        let err = course.toggle(&LessonPath::new("missing.mp4")).unwrap_err();
        assert!(matches!(err, CourseError::UnknownLesson(_)));
    }

    #[test]
    fn completion_ratio_counts_lessons() {
        let mut course = scanned_course();
        course.toggle(&LessonPath::new("02-lab.pdf")).unwrap();
        let ratio = course.completion_ratio();
        assert!((ratio - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(course.completed_bytes(), 100);
        assert_eq!(course.total_bytes(), 1000);
        assert!((course.byte_ratio() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn rescan_prunes_vanished_paths() {
        let mut course = scanned_course();
        let gone = LessonPath::new("Module 2/03-traits.mp4");
        course.toggle(&gone).unwrap();
        course.record_open(&gone, fixed_now()).unwrap();

        let pruned = course.apply_scan(vec![Section::new(
            None,
            vec![lesson("01-intro.mp4", 300), lesson("02-lab.pdf", 100)],
        )]);

        assert_eq!(pruned, 1);
        assert!(course.completed().is_empty());
        assert!(course.last_opened().is_none());
        assert_eq!(course.lesson_count(), 2);
    }

    #[test]
    fn persisted_course_keeps_flags_until_scanned() {
        let course = Course::from_persisted(
            CourseId::new(3),
            "  ".into(),
            PathBuf::from("/courses/Go"),
            [LessonPath::new("a.mp4")],
            fixed_now(),
            None,
        )
        .unwrap();
        assert_eq!(course.name(), "Go");
        assert_eq!(course.completed().len(), 1);
        assert_eq!(course.completed_count(), 0);
    }

    #[test]
    fn next_and_first_incomplete_follow_course_order() {
        let mut course = scanned_course();
        let intro = LessonPath::new("01-intro.mp4");
        let lab = LessonPath::new("02-lab.pdf");
        assert_eq!(course.next_lesson_after(&intro).unwrap().path(), &lab);
        assert_eq!(
            course.next_lesson_after(&lab).unwrap().path().as_str(),
            "Module 2/03-traits.mp4"
        );
        assert!(
            course
                .next_lesson_after(&LessonPath::new("Module 2/03-traits.mp4"))
                .is_none()
        );

        course.set_completed(&intro, true).unwrap();
        assert_eq!(course.first_incomplete().unwrap().path(), &lab);
    }

    #[test]
    fn set_completed_reports_changes() {
        let mut course = scanned_course();
        let intro = LessonPath::new("01-intro.mp4");
        assert!(course.set_completed(&intro, true).unwrap());
        assert!(!course.set_completed(&intro, true).unwrap());
        assert!(course.set_completed(&intro, false).unwrap());
    }

    #[test]
    fn empty_sections_are_dropped() {
        let mut course =
            Course::new(CourseId::new(1), PathBuf::from("/c/Empty"), fixed_now()).unwrap();
        course.apply_scan(vec![Section::new(Some("Extras".into()), Vec::new())]);
        assert!(course.sections().is_empty());
        assert_eq!(course.completion_ratio(), 0.0);
    }
}
