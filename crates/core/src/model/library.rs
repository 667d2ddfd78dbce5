use std::path::Path;

use crate::model::course::{Course, LastOpened};
use crate::model::ids::CourseId;

/// Every tracked course, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    courses: Vec<Course>,
}

impl Library {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already constructed courses. Later duplicates of an id are
    /// dropped; use `push_new` to learn which ones.
    #[must_use]
    pub fn from_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        let mut library = Self::new();
        for course in courses {
            let _ = library.push_new(course);
        }
        library
    }

    /// Append a course unless its id is taken, handing it back if so.
    ///
    /// # Errors
    ///
    /// Returns the rejected course when another course already has its id.
    pub fn push_new(&mut self, course: Course) -> Result<(), Course> {
        if self.get(course.id()).is_some() {
            return Err(course);
        }
        self.courses.push(course);
        Ok(())
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn courses_mut(&mut self) -> impl Iterator<Item = &mut Course> {
        self.courses.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: CourseId) -> Option<&Course> {
        self.courses.iter().find(|course| course.id() == id)
    }

    pub fn get_mut(&mut self, id: CourseId) -> Option<&mut Course> {
        self.courses.iter_mut().find(|course| course.id() == id)
    }

    #[must_use]
    pub fn find_by_root(&self, root: &Path) -> Option<&Course> {
        self.courses.iter().find(|course| course.root() == root)
    }

    /// One past the highest id in use, starting at 1.
    #[must_use]
    pub fn next_id(&self) -> CourseId {
        self.courses
            .iter()
            .map(Course::id)
            .max()
            .map_or(CourseId::new(1), |id| id.next())
    }

    /// Append a course. A course with the same id is replaced in place.
    pub fn insert(&mut self, course: Course) {
        match self.get_mut(course.id()) {
            Some(existing) => *existing = course,
            None => self.courses.push(course),
        }
    }

    pub fn remove(&mut self, id: CourseId) -> Option<Course> {
        let index = self.courses.iter().position(|course| course.id() == id)?;
        Some(self.courses.remove(index))
    }

    /// The most recently opened lesson across all courses.
    #[must_use]
    pub fn last_opened(&self) -> Option<(&Course, &LastOpened)> {
        self.courses
            .iter()
            .filter_map(|course| course.last_opened().map(|last| (course, last)))
            .max_by_key(|(_, last)| last.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lesson, LessonPath, Section};
    use crate::time::fixed_now;
    use chrono::Duration;
    use std::path::PathBuf;

    fn course(id: u64, root: &str) -> Course {
        Course::new(CourseId::new(id), PathBuf::from(root), fixed_now()).unwrap()
    }

    #[test]
    fn next_id_starts_at_one_and_follows_max() {
        let mut library = Library::new();
        assert_eq!(library.next_id(), CourseId::new(1));
        library.insert(course(4, "/c/a"));
        library.insert(course(2, "/c/b"));
        assert_eq!(library.next_id(), CourseId::new(5));
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut library = Library::from_courses([course(1, "/c/a"), course(2, "/c/b"), course(3, "/c/c")]);
        assert!(library.remove(CourseId::new(2)).is_some());
        assert!(library.remove(CourseId::new(2)).is_none());
        let ids: Vec<u64> = library.courses().iter().map(|c| c.id().value()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn duplicate_ids_are_dropped_on_load() {
        let library = Library::from_courses([course(1, "/c/a"), course(1, "/c/b")]);
        assert_eq!(library.len(), 1);
        assert_eq!(library.courses()[0].root(), Path::new("/c/a"));
    }

    #[test]
    fn push_new_hands_back_taken_ids() {
        let mut library = Library::new();
        assert!(library.push_new(course(1, "/c/a")).is_ok());
        let rejected = library.push_new(course(1, "/c/b")).unwrap_err();
        assert_eq!(rejected.root(), Path::new("/c/b"));
        assert!(library.push_new(course(2, "/c/b")).is_ok());
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn last_opened_picks_most_recent() {
        let mut a = course(1, "/c/a");
        let mut b = course(2, "/c/b");
        for c in [&mut a, &mut b] {
            c.apply_scan(vec![Section::new(None, vec![Lesson::new(LessonPath::new("x.mp4"), 1)])]);
        }
        a.record_open(&LessonPath::new("x.mp4"), fixed_now()).unwrap();
        b.record_open(&LessonPath::new("x.mp4"), fixed_now() + Duration::minutes(5))
            .unwrap();
        let library = Library::from_courses([a, b]);
        let (course, last) = library.last_opened().unwrap();
        assert_eq!(course.id(), CourseId::new(2));
        assert_eq!(last.lesson.as_str(), "x.mp4");
    }
}
