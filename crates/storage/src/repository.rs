use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_core::model::{Course, CourseError, CourseId, LastOpened, LessonPath, Library};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("corrupt progress data: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::Corrupt(_))
    }
}

/// On-disk shape of the whole library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    #[serde(default)]
    pub courses: Vec<CourseRecord>,
}

/// Persisted shape for a course: where it lives and what is done.
///
/// Lessons themselves are never stored; they are rebuilt from a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: CourseId,
    pub name: String,
    pub root_path: PathBuf,
    #[serde(default)]
    pub completed: Vec<LessonPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<LastOpenedRecord>,
    /// Sections folded in the course view; the root section is `""`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collapsed_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOpenedRecord {
    pub lesson: LessonPath,
    pub at: DateTime<Utc>,
}

impl CourseRecord {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            id: course.id(),
            name: course.name().to_owned(),
            root_path: course.root().to_path_buf(),
            completed: course.completed().iter().cloned().collect(),
            added_at: Some(course.added_at()),
            last_opened: course.last_opened().map(|last| LastOpenedRecord {
                lesson: last.lesson.clone(),
                at: last.at,
            }),
            collapsed_sections: course.collapsed_sections().iter().cloned().collect(),
        }
    }

    /// Convert the record back into an unscanned domain `Course`.
    ///
    /// `fallback_added_at` is used for records written without a timestamp.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if no course name can be recovered.
    pub fn into_course(self, fallback_added_at: DateTime<Utc>) -> Result<Course, CourseError> {
        let collapsed = self.collapsed_sections;
        Course::from_persisted(
            self.id,
            self.name,
            self.root_path,
            self.completed,
            self.added_at.unwrap_or(fallback_added_at),
            self.last_opened.map(|last| LastOpened {
                lesson: last.lesson,
                at: last.at,
            }),
        )
        .map(|course| course.with_collapsed_sections(collapsed))
    }
}

impl LibraryRecord {
    #[must_use]
    pub fn from_library(library: &Library) -> Self {
        Self {
            courses: library.courses().iter().map(CourseRecord::from_course).collect(),
        }
    }

    /// Rebuild the in-memory library.
    ///
    /// Unusable records and repeated ids are left out and described in
    /// `RestoredLibrary::skipped`; the remaining courses are kept.
    #[must_use]
    pub fn into_library(self, fallback_added_at: DateTime<Utc>) -> RestoredLibrary {
        let mut restored = RestoredLibrary::default();
        for record in self.courses {
            let id = record.id;
            match record.into_course(fallback_added_at) {
                Ok(course) => {
                    if restored.library.push_new(course).is_err() {
                        restored.skipped.push(format!("course {id}: duplicate id"));
                    }
                }
                Err(err) => restored.skipped.push(format!("course {id}: {err}")),
            }
        }
        restored
    }

    /// Course id to completed lesson paths.
    #[must_use]
    pub fn completed_by_course(&self) -> BTreeMap<CourseId, BTreeSet<LessonPath>> {
        self.courses
            .iter()
            .map(|course| (course.id, course.completed.iter().cloned().collect()))
            .collect()
    }

    #[must_use]
    pub fn course(&self, id: CourseId) -> Option<&CourseRecord> {
        self.courses.iter().find(|course| course.id == id)
    }
}

/// Outcome of rebuilding a library from its stored record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredLibrary {
    pub library: Library,
    /// One line per record that could not be restored.
    pub skipped: Vec<String>,
}

impl RestoredLibrary {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Repository contract for persisted progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the stored library. A store that was never written loads as empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` if stored data cannot be parsed, or other
    /// storage errors.
    async fn load(&self) -> Result<LibraryRecord, StorageError>;

    /// Replace the stored library. Readers never observe a partial write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the library cannot be stored.
    async fn save(&self, record: &LibraryRecord) -> Result<(), StorageError>;

    /// Copy the stored data aside before it is overwritten, so that data
    /// which could not be fully read is not lost on the next save.
    ///
    /// Returns where the copy went, or `None` if the store keeps no copies or
    /// holds nothing to copy.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the copy cannot be written.
    async fn preserve_copy(&self) -> Result<Option<PathBuf>, StorageError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    record: Option<LibraryRecord>,
    corrupt: bool,
    saves: usize,
    copies: usize,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(record: LibraryRecord) -> Self {
        let repo = Self::new();
        if let Ok(mut guard) = repo.state.lock() {
            guard.record = Some(record);
        }
        repo
    }

    /// A repository whose stored data fails to parse until the next save.
    #[must_use]
    pub fn corrupted() -> Self {
        let repo = Self::new();
        if let Ok(mut guard) = repo.state.lock() {
            guard.corrupt = true;
        }
        repo
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.state.lock().map(|guard| guard.saves).unwrap_or_default()
    }

    /// How many times stored data was copied aside.
    #[must_use]
    pub fn preserved_copies(&self) -> usize {
        self.state.lock().map(|guard| guard.copies).unwrap_or_default()
    }

    /// The last saved record, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<LibraryRecord> {
        self.state.lock().ok().and_then(|guard| guard.record.clone())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(&self) -> Result<LibraryRecord, StorageError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        if guard.corrupt {
            return Err(StorageError::Corrupt("in-memory store marked corrupt".into()));
        }
        Ok(guard.record.clone().unwrap_or_default())
    }

    async fn save(&self, record: &LibraryRecord) -> Result<(), StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        guard.record = Some(record.clone());
        guard.corrupt = false;
        guard.saves += 1;
        Ok(())
    }

    async fn preserve_copy(&self) -> Result<Option<PathBuf>, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        guard.copies += 1;
        Ok(None)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

/// Whether `path` holds anything worth copying aside.
pub(crate) fn has_content(path: &Path) -> bool {
    path.metadata().is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{Lesson, Section};
    use course_core::time::fixed_now;

    fn scanned_course(id: u64) -> Course {
        let mut course = Course::new(
            CourseId::new(id),
            PathBuf::from(format!("/courses/c{id}")),
            fixed_now(),
        )
        .unwrap();
        course.apply_scan(vec![Section::new(
            None,
            vec![
                Lesson::new(LessonPath::new("01-intro.mp4"), 10),
                Lesson::new(LessonPath::new("02-lab.pdf"), 20),
            ],
        )]);
        course
            .toggle(&LessonPath::new("01-intro.mp4"))
            .unwrap();
        course
            .record_open(&LessonPath::new("02-lab.pdf"), fixed_now())
            .unwrap();
        course
    }

    #[test]
    fn course_record_round_trips_progress() {
        let course = scanned_course(1);
        let record = CourseRecord::from_course(&course);
        assert_eq!(record.completed, vec![LessonPath::new("01-intro.mp4")]);

        let restored = record.into_course(fixed_now()).unwrap();
        assert_eq!(restored.id(), course.id());
        assert_eq!(restored.name(), "c1");
        assert_eq!(restored.completed(), course.completed());
        assert_eq!(restored.last_opened(), course.last_opened());
        assert!(!restored.is_scanned());
    }

    #[test]
    fn minimal_schema_parses() {
        let json = r#"{ "courses": [ { "id": 7, "name": "Go", "root_path": "/c/go", "completed": ["a.mp4"] } ] }"#;
        let record: LibraryRecord = serde_json::from_str(json).unwrap();
        let map = record.completed_by_course();
        assert_eq!(map[&CourseId::new(7)].len(), 1);

        let restored = record.into_library(fixed_now());
        assert!(restored.is_complete());
        assert_eq!(restored.library.courses()[0].added_at(), fixed_now());
    }

    fn bare_record(id: u64, name: &str, root: &str) -> CourseRecord {
        CourseRecord {
            id: CourseId::new(id),
            name: name.into(),
            root_path: PathBuf::from(root),
            completed: Vec::new(),
            added_at: None,
            last_opened: None,
            collapsed_sections: Vec::new(),
        }
    }

    #[test]
    fn unusable_and_repeated_records_are_skipped() {
        let mut good = bare_record(1, "Rust", "/c/rust");
        good.completed = vec![LessonPath::new("a.mp4")];
        let record = LibraryRecord {
            courses: vec![
                good,
                bare_record(2, "", ""),
                bare_record(1, "Impostor", "/c/other"),
                bare_record(3, "Go", "/c/go"),
            ],
        };

        let restored = record.into_library(fixed_now());
        let ids: Vec<u64> = restored.library.courses().iter().map(|c| c.id().value()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(restored.library.courses()[0].name(), "Rust");
        assert_eq!(restored.library.courses()[0].completed().len(), 1);
        assert_eq!(restored.skipped.len(), 2);
        assert!(restored.skipped[0].starts_with("course 2:"));
        assert_eq!(restored.skipped[1], "course 1: duplicate id");
    }

    #[test]
    fn collapsed_sections_survive_the_record() {
        let mut course = scanned_course(1);
        course.set_section_collapsed("", true).unwrap();
        let record = CourseRecord::from_course(&course);
        assert_eq!(record.collapsed_sections, vec![String::new()]);

        let json = serde_json::to_string(&record).unwrap();
        let parsed: CourseRecord = serde_json::from_str(&json).unwrap();
        let restored = parsed.into_course(fixed_now()).unwrap();
        assert!(restored.is_section_collapsed(""));
    }

    #[tokio::test]
    async fn in_memory_repository_round_trips() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.load().await.unwrap(), LibraryRecord::default());

        let library = Library::from_courses([scanned_course(1), scanned_course(2)]);
        let record = LibraryRecord::from_library(&library);
        repo.save(&record).await.unwrap();

        assert_eq!(repo.load().await.unwrap(), record);
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn corrupted_repository_recovers_after_save() {
        let repo = InMemoryRepository::corrupted();
        assert!(repo.load().await.unwrap_err().is_corrupt());
        repo.save(&LibraryRecord::default()).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), LibraryRecord::default());
        assert_eq!(repo.preserve_copy().await.unwrap(), None);
        assert_eq!(repo.preserved_copies(), 1);
    }
}
