use std::path::{Path, PathBuf};
use std::sync::Arc;

use course_core::model::{Course, CourseId, LastOpened, LessonPath, Library};
use storage::repository::{LibraryRecord, ProgressRepository, StorageError};
use tokio::sync::Mutex;

use crate::Clock;
use crate::error::LibraryError;
use crate::launcher::Launcher;
use crate::scanner::FolderScanner;

/// Something the user should be told about once the library is loaded.
///
/// `backup` is where the stored data was copied before anything overwrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupWarning {
    /// Stored progress could not be read; the library started empty.
    CorruptProgress {
        message: String,
        backup: Option<PathBuf>,
    },
    /// Some course records were unusable and left out; the rest were kept.
    SkippedCourses {
        skipped: Vec<String>,
        backup: Option<PathBuf>,
    },
}

impl StartupWarning {
    #[must_use]
    pub fn backup(&self) -> Option<&Path> {
        match self {
            StartupWarning::CorruptProgress { backup, .. }
            | StartupWarning::SkippedCourses { backup, .. } => backup.as_deref(),
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        let copy = match self.backup() {
            Some(path) => format!(" A copy was kept at {}.", path.display()),
            None => String::new(),
        };
        match self {
            StartupWarning::CorruptProgress { message, .. } => format!(
                "Saved progress could not be read and was reset.{copy} ({message})"
            ),
            StartupWarning::SkippedCourses { skipped, .. } => format!(
                "{} saved course(s) could not be restored and were left out.{copy} ({})",
                skipped.len(),
                skipped.join("; ")
            ),
        }
    }
}

/// Dashboard row for one course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSummary {
    pub id: CourseId,
    pub name: String,
    pub root: PathBuf,
    pub lesson_count: usize,
    pub completed_count: usize,
    pub total_bytes: u64,
    pub completed_bytes: u64,
    pub completion_ratio: f64,
    pub byte_ratio: f64,
    pub last_opened: Option<LastOpened>,
    /// False when the course folder could not be scanned.
    pub available: bool,
}

impl CourseSummary {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            id: course.id(),
            name: course.name().to_owned(),
            root: course.root().to_path_buf(),
            lesson_count: course.lesson_count(),
            completed_count: course.completed_count(),
            total_bytes: course.total_bytes(),
            completed_bytes: course.completed_bytes(),
            completion_ratio: course.completion_ratio(),
            byte_ratio: course.byte_ratio(),
            last_opened: course.last_opened().cloned(),
            available: course.is_scanned(),
        }
    }

    fn matches_query(&self, query: &str) -> bool {
        query.is_empty()
            || self.name.to_lowercase().contains(query)
            || self.root.to_string_lossy().to_lowercase().contains(query)
    }
}

/// Owns the in-memory library and keeps it in sync with the progress store.
///
/// Every mutation is applied to a copy, persisted, and only then made visible,
/// so a failed save leaves both memory and disk at the previous state.
pub struct LibraryService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    scanner: FolderScanner,
    launcher: Arc<dyn Launcher>,
    library: Mutex<Library>,
}

impl LibraryService {
    /// A service over an empty library. Nothing is read from `progress`.
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        scanner: FolderScanner,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            clock,
            progress,
            scanner,
            launcher,
            library: Mutex::new(Library::new()),
        }
    }

    /// Load persisted progress and rescan every course folder.
    ///
    /// Unreadable progress is not fatal. A corrupt document starts an empty
    /// library; unusable course records are skipped and the rest kept. Either
    /// way the stored data is copied aside first and a `StartupWarning` is
    /// returned. Courses whose folder is unavailable are kept with their stored
    /// progress untouched.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` for storage failures other than corrupt data.
    pub async fn load(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        scanner: FolderScanner,
        launcher: Arc<dyn Launcher>,
    ) -> Result<(Self, Option<StartupWarning>), LibraryError> {
        let (mut library, warning) = match progress.load().await {
            Ok(record) => {
                let restored = record.into_library(clock.now());
                if restored.is_complete() {
                    (restored.library, None)
                } else {
                    for skipped in &restored.skipped {
                        tracing::warn!(record = %skipped, "skipped unusable course record");
                    }
                    let backup = preserve_copy(progress.as_ref()).await;
                    let warning = StartupWarning::SkippedCourses {
                        skipped: restored.skipped,
                        backup,
                    };
                    (restored.library, Some(warning))
                }
            }
            Err(StorageError::Corrupt(message)) => {
                tracing::warn!(error = %message, "progress data is corrupt; starting with an empty library");
                let backup = preserve_copy(progress.as_ref()).await;
                (Library::new(), Some(StartupWarning::CorruptProgress { message, backup }))
            }
            Err(err) => return Err(err.into()),
        };

        let mut pruned = 0;
        for course in library.courses_mut() {
            match scanner.scan(course.root()) {
                Ok(sections) => pruned += course.apply_scan(sections),
                Err(err) => {
                    tracing::warn!(course_id = %course.id(), error = %err, "course folder unavailable");
                }
            }
        }
        if pruned > 0 {
            tracing::info!(pruned, "dropped progress for lessons that no longer exist");
            progress.save(&LibraryRecord::from_library(&library)).await?;
        }
        tracing::info!(courses = library.len(), "library loaded");

        let service = Self {
            clock,
            progress,
            scanner,
            launcher,
            library: Mutex::new(library),
        };
        Ok((service, warning))
    }

    /// Track the course in `folder`, returning its id.
    ///
    /// A folder that is already tracked is rescanned and keeps its id.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::FolderNotFound` if `folder` is not a directory.
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn add_course(&self, folder: &Path) -> Result<CourseId, LibraryError> {
        let root = std::path::absolute(folder).unwrap_or_else(|_| folder.to_path_buf());
        let sections = self.scanner.scan(&root)?;
        let now = self.clock.now();

        self.mutate(move |library| {
            if let Some(id) = library.find_by_root(&root).map(Course::id) {
                if let Some(course) = library.get_mut(id) {
                    course.apply_scan(sections);
                }
                tracing::info!(course_id = %id, "course already tracked; rescanned");
                return Ok(id);
            }
            let id = library.next_id();
            let mut course = Course::new(id, root, now)?;
            course.apply_scan(sections);
            tracing::info!(course_id = %id, lessons = course.lesson_count(), "course added");
            library.insert(course);
            Ok(id)
        })
        .await
    }

    /// Stop tracking a course. Files on disk are never touched.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` if the id is unknown.
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn remove_course(&self, course_id: CourseId) -> Result<(), LibraryError> {
        self.mutate(|library| {
            if library.remove(course_id).is_none() {
                return Err(LibraryError::CourseNotFound(course_id));
            }
            tracing::info!(course_id = %course_id, "course removed");
            Ok(())
        })
        .await
    }

    /// Flip a lesson's completion flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` or `LibraryError::LessonNotFound`
    /// if either is unknown to the current scan.
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn toggle_lesson(
        &self,
        course_id: CourseId,
        lesson: &LessonPath,
    ) -> Result<bool, LibraryError> {
        self.mutate(|library| {
            course_mut(library, course_id)?
                .toggle(lesson)
                .map_err(|_| lesson_not_found(course_id, lesson))
        })
        .await
    }

    /// Set a lesson's completion flag.
    ///
    /// # Errors
    ///
    /// Same as `toggle_lesson`.
    pub async fn set_lesson_completed(
        &self,
        course_id: CourseId,
        lesson: &LessonPath,
        done: bool,
    ) -> Result<(), LibraryError> {
        self.mutate(|library| {
            course_mut(library, course_id)?
                .set_completed(lesson, done)
                .map(|_| ())
                .map_err(|_| lesson_not_found(course_id, lesson))
        })
        .await
    }

    /// Fraction of lessons completed, in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` if the id is unknown.
    pub async fn completion_ratio(&self, course_id: CourseId) -> Result<f64, LibraryError> {
        let library = self.library.lock().await;
        course_ref(&library, course_id).map(Course::completion_ratio)
    }

    /// Rescan a course folder, pruning progress for lessons that disappeared.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` if the id is unknown.
    /// Returns `LibraryError::FolderNotFound` if the folder is gone.
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn rescan(&self, course_id: CourseId) -> Result<Course, LibraryError> {
        let root = self.course(course_id).await?.root().to_path_buf();
        let sections = self.scanner.scan(&root)?;
        self.mutate(|library| {
            let course = course_mut(library, course_id)?;
            let pruned = course.apply_scan(sections);
            if pruned > 0 {
                tracing::info!(course_id = %course_id, pruned, "dropped progress for vanished lessons");
            }
            Ok(course.clone())
        })
        .await
    }

    /// Snapshot of one course.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` if the id is unknown.
    pub async fn course(&self, course_id: CourseId) -> Result<Course, LibraryError> {
        let library = self.library.lock().await;
        course_ref(&library, course_id).cloned()
    }

    /// Dashboard rows, filtered by a case-insensitive match on name or folder.
    ///
    /// Most recently opened (or added, if never opened) first, then by name.
    pub async fn summaries(&self, query: &str) -> Vec<CourseSummary> {
        let query = query.trim().to_lowercase();
        let library = self.library.lock().await;
        let recency = |course: &Course| course.last_opened().map_or(course.added_at(), |last| last.at);
        let mut courses: Vec<&Course> = library.courses().iter().collect();
        courses.sort_by(|a, b| {
            recency(b)
                .cmp(&recency(a))
                .then_with(|| a.name().cmp(b.name()))
        });
        courses
            .into_iter()
            .map(CourseSummary::from_course)
            .filter(|summary| summary.matches_query(&query))
            .collect()
    }

    /// Remember whether a section of a course is folded in the course view.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` if the id is unknown.
    /// Returns `LibraryError::Course` if the section is not part of the course.
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn set_section_collapsed(
        &self,
        course_id: CourseId,
        section: &str,
        collapsed: bool,
    ) -> Result<(), LibraryError> {
        self.mutate(|library| {
            course_mut(library, course_id)?.set_section_collapsed(section, collapsed)?;
            Ok(())
        })
        .await
    }

    /// Forget every remembered collapsed section of a course.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` if the id is unknown.
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn expand_all_sections(&self, course_id: CourseId) -> Result<(), LibraryError> {
        self.mutate(|library| {
            course_mut(library, course_id)?.expand_all_sections();
            Ok(())
        })
        .await
    }

    /// Open a lesson with the system viewer and remember it as last opened.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` or `LibraryError::LessonNotFound`.
    /// Returns `LibraryError::Launch` if the viewer cannot be started.
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn open_lesson(
        &self,
        course_id: CourseId,
        lesson: &LessonPath,
    ) -> Result<(), LibraryError> {
        let now = self.clock.now();
        let launcher = Arc::clone(&self.launcher);
        self.mutate(|library| {
            let course = course_mut(library, course_id)?;
            let path = course
                .lesson(lesson)
                .ok_or_else(|| lesson_not_found(course_id, lesson))?
                .path()
                .to_fs_path(course.root());
            launcher.open(&path)?;
            course
                .record_open(lesson, now)
                .map_err(|_| lesson_not_found(course_id, lesson))
        })
        .await
    }

    /// Mark `lesson` complete and open the one after it, if any.
    ///
    /// The completion is saved even if the next lesson fails to open.
    ///
    /// # Errors
    ///
    /// Same as `set_lesson_completed` and `open_lesson`.
    pub async fn complete_and_open_next(
        &self,
        course_id: CourseId,
        lesson: &LessonPath,
    ) -> Result<Option<LessonPath>, LibraryError> {
        let next = self
            .mutate(|library| {
                let course = course_mut(library, course_id)?;
                course
                    .set_completed(lesson, true)
                    .map_err(|_| lesson_not_found(course_id, lesson))?;
                Ok(course.next_lesson_after(lesson).map(|l| l.path().clone()))
            })
            .await?;
        if let Some(next) = &next {
            self.open_lesson(course_id, next).await?;
        }
        Ok(next)
    }

    /// Resume a course: the last opened lesson, else the first incomplete one.
    ///
    /// Returns the lesson that was opened, or `None` if the course is finished
    /// and was never opened.
    ///
    /// # Errors
    ///
    /// Same as `open_lesson`.
    pub async fn continue_course(
        &self,
        course_id: CourseId,
    ) -> Result<Option<LessonPath>, LibraryError> {
        let target = {
            let library = self.library.lock().await;
            let course = course_ref(&library, course_id)?;
            course
                .last_opened()
                .map(|last| last.lesson.clone())
                .or_else(|| course.first_incomplete().map(|l| l.path().clone()))
        };
        if let Some(lesson) = &target {
            self.open_lesson(course_id, lesson).await?;
        }
        Ok(target)
    }

    /// The most recently opened lesson across the library.
    pub async fn last_opened(&self) -> Option<(CourseId, LessonPath)> {
        let library = self.library.lock().await;
        library
            .last_opened()
            .map(|(course, last)| (course.id(), last.lesson.clone()))
    }

    /// Mark the most recently opened lesson complete and open the one after it.
    ///
    /// Returns `None` if nothing was ever opened, else the course and the
    /// lesson that was opened (`None` at the end of the course).
    ///
    /// # Errors
    ///
    /// Same as `complete_and_open_next`.
    pub async fn open_next_from_last(
        &self,
    ) -> Result<Option<(CourseId, Option<LessonPath>)>, LibraryError> {
        let Some((course_id, lesson)) = self.last_opened().await else {
            return Ok(None);
        };
        let next = self.complete_and_open_next(course_id, &lesson).await?;
        Ok(Some((course_id, next)))
    }

    /// Show a course folder in the file manager.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::CourseNotFound` or `LibraryError::Launch`.
    pub async fn reveal_course(&self, course_id: CourseId) -> Result<(), LibraryError> {
        let root = self.course(course_id).await?.root().to_path_buf();
        self.launcher.reveal(&root)?;
        Ok(())
    }

    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Library) -> Result<T, LibraryError>,
    ) -> Result<T, LibraryError> {
        let mut guard = self.library.lock().await;
        let mut next = guard.clone();
        let out = apply(&mut next)?;
        self.progress
            .save(&LibraryRecord::from_library(&next))
            .await?;
        *guard = next;
        Ok(out)
    }
}

async fn preserve_copy(progress: &dyn ProgressRepository) -> Option<PathBuf> {
    match progress.preserve_copy().await {
        Ok(backup) => backup,
        Err(err) => {
            tracing::warn!(error = %err, "could not copy stored progress aside");
            None
        }
    }
}

fn course_ref(library: &Library, course_id: CourseId) -> Result<&Course, LibraryError> {
    library
        .get(course_id)
        .ok_or(LibraryError::CourseNotFound(course_id))
}

fn course_mut(library: &mut Library, course_id: CourseId) -> Result<&mut Course, LibraryError> {
    library
        .get_mut(course_id)
        .ok_or(LibraryError::CourseNotFound(course_id))
}

fn lesson_not_found(course_id: CourseId, lesson: &LessonPath) -> LibraryError {
    LibraryError::LessonNotFound {
        course_id,
        lesson: lesson.clone(),
    }
}
