//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use course_core::model::{CourseError, CourseId, LessonPath};
use storage::repository::StorageError;

/// Errors emitted by `FolderScanner`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanError {
    #[error("folder not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("cannot read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

/// Errors emitted by a `Launcher`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LaunchError {
    #[error("cannot open {}: it does not exist", .path.display())]
    Missing { path: PathBuf },
    #[error("no application could open {}: {reason}", .path.display())]
    NoHandler { path: PathBuf, reason: String },
}

/// Errors emitted by `LibraryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibraryError {
    #[error("course folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("lesson {lesson} not found in course {course_id}")]
    LessonNotFound {
        course_id: CourseId,
        lesson: LessonPath,
    },
    #[error(transparent)]
    Scan(ScanError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Course(#[from] CourseError),
}

impl LibraryError {
    /// True for a missing folder, course or lesson.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LibraryError::FolderNotFound(_)
                | LibraryError::CourseNotFound(_)
                | LibraryError::LessonNotFound { .. }
        )
    }
}

impl From<ScanError> for LibraryError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::NotFound { path } => LibraryError::FolderNotFound(path),
            other => LibraryError::Scan(other),
        }
    }
}
