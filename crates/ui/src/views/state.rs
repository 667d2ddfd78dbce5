use dioxus::prelude::*;
use services::LibraryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    FolderNotFound,
    CourseNotFound,
    LessonNotFound,
    CannotOpen,
    SaveFailed,
    NothingToResume,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn from_library(err: &LibraryError) -> Self {
        tracing::warn!(error = %err, "library operation failed");
        match err {
            LibraryError::FolderNotFound(_) => Self::FolderNotFound,
            LibraryError::CourseNotFound(_) => Self::CourseNotFound,
            LibraryError::LessonNotFound { .. } => Self::LessonNotFound,
            LibraryError::Launch(_) => Self::CannotOpen,
            LibraryError::Storage(_) => Self::SaveFailed,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::FolderNotFound => "That folder does not exist or is not a folder.",
            Self::CourseNotFound => "This course is no longer in your library.",
            Self::LessonNotFound => "That lesson is gone. Try rescanning the course.",
            Self::CannotOpen => "No application could open that file.",
            Self::SaveFailed => "Progress could not be saved. Nothing was changed.",
            Self::NothingToResume => "Open a lesson first, then you can resume it here.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: &Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
