#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod launcher;
pub mod library_service;
pub mod scanner;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use error::{LaunchError, LibraryError, ScanError};
pub use launcher::{LaunchRequest, Launcher, RecordingLauncher, SystemLauncher};
pub use library_service::{CourseSummary, LibraryService, StartupWarning};
pub use scanner::{FolderScan, FolderScanner, ScannedFile};
