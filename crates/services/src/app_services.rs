use std::path::Path;
use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::LibraryError;
use crate::launcher::{Launcher, SystemLauncher};
use crate::library_service::{LibraryService, StartupWarning};
use crate::scanner::FolderScanner;

/// Assembles app-facing services.
#[derive(Clone)]
pub struct AppServices {
    library: Arc<LibraryService>,
    startup_warning: Option<StartupWarning>,
}

impl AppServices {
    /// Build services backed by a JSON progress file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if stored progress cannot be read for a reason
    /// other than corrupt content.
    pub async fn new_json(path: &Path, clock: Clock) -> Result<Self, LibraryError> {
        Self::from_storage(
            Storage::json(path),
            clock,
            FolderScanner::default(),
            Arc::new(SystemLauncher),
        )
        .await
    }

    /// Build services over any storage backend and launcher.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if loading the library fails.
    pub async fn from_storage(
        storage: Storage,
        clock: Clock,
        scanner: FolderScanner,
        launcher: Arc<dyn Launcher>,
    ) -> Result<Self, LibraryError> {
        let (library, startup_warning) =
            LibraryService::load(clock, storage.progress, scanner, launcher).await?;
        Ok(Self {
            library: Arc::new(library),
            startup_warning,
        })
    }

    #[must_use]
    pub fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }

    #[must_use]
    pub fn startup_warning(&self) -> Option<&StartupWarning> {
        self.startup_warning.as_ref()
    }
}
