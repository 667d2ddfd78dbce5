use std::sync::Arc;

use services::LibraryService;

pub trait UiApp: Send + Sync {
    fn library(&self) -> Arc<LibraryService>;

    /// Shown once at the top of the dashboard, e.g. after corrupt progress was reset.
    fn startup_warning(&self) -> Option<String>;
}

#[derive(Clone)]
pub struct AppContext {
    library: Arc<LibraryService>,
    startup_warning: Option<String>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            library: app.library(),
            startup_warning: app.startup_warning(),
        }
    }

    #[must_use]
    pub fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }

    #[must_use]
    pub fn startup_warning(&self) -> Option<&str> {
        self.startup_warning.as_deref()
    }
}

// Provided by the composition root in `crates/app`.

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
