//! Decides which directory entries count as lessons.
//!
//! The filter is plain data so callers can extend it without touching the
//! scanner, and tests can exercise it without a filesystem.

use std::collections::BTreeSet;

const DENIED_EXTENSIONS: &[&str] = &[
    "srt", "vtt", "txt", "ass", "ssa", "sub", "idx", "nfo", "sfv", "url", "ds_store", "tmp",
];

const SYSTEM_FILES: &[&str] = &["thumbs.db", "desktop.ini"];

const IGNORED_FOLDERS: &[&str] = &["websites you may like", "sample files", "samples", "__macosx"];

const IGNORED_FOLDER_FRAGMENTS: &[&str] = &["website", "subtitle"];

/// Predicate over file and folder names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonFilter {
    denied_extensions: BTreeSet<String>,
    system_files: BTreeSet<String>,
    ignored_folders: BTreeSet<String>,
    ignored_folder_fragments: BTreeSet<String>,
}

impl Default for LessonFilter {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            denied_extensions: owned(DENIED_EXTENSIONS),
            system_files: owned(SYSTEM_FILES),
            ignored_folders: owned(IGNORED_FOLDERS),
            ignored_folder_fragments: owned(IGNORED_FOLDER_FRAGMENTS),
        }
    }
}

impl LessonFilter {
    /// A filter that only hides dot-files.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            denied_extensions: BTreeSet::new(),
            system_files: BTreeSet::new(),
            ignored_folders: BTreeSet::new(),
            ignored_folder_fragments: BTreeSet::new(),
        }
    }

    /// Deny another extension. Accepts `"srt"`, `".srt"` or `".SRT"`.
    #[must_use]
    pub fn with_denied_extension(mut self, ext: &str) -> Self {
        let ext = normalize(ext.trim_start_matches('.'));
        if !ext.is_empty() {
            self.denied_extensions.insert(ext);
        }
        self
    }

    /// Skip folders with exactly this name (case-insensitive).
    #[must_use]
    pub fn with_ignored_folder(mut self, name: &str) -> Self {
        self.ignored_folders.insert(normalize(name));
        self
    }

    /// Skip folders whose name contains this fragment (case-insensitive).
    #[must_use]
    pub fn with_ignored_folder_fragment(mut self, fragment: &str) -> Self {
        self.ignored_folder_fragments.insert(normalize(fragment));
        self
    }

    #[must_use]
    pub fn denies_extension(&self, ext: &str) -> bool {
        self.denied_extensions
            .contains(&normalize(ext.trim_start_matches('.')))
    }

    /// True when a regular file with this name should be listed as a lesson.
    #[must_use]
    pub fn is_lesson_file(&self, file_name: &str) -> bool {
        if is_hidden(file_name) {
            return false;
        }
        let lowered = normalize(file_name);
        if self.system_files.contains(&lowered) {
            return false;
        }
        match extension(&lowered) {
            Some(ext) => !self.denied_extensions.contains(ext),
            None => true,
        }
    }

    /// True when a folder and everything below it should be skipped.
    #[must_use]
    pub fn is_ignored_folder(&self, folder_name: &str) -> bool {
        if is_hidden(folder_name) {
            return true;
        }
        let lowered = normalize(folder_name);
        self.ignored_folders.contains(&lowered)
            || self
                .ignored_folder_fragments
                .iter()
                .any(|fragment| lowered.contains(fragment.as_str()))
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn extension(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}
