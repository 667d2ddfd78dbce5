//! Turns a course folder into an ordered list of lessons.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use course_core::LessonFilter;
use course_core::model::{Lesson, LessonPath, Section};
use course_core::natural_cmp;
use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;

/// Root files plus one level of subfolders.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Walks course folders with an injected `LessonFilter`.
#[derive(Debug, Clone)]
pub struct FolderScanner {
    filter: LessonFilter,
    max_depth: usize,
}

impl Default for FolderScanner {
    fn default() -> Self {
        Self::new(LessonFilter::default())
    }
}

impl FolderScanner {
    #[must_use]
    pub fn new(filter: LessonFilter) -> Self {
        Self {
            filter,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// How deep below the root files are picked up. `1` means root files only.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Validate `root` and prepare a walk over it.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::NotFound` if `root` is missing or not a directory.
    pub fn open(&self, root: &Path) -> Result<FolderScan, ScanError> {
        let meta = fs::metadata(root).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ScanError::NotFound {
                path: root.to_path_buf(),
            },
            _ => ScanError::Io {
                path: root.to_path_buf(),
                message: err.to_string(),
            },
        })?;
        if !meta.is_dir() {
            return Err(ScanError::NotFound {
                path: root.to_path_buf(),
            });
        }
        Ok(FolderScan {
            root: root.to_path_buf(),
            filter: self.filter.clone(),
            max_depth: self.max_depth,
        })
    }

    /// Scan `root` into sections.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::NotFound` if `root` is missing or not a directory.
    pub fn scan(&self, root: &Path) -> Result<Vec<Section>, ScanError> {
        let scan = self.open(root)?;
        let sections = scan.sections();
        tracing::debug!(
            root = %root.display(),
            sections = sections.len(),
            lessons = sections.iter().map(|s| s.lessons().len()).sum::<usize>(),
            "folder scanned"
        );
        Ok(sections)
    }
}

/// One eligible file found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: LessonPath,
    /// Immediate subfolder holding the file, `None` for root files.
    pub section: Option<String>,
    pub size_bytes: u64,
}

/// A validated course folder. Nothing is read until lessons are iterated.
#[derive(Debug, Clone)]
pub struct FolderScan {
    root: PathBuf,
    filter: LessonFilter,
    max_depth: usize,
}

impl FolderScan {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the folder. Every call starts a fresh walk.
    ///
    /// Root files come first, then each subfolder in natural name order.
    pub fn lessons(&self) -> impl Iterator<Item = ScannedFile> + '_ {
        let filter = &self.filter;
        let root = self.root.as_path();
        WalkDir::new(root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .follow_links(false)
            .sort_by(entry_order)
            .into_iter()
            .filter_entry(move |entry| keep_entry(filter, entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| scanned_file(root, &entry))
    }

    /// Collect the walk into sections, root section first.
    #[must_use]
    pub fn sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        for file in self.lessons() {
            let lesson = Lesson::new(file.path, file.size_bytes);
            match sections.last_mut() {
                Some(section) if section.name() == file.section.as_deref() => section.push(lesson),
                _ => sections.push(Section::new(file.section, vec![lesson])),
            }
        }
        sections
    }
}

fn entry_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| natural_cmp(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy()))
}

fn keep_entry(filter: &LessonFilter, entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if entry.file_type().is_dir() {
        !filter.is_ignored_folder(&name)
    } else {
        filter.is_lesson_file(&name)
    }
}

fn scanned_file(root: &Path, entry: &DirEntry) -> Option<ScannedFile> {
    let relative = entry.path().strip_prefix(root).ok()?;
    let section = if entry.depth() > 1 {
        relative.components().next().and_then(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
    } else {
        None
    };
    let size_bytes = entry.metadata().map(|meta| meta.len()).unwrap_or(0);
    Some(ScannedFile {
        path: LessonPath::from_relative(relative),
        section,
        size_bytes,
    })
}
