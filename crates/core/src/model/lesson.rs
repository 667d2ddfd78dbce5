use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Identity of a lesson: its path relative to the course root.
///
/// Always `/`-separated so persisted progress survives moving between hosts.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonPath(String);

impl LessonPath {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw: String = raw.into();
        let joined = raw
            .split(['/', '\\'])
            .filter(|part| !part.is_empty() && *part != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Build from a path already relative to the course root.
    #[must_use]
    pub fn from_relative(path: &Path) -> Self {
        let parts: Vec<String> = path
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Self(parts.join("/"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Absolute location of this lesson under `root`.
    #[must_use]
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl fmt::Debug for LessonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonPath({:?})", self.0)
    }
}

impl fmt::Display for LessonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LessonPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for LessonPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A single eligible file in a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    path: LessonPath,
    name: String,
    size_bytes: u64,
}

impl Lesson {
    #[must_use]
    pub fn new(path: LessonPath, size_bytes: u64) -> Self {
        let name = path.file_name().to_string();
        Self {
            path,
            name,
            size_bytes,
        }
    }

    #[must_use]
    pub fn path(&self) -> &LessonPath {
        &self.path
    }

    /// Display name: the file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Lessons grouped by the folder they live in.
///
/// `name` is `None` for files directly under the course root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: Option<String>,
    lessons: Vec<Lesson>,
}

impl Section {
    #[must_use]
    pub fn new(name: Option<String>, lessons: Vec<Lesson>) -> Self {
        Self { name, lessons }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Stable key for remembered UI state; the root section is `""`.
    #[must_use]
    pub fn key(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn push(&mut self, lesson: Lesson) {
        self.lessons.push(lesson);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_path_normalizes_separators() {
        assert_eq!(LessonPath::new("01 Basics\\intro.mp4").as_str(), "01 Basics/intro.mp4");
        assert_eq!(LessonPath::new("./a//b.pdf").as_str(), "a/b.pdf");
    }

    #[test]
    fn lesson_path_from_relative_path() {
        let rel = Path::new("Module 1").join("lab.pdf");
        let path = LessonPath::from_relative(&rel);
        assert_eq!(path.as_str(), "Module 1/lab.pdf");
        assert_eq!(path.file_name(), "lab.pdf");
    }

    #[test]
    fn fs_path_joins_under_root() {
        let root = Path::new("courses").join("rust");
        let path = LessonPath::new("m1/intro.mp4");
        assert_eq!(path.to_fs_path(&root), root.join("m1").join("intro.mp4"));
    }

    #[test]
    fn lesson_name_is_file_name() {
        let lesson = Lesson::new(LessonPath::new("m1/01-intro.mp4"), 10);
        assert_eq!(lesson.name(), "01-intro.mp4");
        assert_eq!(lesson.size_bytes(), 10);
    }
}
