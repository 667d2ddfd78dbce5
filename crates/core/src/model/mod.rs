mod course;
mod ids;
mod lesson;
mod library;

pub use course::{Course, CourseError, LastOpened};
pub use ids::{CourseId, ParseIdError};
pub use lesson::{Lesson, LessonPath, Section};
pub use library::Library;
