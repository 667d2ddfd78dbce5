mod course;
mod library;
mod state;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use course::CourseView;
pub use library::LibraryView;
pub use state::{ViewError, ViewState, view_state_from_resource};
