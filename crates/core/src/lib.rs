#![forbid(unsafe_code)]

pub mod filter;
pub mod model;
pub mod order;
pub mod time;

pub use filter::LessonFilter;
pub use order::natural_cmp;
pub use time::Clock;
