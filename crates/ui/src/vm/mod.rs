mod course_card_vm;
mod course_detail_vm;
mod format;

pub use course_card_vm::{CourseCardVm, map_course_cards};
pub use course_detail_vm::{
    CourseDetailVm, LessonRowVm, RowFilter, SectionVm, map_course_detail, visible_sections,
};
pub use format::{format_bytes, format_datetime, percent};
