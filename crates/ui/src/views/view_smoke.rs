use course_core::model::{CourseId, LessonPath};

use super::test_harness::{HarnessSetup, ViewKind, setup_view_harness};

const SCENARIO: &[&str] = &["01-intro.mp4", "01-intro.srt", "notes.txt", "02-lab.pdf"];
const SECTIONED: &[&str] = &["01-intro.mp4", "Week 2/03-traits.mp4", "Week 2/03-traits.srt"];

fn one_course() -> HarnessSetup {
    HarnessSetup {
        courses: vec![("Rust Basics", SCENARIO)],
        startup_warning: None,
    }
}

#[tokio::test(flavor = "current_thread")]
async fn library_view_renders_course_card() {
    let mut harness = setup_view_harness(one_course(), |_| ViewKind::Library).await;
    let html = harness.render_settled().await;

    assert!(html.contains("Rust Basics"), "missing course name in {html}");
    assert!(html.contains("0 / 2 lessons"), "missing counts in {html}");
    assert!(html.contains("Continue"), "missing continue in {html}");
    assert!(html.contains("Remove"), "missing remove in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn library_view_reflects_progress() {
    let mut harness = setup_view_harness(one_course(), |_| ViewKind::Library).await;
    harness
        .library
        .toggle_lesson(CourseId::new(1), &LessonPath::new("01-intro.mp4"))
        .await
        .unwrap();

    let html = harness.render_settled().await;
    assert!(html.contains("1 / 2 lessons"), "missing counts in {html}");
    assert!(html.contains("50%"), "missing percent in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn library_view_shows_empty_state_and_warning() {
    let setup = HarnessSetup {
        courses: Vec::new(),
        startup_warning: Some("Saved progress could not be read".into()),
    };
    let mut harness = setup_view_harness(setup, |_| ViewKind::Library).await;
    let html = harness.render_settled().await;

    assert!(html.contains("No courses yet"), "missing empty state in {html}");
    assert!(
        html.contains("Saved progress could not be read"),
        "missing warning in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn course_view_lists_lessons_by_section() {
    let setup = HarnessSetup {
        courses: vec![("Rust Basics", SECTIONED)],
        startup_warning: None,
    };
    let mut harness =
        setup_view_harness(setup, |ids| ViewKind::Course(ids[0].value())).await;
    let html = harness.render_settled().await;

    assert!(html.contains("Rust Basics"), "missing title in {html}");
    assert!(html.contains("01-intro.mp4"), "missing root lesson in {html}");
    assert!(html.contains("Week 2"), "missing section in {html}");
    assert!(html.contains("03-traits.mp4"), "missing section lesson in {html}");
    assert!(!html.contains("03-traits.srt"), "subtitle listed in {html}");
    assert!(html.contains("Rescan"), "missing rescan in {html}");
    assert!(harness.launcher.requests().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn course_view_highlights_last_opened() {
    let mut harness =
        setup_view_harness(one_course(), |ids| ViewKind::Course(ids[0].value())).await;
    harness
        .library
        .open_lesson(CourseId::new(1), &LessonPath::new("02-lab.pdf"))
        .await
        .unwrap();

    let html = harness.render_settled().await;
    assert!(html.contains("lesson-row--last"), "missing highlight in {html}");
    assert!(html.contains("Last opened: 02-lab.pdf"), "missing last opened in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn course_view_unknown_course_renders_error() {
    let mut harness = setup_view_harness(one_course(), |_| ViewKind::Course(99)).await;
    let html = harness.render_settled().await;

    assert!(
        html.contains("no longer in your library"),
        "missing error in {html}"
    );
    assert!(html.contains("Retry"), "missing retry in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn course_view_restores_folded_sections() {
    let setup = HarnessSetup {
        courses: vec![("Rust Basics", SECTIONED)],
        startup_warning: None,
    };
    let mut harness =
        setup_view_harness(setup, |ids| ViewKind::Course(ids[0].value())).await;
    harness
        .library
        .set_section_collapsed(CourseId::new(1), "Week 2", true)
        .await
        .unwrap();

    let html = harness.render_settled().await;
    assert!(html.contains("course-section-header--collapsed"), "not folded in {html}");
    assert!(html.contains("Week 2"), "missing section in {html}");
    assert!(!html.contains("03-traits.mp4"), "folded lesson listed in {html}");
    assert!(html.contains("01-intro.mp4"), "missing root lesson in {html}");
    assert!(html.contains("Filter files by name"), "missing filter in {html}");
    assert!(html.contains("Expand all"), "missing expand all in {html}");
    assert!(html.contains("Collapse all"), "missing collapse all in {html}");
}
