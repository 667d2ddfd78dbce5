use dioxus::prelude::*;
use dioxus_router::Router;

use crate::routes::Route;

#[component]
pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: asset!("/assets/style.css") }
        document::Title { "CourseTracker" }

        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| {
                    tracing::error!(?errors, "view crashed");
                    rsx! { CrashNotice { report: format!("{errors:?}") } }
                },
                Router::<Route> {}
            }
        }
    }
}

/// Shown in place of the app when a view fails to render.
///
/// Progress is written before any view updates, so nothing is lost.
#[component]
fn CrashNotice(report: String) -> Element {
    rsx! {
        div { class: "fatal",
            h1 { "CourseTracker ran into a problem" }
            p { "Your course progress is already saved. Restart CourseTracker to keep going." }
            details {
                summary { "Technical details" }
                pre { "{report}" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_notice_reassures_about_progress() {
        let mut dom = VirtualDom::new_with_props(
            CrashNotice,
            CrashNoticeProps {
                report: "lesson list failed".into(),
            },
        );
        dom.rebuild_in_place();
        let html = dioxus_ssr::render(&dom);

        assert!(html.contains("CourseTracker ran into a problem"));
        assert!(html.contains("progress is already saved"));
        assert!(html.contains("lesson list failed"));
        assert!(!html.contains("Something went wrong"));
    }
}
