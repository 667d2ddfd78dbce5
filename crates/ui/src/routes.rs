use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable, use_navigator};

use crate::context::AppContext;
use crate::views::{CourseView, LibraryView, ViewError};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", LibraryView)] Library {},
        #[route("/course/:course_id", CourseView)] Course { course_id: u64 },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let ctx = use_context::<AppContext>();
    let library = ctx.library();
    let navigator = use_navigator();
    let mut resume_error = use_signal(|| None::<ViewError>);

    let resume = {
        let library = library.clone();
        move |_: MouseEvent| {
            let library = library.clone();
            spawn(async move {
                let Some((course_id, lesson)) = library.last_opened().await else {
                    resume_error.set(Some(ViewError::NothingToResume));
                    return;
                };
                match library.open_lesson(course_id, &lesson).await {
                    Ok(()) => resume_error.set(None),
                    Err(err) => resume_error.set(Some(ViewError::from_library(&err))),
                }
            });
        }
    };

    let open_next = move |_: MouseEvent| {
        let library = library.clone();
        spawn(async move {
            match library.open_next_from_last().await {
                Ok(Some((course_id, _))) => {
                    resume_error.set(None);
                    let _ = navigator.push(Route::Course {
                        course_id: course_id.value(),
                    });
                }
                Ok(None) => resume_error.set(Some(ViewError::NothingToResume)),
                Err(err) => resume_error.set(Some(ViewError::from_library(&err))),
            }
        });
    };

    rsx! {
        nav { class: "sidebar",
            h1 { "CourseTracker" }
            ul {
                li { Link { to: Route::Library {}, "Library" } }
            }
            button {
                class: "btn sidebar-resume",
                r#type: "button",
                onclick: resume,
                "Resume last lesson"
            }
            button {
                class: "btn sidebar-next",
                r#type: "button",
                onclick: open_next,
                "Open next (from last)"
            }
            if let Some(err) = resume_error() {
                p { class: "sidebar-note", "{err.message()}" }
            }
        }
    }
}
