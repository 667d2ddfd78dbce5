use std::path::PathBuf;

use course_core::model::CourseId;
use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{CourseCardVm, map_course_cards};

#[derive(Clone, Debug, PartialEq)]
struct LibraryData {
    cards: Vec<CourseCardVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingRemoval {
    id: u64,
    name: String,
}

#[component]
pub fn LibraryView() -> Element {
    let ctx = use_context::<AppContext>();
    let library = ctx.library();
    let startup_warning = ctx.startup_warning().map(str::to_owned);

    let mut search = use_signal(String::new);
    let mut folder_input = use_signal(String::new);
    let mut action_error = use_signal(|| None::<ViewError>);
    let mut pending_removal = use_signal(|| None::<PendingRemoval>);
    let mut adding = use_signal(|| false);

    let mut resource = {
        let library = library.clone();
        use_resource(move || {
            let library = library.clone();
            let query = search();
            async move {
                let summaries = library.summaries(&query).await;
                Ok::<_, ViewError>(LibraryData {
                    cards: map_course_cards(&summaries),
                })
            }
        })
    };

    let add_course = {
        let library = library.clone();
        use_callback(move |()| {
            let library = library.clone();
            let raw = folder_input.read().trim().to_owned();
            if raw.is_empty() || adding() {
                return;
            }
            spawn(async move {
                adding.set(true);
                match library.add_course(&PathBuf::from(&raw)).await {
                    Ok(_) => {
                        folder_input.set(String::new());
                        action_error.set(None);
                        resource.restart();
                    }
                    Err(err) => action_error.set(Some(ViewError::from_library(&err))),
                }
                adding.set(false);
            });
        })
    };

    let browse = use_callback(move |()| {
        spawn(async move {
            let picked = rfd::AsyncFileDialog::new()
                .set_title("Choose a course folder")
                .pick_folder()
                .await;
            if let Some(folder) = picked {
                folder_input.set(folder.path().display().to_string());
            }
        });
    });

    let continue_course = {
        let library = library.clone();
        use_callback(move |id: u64| {
            let library = library.clone();
            spawn(async move {
                match library.continue_course(CourseId::new(id)).await {
                    Ok(_) => {
                        action_error.set(None);
                        resource.restart();
                    }
                    Err(err) => action_error.set(Some(ViewError::from_library(&err))),
                }
            });
        })
    };

    let reveal = {
        let library = library.clone();
        use_callback(move |id: u64| {
            let library = library.clone();
            spawn(async move {
                if let Err(err) = library.reveal_course(CourseId::new(id)).await {
                    action_error.set(Some(ViewError::from_library(&err)));
                }
            });
        })
    };

    let confirm_removal = {
        let library = library.clone();
        use_callback(move |()| {
            let library = library.clone();
            let Some(target) = pending_removal() else {
                return;
            };
            spawn(async move {
                match library.remove_course(CourseId::new(target.id)).await {
                    Ok(()) => action_error.set(None),
                    Err(err) => action_error.set(Some(ViewError::from_library(&err))),
                }
                pending_removal.set(None);
                resource.restart();
            });
        })
    };

    let ask_removal = use_callback(move |(id, name): (u64, String)| {
        pending_removal.set(Some(PendingRemoval { id, name }));
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page library",
            h2 { "Library" }

            if let Some(warning) = startup_warning {
                div { class: "banner banner--warning", "{warning}" }
            }
            if let Some(err) = action_error() {
                div { class: "banner banner--error",
                    span { "{err.message()}" }
                    button {
                        class: "banner-dismiss",
                        r#type: "button",
                        onclick: move |_| action_error.set(None),
                        "Dismiss"
                    }
                }
            }

            form {
                class: "add-course",
                onsubmit: move |evt| {
                    evt.prevent_default();
                    add_course.call(());
                },
                input {
                    class: "add-course-input",
                    r#type: "text",
                    placeholder: "Course folder",
                    value: "{folder_input}",
                    oninput: move |evt| folder_input.set(evt.value()),
                }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| browse.call(()),
                    "Browse…"
                }
                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: adding() || folder_input.read().trim().is_empty(),
                    "Add course"
                }
            }

            input {
                class: "library-search",
                r#type: "search",
                placeholder: "Search courses",
                value: "{search}",
                oninput: move |evt| search.set(evt.value()),
            }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => rsx! {
                    if data.cards.is_empty() {
                        if search.read().trim().is_empty() {
                            p { class: "empty", "No courses yet. Add a folder to get started." }
                        } else {
                            p { class: "empty", "No courses match your search." }
                        }
                    } else {
                        ul { class: "course-grid",
                            for card in data.cards {
                                CourseCard {
                                    card,
                                    on_continue: continue_course,
                                    on_reveal: reveal,
                                    on_remove: ask_removal,
                                }
                            }
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { "{err.message()}" }
                    button {
                        class: "btn",
                        r#type: "button",
                        onclick: move |_| resource.restart(),
                        "Retry"
                    }
                },
            }

            if let Some(target) = pending_removal() {
                RemoveCourseModal {
                    name: target.name,
                    on_cancel: move |()| pending_removal.set(None),
                    on_confirm: confirm_removal,
                }
            }
        }
    }
}

#[component]
fn CourseCard(
    card: CourseCardVm,
    on_continue: Callback<u64>,
    on_reveal: Callback<u64>,
    on_remove: Callback<(u64, String)>,
) -> Element {
    let id = card.id;
    let name = card.name.clone();
    rsx! {
        li { class: if card.available { "course-card" } else { "course-card course-card--missing" },
            h3 { class: "course-card-title", "{card.name}" }
            p { class: "course-card-path", title: "{card.root_str}", "{card.root_str}" }
            if !card.available {
                p { class: "course-card-warning", "Folder unavailable" }
            }
            ProgressBar { percent: card.percent }
            p { class: "course-card-stats",
                "{card.percent}% · {card.lessons_label} · {card.bytes_label}"
            }
            if let Some(last) = card.last_opened_str.clone() {
                p { class: "course-card-last", "Last opened: {last}" }
            }
            div { class: "course-card-actions",
                Link { class: "btn btn-primary", to: Route::Course { course_id: id }, "Open" }
                button {
                    class: "btn",
                    r#type: "button",
                    disabled: !card.available,
                    onclick: move |_| on_continue.call(id),
                    "Continue"
                }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| on_reveal.call(id),
                    "Folder"
                }
                button {
                    class: "btn btn-danger",
                    r#type: "button",
                    onclick: move |_| on_remove.call((id, name.clone())),
                    "Remove"
                }
            }
        }
    }
}

#[component]
pub(crate) fn ProgressBar(percent: u32) -> Element {
    rsx! {
        div { class: "progress",
            div { class: "progress-fill", style: "width: {percent}%" }
        }
    }
}

#[component]
fn RemoveCourseModal(name: String, on_cancel: Callback<()>, on_confirm: Callback<()>) -> Element {
    rsx! {
        div {
            class: "modal-overlay",
            onclick: move |_| on_cancel.call(()),
            div {
                class: "modal",
                onclick: move |evt| evt.stop_propagation(),
                h3 { class: "modal-title", "Remove course?" }
                p { class: "modal-body",
                    "“{name}” and its progress will be removed from the library. Files on disk are not touched."
                }
                div { class: "modal-actions",
                    button {
                        class: "btn",
                        r#type: "button",
                        onclick: move |_| on_cancel.call(()),
                        "Cancel"
                    }
                    button {
                        class: "btn btn-danger",
                        r#type: "button",
                        onclick: move |_| on_confirm.call(()),
                        "Remove"
                    }
                }
            }
        }
    }
}
