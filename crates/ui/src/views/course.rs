use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use course_core::model::{CourseId, LessonPath};
use dioxus::prelude::*;
use dioxus_router::Link;
use services::{LibraryError, LibraryService};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::library::ProgressBar;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    CourseDetailVm, LessonRowVm, RowFilter, SectionVm, map_course_detail, visible_sections,
};

async fn load_detail(
    library: &LibraryService,
    course_id: CourseId,
) -> Result<CourseDetailVm, ViewError> {
    library
        .course(course_id)
        .await
        .map(|course| map_course_detail(&course))
        .map_err(|err| ViewError::from_library(&err))
}

/// Rescan then load; an unavailable folder still shows the stored progress.
async fn scan_and_load(
    library: &LibraryService,
    course_id: CourseId,
) -> Result<CourseDetailVm, ViewError> {
    match library.rescan(course_id).await {
        Ok(course) => Ok(map_course_detail(&course)),
        Err(LibraryError::FolderNotFound(_)) => load_detail(library, course_id).await,
        Err(err) => Err(ViewError::from_library(&err)),
    }
}

/// Run a service call, then refresh the course snapshot shown by the view.
fn spawn_action<F, Fut>(
    library: Arc<LibraryService>,
    course_id: CourseId,
    mut fresh: Signal<Option<CourseDetailVm>>,
    mut action_error: Signal<Option<ViewError>>,
    op: F,
) where
    F: FnOnce(Arc<LibraryService>) -> Fut + 'static,
    Fut: Future<Output = Result<(), LibraryError>> + 'static,
{
    spawn(async move {
        match op(Arc::clone(&library)).await {
            Ok(()) => action_error.set(None),
            Err(err) => action_error.set(Some(ViewError::from_library(&err))),
        }
        match load_detail(&library, course_id).await {
            Ok(vm) => fresh.set(Some(vm)),
            Err(err) => action_error.set(Some(err)),
        }
    });
}

#[component]
pub fn CourseView(course_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let library = ctx.library();
    let id = CourseId::new(course_id);

    let mut fresh = use_signal(|| None::<CourseDetailVm>);
    let mut action_error = use_signal(|| None::<ViewError>);
    let mut hide_completed = use_signal(|| false);
    let mut name_filter = use_signal(String::new);
    // "Collapse all" folds sections for this visit only.
    let mut folded_for_now = use_signal(BTreeSet::<String>::new);

    let mut resource = {
        let library = library.clone();
        use_resource(move || {
            let library = library.clone();
            async move { scan_and_load(&library, id).await }
        })
    };

    let toggle = {
        let library = library.clone();
        use_callback(move |path: String| {
            spawn_action(library.clone(), id, fresh, action_error, move |library| async move {
                library
                    .toggle_lesson(id, &LessonPath::new(path))
                    .await
                    .map(|_| ())
            });
        })
    };

    let open = {
        let library = library.clone();
        use_callback(move |path: String| {
            spawn_action(library.clone(), id, fresh, action_error, move |library| async move {
                library.open_lesson(id, &LessonPath::new(path)).await
            });
        })
    };

    let done_next = {
        let library = library.clone();
        use_callback(move |path: String| {
            spawn_action(library.clone(), id, fresh, action_error, move |library| async move {
                library
                    .complete_and_open_next(id, &LessonPath::new(path))
                    .await
                    .map(|_| ())
            });
        })
    };

    let reveal = {
        let library = library.clone();
        move |_: MouseEvent| {
            let library = library.clone();
            spawn(async move {
                if let Err(err) = library.reveal_course(id).await {
                    action_error.set(Some(ViewError::from_library(&err)));
                }
            });
        }
    };

    let toggle_section = {
        let library = library.clone();
        use_callback(move |(key, collapse): (String, bool)| {
            folded_for_now.write().remove(&key);
            spawn_action(library.clone(), id, fresh, action_error, move |library| async move {
                library.set_section_collapsed(id, &key, collapse).await
            });
        })
    };

    let expand_all = {
        let library = library.clone();
        move |_: MouseEvent| {
            folded_for_now.write().clear();
            spawn_action(library.clone(), id, fresh, action_error, move |library| async move {
                library.expand_all_sections(id).await
            });
        }
    };

    let state = match fresh() {
        Some(vm) => ViewState::Ready(vm),
        None => view_state_from_resource(&resource),
    };

    let collapse_all = {
        let keys: BTreeSet<String> = match &state {
            ViewState::Ready(vm) => vm.sections.iter().map(|s| s.key.clone()).collect(),
            _ => BTreeSet::new(),
        };
        move |_: MouseEvent| folded_for_now.set(keys.clone())
    };

    let filter = RowFilter::new(hide_completed(), &name_filter.read());

    rsx! {
        div { class: "page course",
            div { class: "course-toolbar",
                Link { class: "btn", to: Route::Library {}, "← Back" }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| {
                        fresh.set(None);
                        resource.restart();
                    },
                    "Rescan"
                }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: reveal,
                    "Folder"
                }
            }

            div { class: "course-filters",
                input {
                    class: "course-filter",
                    r#type: "search",
                    placeholder: "Filter files by name...",
                    value: "{name_filter}",
                    oninput: move |evt: FormEvent| name_filter.set(evt.value()),
                }
                label { class: "course-hide-completed",
                    input {
                        r#type: "checkbox",
                        checked: hide_completed(),
                        onchange: move |_| hide_completed.toggle(),
                    }
                    "Hide completed"
                }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: expand_all,
                    "Expand all"
                }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: collapse_all,
                    "Collapse all"
                }
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

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(vm) => rsx! {
                    CourseHeader { vm: vm.clone() }
                    if vm.sections.is_empty() && vm.available {
                        p { class: "empty", "This folder has no lessons." }
                    } else if filter.is_active() && visible_sections(&vm.sections, &filter).is_empty() {
                        p { class: "empty", "No lessons match." }
                    }
                    for section in visible_sections(&vm.sections, &filter) {
                        SectionBlock {
                            folded_for_now,
                            section,
                            on_toggle_section: toggle_section,
                            on_toggle: toggle,
                            on_open: open,
                            on_done_next: done_next,
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
        }
    }
}

#[component]
fn CourseHeader(vm: CourseDetailVm) -> Element {
    rsx! {
        header { class: "course-header",
            h2 { "{vm.name}" }
            p { class: "course-path", "{vm.root_str}" }
            if !vm.available {
                div { class: "banner banner--warning",
                    "The course folder is unavailable. Showing saved progress only."
                }
            }
            ProgressBar { percent: vm.percent }
            p { class: "course-stats",
                "{vm.percent}% · {vm.progress_label} · {vm.bytes_label}"
            }
            if let Some(last) = vm.last_opened_str {
                p { class: "course-last", "Last opened: {last}" }
            }
        }
    }
}

#[component]
fn SectionBlock(
    section: SectionVm,
    folded_for_now: Signal<BTreeSet<String>>,
    on_toggle_section: Callback<(String, bool)>,
    on_toggle: Callback<String>,
    on_open: Callback<String>,
    on_done_next: Callback<String>,
) -> Element {
    let key = section.key.clone();
    let collapsed = section.collapsed || folded_for_now.read().contains(&section.key);
    let rows = section.lessons;
    rsx! {
        section { class: "course-section",
            button {
                class: if collapsed {
                    "course-section-header course-section-header--collapsed"
                } else {
                    "course-section-header"
                },
                r#type: "button",
                onclick: move |_| on_toggle_section.call((key.clone(), !collapsed)),
                span { class: "course-section-title", "{section.title}" }
                span { class: "course-section-count", "{section.done} / {section.total}" }
            }
            if !collapsed {
                ul { class: "lesson-list",
                    for row in rows {
                        LessonRow { row, on_toggle, on_open, on_done_next }
                    }
                }
            }
        }
    }
}

#[component]
fn LessonRow(
    row: LessonRowVm,
    on_toggle: Callback<String>,
    on_open: Callback<String>,
    on_done_next: Callback<String>,
) -> Element {
    let toggle_path = row.path.clone();
    let open_path = row.path.clone();
    let next_path = row.path.clone();
    let class = match (row.completed, row.last_opened) {
        (_, true) => "lesson-row lesson-row--last",
        (true, false) => "lesson-row lesson-row--done",
        (false, false) => "lesson-row",
    };
    rsx! {
        li { class: "{class}",
            input {
                r#type: "checkbox",
                checked: row.completed,
                onchange: move |_| on_toggle.call(toggle_path.clone()),
            }
            span { class: "lesson-name", title: "{row.path}", "{row.name}" }
            span { class: "lesson-size", "{row.size_str}" }
            button {
                class: "btn",
                r#type: "button",
                onclick: move |_| on_open.call(open_path.clone()),
                "Open"
            }
            button {
                class: "btn",
                r#type: "button",
                disabled: row.completed,
                onclick: move |_| on_done_next.call(next_path.clone()),
                "Done & next"
            }
        }
    }
}
