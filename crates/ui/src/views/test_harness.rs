use std::fs;
use std::sync::Arc;

use course_core::model::CourseId;
use course_core::time::fixed_now;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{Clock, FolderScanner, LibraryService, RecordingLauncher};
use storage::repository::InMemoryRepository;

use crate::context::{UiApp, build_app_context};
use crate::views::{CourseView, LibraryView};

struct TestApp {
    library: Arc<LibraryService>,
    startup_warning: Option<String>,
}

impl UiApp for TestApp {
    fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }

    fn startup_warning(&self) -> Option<String> {
        self.startup_warning.clone()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Library,
    Course(u64),
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Library => rsx! { LibraryView {} },
        ViewKind::Course(course_id) => rsx! { CourseView { course_id } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub library: Arc<LibraryService>,
    pub launcher: Arc<RecordingLauncher>,
    _courses: tempfile::TempDir,
}

impl ViewHarness {
    pub async fn render_settled(&mut self) -> String {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
        for _ in 0..5 {
            self.drive_async().await;
        }
        dioxus_ssr::render(&self.dom)
    }

    async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }
}

fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub struct HarnessSetup {
    pub courses: Vec<(&'static str, &'static [&'static str])>,
    pub startup_warning: Option<String>,
}

pub async fn setup_view_harness(
    setup: HarnessSetup,
    view: impl FnOnce(&[CourseId]) -> ViewKind,
) -> ViewHarness {
    let launcher = Arc::new(RecordingLauncher::new());
    let library = Arc::new(LibraryService::new(
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryRepository::new()),
        FolderScanner::default(),
        launcher.clone(),
    ));

    let courses = tempfile::tempdir().expect("tempdir");
    let mut ids = Vec::new();
    for (name, files) in &setup.courses {
        let root = courses.path().join(name);
        fs::create_dir_all(&root).expect("mkdir");
        for file in *files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(&path, b"lesson").expect("write");
        }
        ids.push(library.add_course(&root).await.expect("add course"));
    }

    let app = Arc::new(TestApp {
        library: Arc::clone(&library),
        startup_warning: setup.startup_warning,
    });
    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app,
            view: view(&ids),
        },
    );

    ViewHarness {
        dom,
        library,
        launcher,
        _courses: courses,
    }
}
