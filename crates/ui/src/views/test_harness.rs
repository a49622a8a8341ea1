use std::path::PathBuf;
use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};

use annotate_core::time::fixed_clock;
use services::dataset::InMemoryDatasetSource;
use services::{AppServices, ProgressService, RemoteSyncService, SessionWorkflow};
use storage::repository::Storage;

use annotate_core::model::Example;

use crate::context::{UiApp, build_app_context};
use crate::views::{AnnotateView, EntryView};

#[derive(Clone)]
struct TestApp {
    workflow: Arc<SessionWorkflow>,
    progress: Arc<ProgressService>,
    sync: Arc<RemoteSyncService>,
    export_dir: PathBuf,
}

impl UiApp for TestApp {
    fn workflow(&self) -> Arc<SessionWorkflow> {
        Arc::clone(&self.workflow)
    }

    fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    fn sync(&self) -> Arc<RemoteSyncService> {
        Arc::clone(&self.sync)
    }

    fn export_dir(&self) -> PathBuf {
        self.export_dir.clone()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ViewKind {
    Entry,
    Annotate {
        task_type: String,
        annotator_id: String,
        language: String,
        example_idx: usize,
    },
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

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view.clone());
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
        ViewKind::Entry => rsx! { EntryView {} },
        ViewKind::Annotate {
            task_type,
            annotator_id,
            language,
            example_idx,
        } => rsx! {
            AnnotateView { task_type, annotator_id, language, example_idx }
        },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub storage: Storage,
    pub services: AppServices,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// Builds a harness over in-memory storage. For annotation views the given
/// examples become the dataset of the requested task/language pair.
pub async fn setup_view_harness(view: ViewKind, examples: Vec<Example>) -> ViewHarness {
    setup_view_harness_with_storage(view, examples, Storage::in_memory()).await
}

pub async fn setup_view_harness_with_storage(
    view: ViewKind,
    examples: Vec<Example>,
    storage: Storage,
) -> ViewHarness {
    let dataset = InMemoryDatasetSource::new();
    if let ViewKind::Annotate {
        task_type,
        language,
        ..
    } = &view
    {
        let task = task_type.parse().expect("valid task type");
        let lang = language.parse().expect("valid language");
        dataset.insert(task, lang, examples);
    }

    let services = AppServices::from_storage(&storage, fixed_clock(), Arc::new(dataset))
        .with_sync(RemoteSyncService::new(None));
    let app = Arc::new(TestApp {
        workflow: services.workflow(),
        progress: services.progress(),
        sync: services.sync(),
        export_dir: std::env::temp_dir().join("annotate-ui-tests"),
    });

    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness {
        dom,
        storage,
        services,
    }
}
