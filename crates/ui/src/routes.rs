use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable};

use crate::views::{AnnotateView, EntryView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", EntryView)] Entry {},
        #[route("/annotate/:task_type?:annotator_id&:language&:example_idx", AnnotateView)]
        Annotate { task_type: String, annotator_id: String, language: String, example_idx: usize },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            header { class: "topbar",
                h1 { "Annotation Workbench" }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
