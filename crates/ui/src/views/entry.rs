use dioxus::prelude::*;
use dioxus_router::use_navigator;

use annotate_core::model::{Language, ScopeError, SessionScope, TaskType};

use crate::routes::Route;

/// Landing form: annotator id, task and language, then into the session.
#[component]
pub fn EntryView() -> Element {
    let navigator = use_navigator();
    let mut annotator = use_signal(String::new);
    let mut task = use_signal(|| TaskType::Judgment.as_str().to_string());
    let mut language = use_signal(|| Language::English.as_str().to_string());
    let mut error = use_signal(|| None::<&'static str>);

    let on_start = move |_| match SessionScope::parse(&annotator(), &task(), &language()) {
        Ok(scope) => {
            error.set(None);
            let _ = navigator.push(Route::Annotate {
                task_type: scope.task_type().as_str().to_string(),
                annotator_id: scope.annotator_id().as_str().to_string(),
                language: scope.language().as_str().to_string(),
                example_idx: 0,
            });
        }
        Err(ScopeError::Annotator(_)) => {
            error.set(Some("Please enter your annotator ID"));
        }
        Err(_) => {
            error.set(Some("Please select both task type and language"));
        }
    };

    rsx! {
        div { class: "page entry-page",
            header { class: "view-header",
                h2 { class: "view-title", "Start an annotation session" }
                p { class: "view-subtitle",
                    "Progress is saved on this machine per annotator, task and language."
                }
            }
            div { class: "view-divider" }
            div { class: "entry-form",
                label { class: "entry-label", r#for: "annotator-id", "Annotator ID" }
                input {
                    id: "annotator-id",
                    class: "entry-input",
                    r#type: "text",
                    placeholder: "e.g. a1",
                    value: "{annotator()}",
                    oninput: move |evt| annotator.set(evt.value()),
                }

                label { class: "entry-label", r#for: "task-type", "Task" }
                select {
                    id: "task-type",
                    class: "entry-select",
                    value: "{task()}",
                    onchange: move |evt| task.set(evt.value()),
                    option { value: "judgment", "Completion judgment" }
                    option { value: "writing", "Completion writing" }
                }

                label { class: "entry-label", r#for: "language", "Language" }
                select {
                    id: "language",
                    class: "entry-select",
                    value: "{language()}",
                    onchange: move |evt| language.set(evt.value()),
                    for lang in Language::ALL {
                        option { value: "{lang}", "{lang}" }
                    }
                }

                if let Some(message) = error() {
                    p { class: "entry-error", "{message}" }
                }

                button {
                    class: "btn btn-primary entry-start",
                    r#type: "button",
                    onclick: on_start,
                    "Start Annotating"
                }
            }
        }
    }
}
