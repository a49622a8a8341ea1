use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dioxus::prelude::*;
use dioxus_router::use_navigator;

use annotate_core::model::{Confidence, REJECTED_SLOTS, SessionScope, TaskType};
use services::{
    ExportArtifact, ProgressService, RemoteSyncService, SessionAdvance, SessionError,
    SessionWorkflow,
};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{AnnotateIntent, AnnotateVm, format_clock_time};

const AUTOSAVE_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq)]
enum Banner {
    Saved(String),
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum SubmitState {
    Idle,
    Submitting,
    Done {
        annotations_count: usize,
        output_file: Option<String>,
    },
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct CompletionState {
    total_saved: usize,
    submit: SubmitState,
}

fn annotate_route(scope: &SessionScope, example_idx: usize) -> Route {
    Route::Annotate {
        task_type: scope.task_type().as_str().to_string(),
        annotator_id: scope.annotator_id().as_str().to_string(),
        language: scope.language().as_str().to_string(),
        example_idx,
    }
}

fn apply_intent(mut vm: Signal<Option<AnnotateVm>>, intent: AnnotateIntent) {
    if let Some(view) = vm.write().as_mut() {
        view.apply(intent);
    }
}

fn write_export(dir: &Path, artifact: &ExportArtifact) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.filename);
    let pretty = serde_json::to_string_pretty(&artifact.data).map_err(std::io::Error::other)?;
    std::fs::write(&path, pretty)?;
    Ok(path)
}

/// Saves the current draft, then writes the scope's export artifact to disk.
fn download_action(
    progress: Arc<ProgressService>,
    export_dir: PathBuf,
    vm: Signal<Option<AnnotateVm>>,
    mut banner: Signal<Option<Banner>>,
) {
    let snapshot = {
        let guard = vm.peek();
        guard.as_ref().map(AnnotateVm::snapshot)
    };
    let Some(snapshot) = snapshot else { return };

    spawn(async move {
        let save = progress
            .save_draft(
                &snapshot.scope,
                &snapshot.draft,
                snapshot.example_id.clone(),
                snapshot.example_idx,
            )
            .await;
        if save.is_err() {
            banner.set(Some(Banner::Error(
                "Could not save your current answers before exporting.".into(),
            )));
            return;
        }

        match progress.export_for_download(&snapshot.scope).await {
            Ok(artifact) => match write_export(&export_dir, &artifact) {
                Ok(path) => banner.set(Some(Banner::Saved(format!(
                    "File downloaded: {}",
                    path.display()
                )))),
                Err(err) => banner.set(Some(Banner::Error(format!(
                    "Could not write the export file: {err}"
                )))),
            },
            Err(_) => banner.set(Some(Banner::Error(
                "Could not assemble the export. Please try again.".into(),
            ))),
        }
    });
}

/// Records the batch locally, then forwards it to the collection server when
/// one is configured. Local progress stays intact either way.
fn submit_action(
    workflow: Arc<SessionWorkflow>,
    progress: Arc<ProgressService>,
    sync: Arc<RemoteSyncService>,
    scope: SessionScope,
    mut completion: Signal<Option<CompletionState>>,
) {
    spawn(async move {
        if let Some(state) = completion.write().as_mut() {
            state.submit = SubmitState::Submitting;
        }

        let outcome = match workflow.submit_batch(&scope).await {
            Ok(outcome) => outcome,
            Err(_) => {
                if let Some(state) = completion.write().as_mut() {
                    state.submit = SubmitState::Failed;
                }
                return;
            }
        };

        let mut output_file = None;
        if sync.enabled() {
            let annotations = match progress.load_all(&scope).await {
                Ok(annotations) => annotations,
                Err(_) => {
                    if let Some(state) = completion.write().as_mut() {
                        state.submit = SubmitState::Failed;
                    }
                    return;
                }
            };
            match sync.submit_batch(&scope, &annotations).await {
                Ok(receipt) => output_file = Some(receipt.output_file),
                Err(_) => {
                    if let Some(state) = completion.write().as_mut() {
                        state.submit = SubmitState::Failed;
                    }
                    return;
                }
            }
        }

        if let Some(state) = completion.write().as_mut() {
            state.submit = SubmitState::Done {
                annotations_count: outcome.annotations_count,
                output_file,
            };
        }
    });
}

#[component]
pub fn AnnotateView(
    task_type: ReadOnlySignal<String>,
    annotator_id: ReadOnlySignal<String>,
    language: ReadOnlySignal<String>,
    example_idx: ReadOnlySignal<usize>,
) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let workflow = ctx.workflow();
    let progress_service = ctx.progress();
    let sync_service = ctx.sync();
    let export_dir = ctx.export_dir();

    let vm = use_signal(|| None::<AnnotateVm>);
    let banner = use_signal(|| None::<Banner>);
    let mut incomplete = use_signal(|| None::<Vec<&'static str>>);
    let completion = use_signal(|| None::<CompletionState>);
    let mut last_autosave = use_signal(|| None::<DateTime<Utc>>);

    let scope_result = use_memo(move || {
        SessionScope::parse(&annotator_id(), &task_type(), &language())
    });

    // Missing or unusable session parameters are fatal to this view: back to
    // the entry form rather than annotating into a guessed scope.
    use_effect(move || {
        if scope_result().is_err() {
            let _ = navigator.replace(Route::Entry {});
        }
    });

    let workflow_for_resource = workflow.clone();
    let resource = use_resource(move || {
        let workflow = workflow_for_resource.clone();
        let scope = scope_result();
        let example_idx = example_idx();
        let mut vm = vm;
        async move {
            let Ok(scope) = scope else {
                return Err(ViewError::MissingParams);
            };
            match workflow.start_session(scope, example_idx).await {
                Ok(session) => {
                    vm.set(Some(AnnotateVm::new(session)));
                    Ok(())
                }
                Err(SessionError::EmptyDataset { .. }) => Err(ViewError::EmptyDataset),
                Err(_) => Err(ViewError::Unknown),
            }
        }
    });

    // Periodic autosave, tied to this view's lifetime: the future is dropped
    // on unmount, which cancels the timer. Untouched drafts are skipped so an
    // example the annotator never opened produces no record.
    let progress_for_autosave = progress_service.clone();
    use_future(move || {
        let progress = progress_for_autosave.clone();
        let mut banner = banner;
        async move {
            loop {
                tokio::time::sleep(Duration::from_secs(AUTOSAVE_SECS)).await;
                let snapshot = {
                    let guard = vm.peek();
                    guard.as_ref().and_then(AnnotateVm::autosave_snapshot)
                };
                let Some(snapshot) = snapshot else { continue };
                match progress
                    .save_draft(
                        &snapshot.scope,
                        &snapshot.draft,
                        snapshot.example_id,
                        snapshot.example_idx,
                    )
                    .await
                {
                    Ok(record) => last_autosave.set(Some(record.last_modified())),
                    Err(_) => banner.set(Some(Banner::Error(
                        "Auto-save failed. Your latest answers may not be stored.".into(),
                    ))),
                }
            }
        }
    });

    let workflow_for_prev = workflow.clone();
    let on_previous = move |_| {
        let workflow = workflow_for_prev.clone();
        let mut vm = vm;
        let mut banner = banner;
        spawn(async move {
            let Some(mut inner) = vm.write().take() else {
                return;
            };
            match workflow.previous(inner.session_mut()).await {
                Ok(true) => {
                    let route =
                        annotate_route(inner.session().scope(), inner.session().example_idx());
                    vm.set(Some(inner));
                    let _ = navigator.push(route);
                }
                Ok(false) => vm.set(Some(inner)),
                Err(_) => {
                    vm.set(Some(inner));
                    banner.set(Some(Banner::Error(
                        "Could not save your answers. Please try again.".into(),
                    )));
                }
            }
        });
    };

    let workflow_for_next = workflow.clone();
    let on_next = move |_| {
        let workflow = workflow_for_next.clone();
        let mut vm = vm;
        let mut banner = banner;
        let mut incomplete = incomplete;
        let mut completion = completion;
        spawn(async move {
            let Some(mut inner) = vm.write().take() else {
                return;
            };
            match workflow.next(inner.session_mut()).await {
                Ok(SessionAdvance::Moved { example_idx }) => {
                    let route = annotate_route(inner.session().scope(), example_idx);
                    vm.set(Some(inner));
                    let _ = navigator.push(route);
                }
                Ok(SessionAdvance::Incomplete { missing }) => {
                    vm.set(Some(inner));
                    incomplete.set(Some(missing));
                }
                Ok(SessionAdvance::BatchComplete { total_saved }) => {
                    vm.set(Some(inner));
                    completion.set(Some(CompletionState {
                        total_saved,
                        submit: SubmitState::Idle,
                    }));
                }
                Err(_) => {
                    vm.set(Some(inner));
                    banner.set(Some(Banner::Error(
                        "Could not save your answers. Please try again.".into(),
                    )));
                }
            }
        });
    };

    let progress_for_download = progress_service.clone();
    let export_dir_for_download = export_dir.clone();
    let on_download = move |_| {
        download_action(
            progress_for_download.clone(),
            export_dir_for_download.clone(),
            vm,
            banner,
        );
    };

    let state = view_state_from_resource(resource);
    rsx! {
        div { class: "page annotate-page",
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { class: "loading", "Loading examples..." }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "view-error", "{err.message()}" }
                    if err == ViewError::Unknown {
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| {
                                let mut resource = resource;
                                resource.restart();
                            },
                            "Retry"
                        }
                    }
                },
                ViewState::Ready(()) => rsx! {
                    AnnotateForm {
                        vm,
                        on_previous,
                        on_next,
                        on_download,
                        last_autosave: last_autosave(),
                    }
                },
            }

            if let Some(notice) = banner() {
                match notice {
                    Banner::Saved(message) => rsx! {
                        div { class: "banner banner-saved",
                            span { "{message}" }
                            button {
                                class: "banner-close",
                                r#type: "button",
                                onclick: {
                                    let mut banner = banner;
                                    move |_| banner.set(None)
                                },
                                "×"
                            }
                        }
                    },
                    Banner::Error(message) => rsx! {
                        div { class: "banner banner-error",
                            span { "{message}" }
                            button {
                                class: "banner-close",
                                r#type: "button",
                                onclick: {
                                    let mut banner = banner;
                                    move |_| banner.set(None)
                                },
                                "×"
                            }
                        }
                    },
                }
            }

            if let Some(missing) = incomplete() {
                div { class: "modal-overlay",
                    div { class: "modal",
                        h3 { class: "modal-title warning", "Complete Required Fields" }
                        p { "Please answer everything below before continuing." }
                        ul { class: "missing-list",
                            for field in missing {
                                li { "{field}" }
                            }
                        }
                        button {
                            class: "btn btn-warning",
                            r#type: "button",
                            onclick: move |_| incomplete.set(None),
                            "Go Back and Complete"
                        }
                    }
                }
            }

            if let Some(done) = completion() {
                CompletionModal {
                    state: done,
                    completion,
                    on_download: {
                        let progress = progress_service.clone();
                        let export_dir = export_dir.clone();
                        move |_| download_action(progress.clone(), export_dir.clone(), vm, banner)
                    },
                    on_submit: {
                        let workflow = workflow.clone();
                        let progress = progress_service.clone();
                        let sync = sync_service.clone();
                        move |_| {
                            let scope = {
                                let guard = vm.peek();
                                guard.as_ref().map(|view| view.session().scope().clone())
                            };
                            if let Some(scope) = scope {
                                submit_action(
                                    workflow.clone(),
                                    progress.clone(),
                                    sync.clone(),
                                    scope,
                                    completion,
                                );
                            }
                        }
                    },
                }
            }
        }
    }
}

#[derive(Props, Clone)]
struct AnnotateFormProps {
    vm: Signal<Option<AnnotateVm>>,
    on_previous: EventHandler<MouseEvent>,
    on_next: EventHandler<MouseEvent>,
    on_download: EventHandler<MouseEvent>,
    last_autosave: Option<DateTime<Utc>>,
}

impl PartialEq for AnnotateFormProps {
    fn eq(&self, other: &Self) -> bool {
        self.last_autosave == other.last_autosave
    }
}

#[component]
fn AnnotateForm(props: AnnotateFormProps) -> Element {
    let vm = props.vm;
    let on_previous = props.on_previous;
    let on_next = props.on_next;
    let on_download = props.on_download;
    let guard = vm.read();
    let Some(view) = guard.as_ref() else {
        return rsx! {
            p { class: "loading", "Loading examples..." }
        };
    };

    let progress = view.progress();
    let progress_label = view.progress_label();
    let percent_label = view.percent_label();
    let percent_width = format!("width: {:.1}%;", progress.percent());
    let next_label = view.next_button_label();
    let next_class = if view.is_complete() {
        "btn btn-success nav-next"
    } else {
        "btn btn-secondary nav-next"
    };
    let at_first = view.session().example_idx() == 0;
    let example = view.example().clone();
    let task = view.task_type();
    let notes = view.notes().to_string();
    let minutes = view.minutes_text();
    let autosave_label = props
        .last_autosave
        .map(|at| format!("Auto-saved at {}", format_clock_time(at)));

    rsx! {
        section { class: "progress-header",
            div { class: "progress-meta",
                h2 { class: "progress-label", "{progress_label}" }
                button {
                    class: "btn btn-outline download-btn",
                    r#type: "button",
                    onclick: move |evt| on_download.call(evt),
                    "Download"
                }
            }
            div { class: "progress-track",
                div { class: "progress-fill", style: "{percent_width}", "{percent_label}" }
            }
            if let Some(label) = autosave_label {
                p { class: "autosave-note", "{label}" }
            }
        }

        section { class: "example-card",
            div { class: "example-meta",
                if !example.category.is_empty() {
                    span { class: "badge badge-category", "{example.category}" }
                }
                if !example.country.is_empty() {
                    span { class: "badge badge-country", "{example.country}" }
                }
            }
            h3 { class: "example-heading", "Prompt" }
            p { class: "example-prompt", "{example.prompt}" }
        }

        match task {
            TaskType::Judgment => rsx! {
                JudgmentForm { vm }
            },
            TaskType::Writing => rsx! {
                WritingForm { vm }
            },
        }

        section { class: "extras",
            label { class: "extras-label", r#for: "notes", "Notes (optional)" }
            textarea {
                id: "notes",
                class: "notes-input",
                value: "{notes}",
                oninput: move |evt| apply_intent(vm, AnnotateIntent::SetNotes(evt.value())),
            }
            label { class: "extras-label", r#for: "time-minutes", "Time spent (minutes)" }
            input {
                id: "time-minutes",
                class: "time-input",
                r#type: "number",
                min: "0",
                value: "{minutes}",
                oninput: move |evt| apply_intent(vm, AnnotateIntent::SetMinutes(evt.value())),
            }
        }

        nav { class: "nav-row",
            button {
                class: "btn btn-secondary nav-previous",
                r#type: "button",
                disabled: at_first,
                onclick: move |evt| on_previous.call(evt),
                "Previous"
            }
            button {
                class: "{next_class}",
                r#type: "button",
                onclick: move |evt| on_next.call(evt),
                "{next_label}"
            }
        }
    }
}

#[component]
fn JudgmentForm(vm: Signal<Option<AnnotateVm>>) -> Element {
    let guard = vm.read();
    let Some(view) = guard.as_ref() else {
        return rsx! {};
    };
    let example = view.example().clone();
    let chosen_selected = view.chosen_selected();
    let confidence_selected = view.confidence_selected();

    let rejected_panels = (0..REJECTED_SLOTS).map(|slot| {
        let text = example
            .rejected_text(slot)
            .unwrap_or("(not provided)")
            .to_string();
        let model = example
            .rejected_model_name(slot)
            .unwrap_or("unknown model")
            .to_string();
        let selected = view.rejected_selected(slot);
        let panel_class = if selected.is_some() {
            "judgment-panel answered"
        } else {
            "judgment-panel"
        };
        let yes_class = if selected == Some(true) {
            "btn judgment-btn active"
        } else {
            "btn judgment-btn"
        };
        let no_class = if selected == Some(false) {
            "btn judgment-btn active"
        } else {
            "btn judgment-btn"
        };
        rsx! {
            div { class: "{panel_class}",
                h4 { class: "panel-title", "Rejected Completion #{slot + 1}" }
                p { class: "panel-model", "{model}" }
                p { class: "panel-text", "{text}" }
                p { class: "panel-question", "Is this completion culturally misaligned?" }
                div { class: "judgment-buttons",
                    button {
                        class: "{yes_class}",
                        r#type: "button",
                        onclick: move |_| apply_intent(vm, AnnotateIntent::JudgeRejected(slot, true)),
                        "Yes"
                    }
                    button {
                        class: "{no_class}",
                        r#type: "button",
                        onclick: move |_| apply_intent(vm, AnnotateIntent::JudgeRejected(slot, false)),
                        "No"
                    }
                }
            }
        }
    });

    let chosen_class = if chosen_selected.is_some() {
        "judgment-panel answered"
    } else {
        "judgment-panel"
    };
    let chosen_yes_class = if chosen_selected == Some(true) {
        "btn judgment-btn active"
    } else {
        "btn judgment-btn"
    };
    let chosen_no_class = if chosen_selected == Some(false) {
        "btn judgment-btn active"
    } else {
        "btn judgment-btn"
    };
    let chosen_text = example.chosen_text().unwrap_or("(not provided)").to_string();
    let chosen_model = example
        .chosen_model_name()
        .unwrap_or("unknown model")
        .to_string();

    let confidence_buttons = Confidence::ALL.map(|level| {
        let class = if confidence_selected == Some(level) {
            "btn confidence-btn active"
        } else {
            "btn confidence-btn"
        };
        rsx! {
            button {
                class: "{class}",
                r#type: "button",
                onclick: move |_| apply_intent(vm, AnnotateIntent::SetConfidence(level)),
                "{level}"
            }
        }
    });

    rsx! {
        section { class: "judgment-form",
            div { class: "{chosen_class}",
                h4 { class: "panel-title", "Chosen Completion" }
                p { class: "panel-model", "{chosen_model}" }
                p { class: "panel-text", "{chosen_text}" }
                p { class: "panel-question", "Is this completion culturally aligned?" }
                div { class: "judgment-buttons",
                    button {
                        class: "{chosen_yes_class}",
                        r#type: "button",
                        onclick: move |_| apply_intent(vm, AnnotateIntent::JudgeChosen(true)),
                        "Yes"
                    }
                    button {
                        class: "{chosen_no_class}",
                        r#type: "button",
                        onclick: move |_| apply_intent(vm, AnnotateIntent::JudgeChosen(false)),
                        "No"
                    }
                }
            }

            {rejected_panels}

            div { class: "confidence-row",
                h4 { class: "panel-title", "Confidence" }
                div { class: "confidence-buttons",
                    {confidence_buttons.into_iter()}
                }
            }
        }
    }
}

#[component]
fn WritingForm(vm: Signal<Option<AnnotateVm>>) -> Element {
    let guard = vm.read();
    let Some(view) = guard.as_ref() else {
        return rsx! {};
    };
    let completion = view.completion_text().to_string();
    let chars = view.completion_chars();
    let words = view.completion_words();

    rsx! {
        section { class: "writing-form",
            label { class: "extras-label", r#for: "human-completion", "Your completion" }
            textarea {
                id: "human-completion",
                class: "completion-input",
                placeholder: "Write a completion for the prompt above (at least 20 characters)...",
                value: "{completion}",
                oninput: move |evt| apply_intent(vm, AnnotateIntent::SetCompletion(evt.value())),
            }
            if chars > 0 {
                div { class: "word-count",
                    small { "Words: {words}" }
                    small { "Characters: {chars}" }
                }
            }
        }
    }
}

#[derive(Props, Clone)]
struct CompletionModalProps {
    state: CompletionState,
    completion: Signal<Option<CompletionState>>,
    on_download: EventHandler<MouseEvent>,
    on_submit: EventHandler<MouseEvent>,
}

impl PartialEq for CompletionModalProps {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

#[component]
fn CompletionModal(props: CompletionModalProps) -> Element {
    let mut completion = props.completion;
    let on_download = props.on_download;
    let on_submit = props.on_submit;
    let total = props.state.total_saved;
    let submit = props.state.submit;
    let submitting = submit == SubmitState::Submitting;
    let submit_label = if submit == SubmitState::Failed {
        "Retry Submission"
    } else {
        "Submit Batch"
    };

    rsx! {
        div { class: "modal-overlay",
            div { class: "modal",
                h3 { class: "modal-title success", "All Examples Complete!" }
                p {
                    "Great job! You have answered every example in this batch. "
                    "You have {total} saved in total."
                }
                p {
                    "Download the file to keep a permanent record, or submit the "
                    "batch to the collection server."
                }
                match &submit {
                    SubmitState::Done { annotations_count, output_file } => rsx! {
                        p { class: "submit-result",
                            "Submitted {annotations_count} records."
                            if let Some(file) = output_file {
                                " Server stored them as {file}."
                            }
                        }
                    },
                    SubmitState::Failed => rsx! {
                        p { class: "submit-error",
                            "Submission failed. Your local progress is intact; you can retry."
                        }
                    },
                    SubmitState::Idle | SubmitState::Submitting => rsx! {},
                }
                div { class: "modal-actions",
                    button {
                        class: "btn btn-outline",
                        r#type: "button",
                        onclick: move |evt| on_download.call(evt),
                        "Download"
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: submitting,
                        onclick: move |evt| on_submit.call(evt),
                        "{submit_label}"
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| completion.set(None),
                        "Close"
                    }
                }
            }
        }
    }
}
