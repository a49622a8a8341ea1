use std::collections::BTreeMap;
use std::sync::Arc;

use annotate_core::model::{
    Confidence, Draft, Example, ExampleId, JudgmentDraft, ProgressRecord, SessionScope,
};
use annotate_core::time::fixed_now;
use storage::repository::{ProgressRepository, Storage, StorageError};

use super::test_harness::{ViewKind, setup_view_harness, setup_view_harness_with_storage};

fn example(id: &str) -> Example {
    Example {
        id: ExampleId::new(id),
        prompt: format!("A prompt about local customs ({id})"),
        category: "food".into(),
        country: "Japan".into(),
        chosen: vec!["the chosen completion".into()],
        chosen_model: vec!["model-a".into()],
        rejected: vec!["r0".into(), "r1".into(), "r2".into()],
        rejected_model: vec!["m0".into(), "m1".into(), "m2".into()],
    }
}

fn judgment_view(example_idx: usize) -> ViewKind {
    ViewKind::Annotate {
        task_type: "judgment".into(),
        annotator_id: "a1".into(),
        language: "English".into(),
        example_idx,
    }
}

#[tokio::test(flavor = "current_thread")]
async fn entry_view_smoke_renders_form() {
    let mut harness = setup_view_harness(ViewKind::Entry, Vec::new()).await;
    harness.rebuild();
    let html = harness.render();

    assert!(html.contains("Annotator ID"), "missing id field in {html}");
    assert!(html.contains("Start Annotating"), "missing start in {html}");
    assert!(html.contains("English"), "missing language option in {html}");
    assert!(html.contains("Vietnamese"), "missing language option in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn judgment_view_smoke_renders_example_and_progress() {
    let mut harness =
        setup_view_harness(judgment_view(0), vec![example("ex-1"), example("ex-2")]).await;
    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();

    assert!(html.contains("Example 1 of 2"), "missing progress in {html}");
    assert!(
        html.contains("A prompt about local customs (ex-1)"),
        "missing prompt in {html}"
    );
    assert!(
        html.contains("Chosen Completion"),
        "missing chosen panel in {html}"
    );
    assert!(
        html.contains("Rejected Completion #3"),
        "missing rejected panels in {html}"
    );
    assert!(
        html.contains("Complete Required Fields to Continue"),
        "missing gated next label in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn writing_view_smoke_shows_minimum_length_gate() {
    let view = ViewKind::Annotate {
        task_type: "writing".into(),
        annotator_id: "a1".into(),
        language: "English".into(),
        example_idx: 0,
    };
    let mut harness = setup_view_harness(view, vec![example("w-1")]).await;
    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();

    assert!(html.contains("Your completion"), "missing textarea in {html}");
    assert!(
        html.contains("Write at least 20 characters to submit"),
        "missing gate label in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn judgment_view_smoke_restores_saved_answers() {
    let mut harness =
        setup_view_harness(judgment_view(0), vec![example("ex-1"), example("ex-2")]).await;

    let scope = SessionScope::parse("a1", "judgment", "English").unwrap();
    let mut draft = JudgmentDraft::default();
    draft.set_chosen_alignment(true);
    for slot in 0..3 {
        draft.set_rejected_misalignment(slot, false);
    }
    draft.set_confidence(Confidence::High);
    let record = ProgressRecord::from_draft(
        &Draft::Judgment(draft),
        ExampleId::new("ex-1"),
        0,
        fixed_now(),
    );
    harness
        .storage
        .progress
        .save(&scope, &record)
        .await
        .expect("seed record");

    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();

    assert!(
        html.contains("judgment-btn active"),
        "missing restored selection in {html}"
    );
    assert!(
        html.contains("Next Example"),
        "restored complete draft should unlock next in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn judgment_view_smoke_renders_empty_dataset_error() {
    let mut harness = setup_view_harness(judgment_view(0), Vec::new()).await;
    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();

    assert!(
        html.contains("No examples found"),
        "missing empty dataset message in {html}"
    );
}

struct FailingProgressRepo;

#[async_trait::async_trait]
impl ProgressRepository for FailingProgressRepo {
    async fn load(
        &self,
        _scope: &SessionScope,
        _example_id: &ExampleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn save(
        &self,
        _scope: &SessionScope,
        _record: &ProgressRecord,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn load_all(
        &self,
        _scope: &SessionScope,
    ) -> Result<BTreeMap<ExampleId, ProgressRecord>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn clear(&self, _scope: &SessionScope) -> Result<bool, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn count(&self, _scope: &SessionScope) -> Result<usize, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn judgment_view_smoke_renders_storage_error_with_retry() {
    let in_memory = Storage::in_memory();
    let storage = Storage {
        progress: Arc::new(FailingProgressRepo),
        submissions: in_memory.submissions,
    };
    let mut harness =
        setup_view_harness_with_storage(judgment_view(0), vec![example("ex-1")], storage).await;
    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();

    assert!(
        html.contains("Something went wrong"),
        "missing error message in {html}"
    );
    assert!(html.contains("Retry"), "missing retry button in {html}");
}
