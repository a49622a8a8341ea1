use std::collections::BTreeMap;

use annotate_core::model::{
    Confidence, Draft, ExampleId, JudgmentDraft, ProgressRecord, SessionScope, SubmissionId,
    WritingDraft,
};
use annotate_core::time::fixed_now;
use chrono::Duration;
use storage::repository::{ProgressRepository, SubmissionRecord, SubmissionRepository};
use storage::sqlite::SqliteRepository;

fn judgment_scope() -> SessionScope {
    SessionScope::parse("a1", "judgment", "English").unwrap()
}

fn complete_judgment_record(example_id: &str, idx: usize) -> ProgressRecord {
    let mut draft = JudgmentDraft::default();
    draft.set_chosen_alignment(true);
    for slot in 0..3 {
        draft.set_rejected_misalignment(slot, false);
    }
    draft.set_confidence(Confidence::High);
    draft.notes = "solid".into();
    ProgressRecord::from_draft(
        &Draft::Judgment(draft),
        ExampleId::new(example_id),
        idx,
        fixed_now(),
    )
}

#[tokio::test]
async fn sqlite_roundtrips_progress_records() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let scope = judgment_scope();
    let record = complete_judgment_record("ex-1", 0);
    repo.save(&scope, &record).await.unwrap();

    let loaded = repo
        .load(&scope, &ExampleId::new("ex-1"))
        .await
        .unwrap()
        .expect("record saved");
    assert_eq!(loaded, record);

    assert!(
        repo.load(&scope, &ExampleId::new("ex-2"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn sqlite_upsert_keeps_last_write() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let scope = judgment_scope();
    repo.save(&scope, &complete_judgment_record("ex-1", 0))
        .await
        .unwrap();

    let mut updated = complete_judgment_record("ex-1", 0);
    updated.touch(fixed_now() + Duration::seconds(30));
    repo.save(&scope, &updated).await.unwrap();

    assert_eq!(repo.count(&scope).await.unwrap(), 1);
    let loaded = repo
        .load(&scope, &ExampleId::new("ex-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.last_modified(), updated.last_modified());
}

#[tokio::test]
async fn sqlite_load_all_and_clear_are_scoped() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_scoped?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let scope = judgment_scope();
    let other = SessionScope::parse("a1", "judgment", "German").unwrap();
    repo.save(&scope, &complete_judgment_record("ex-1", 0))
        .await
        .unwrap();
    repo.save(&scope, &complete_judgment_record("ex-2", 1))
        .await
        .unwrap();
    repo.save(&other, &complete_judgment_record("ex-1", 0))
        .await
        .unwrap();

    let all = repo.load_all(&scope).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.contains_key(&ExampleId::new("ex-1")));
    assert!(all.contains_key(&ExampleId::new("ex-2")));

    assert!(repo.clear(&scope).await.unwrap());
    assert_eq!(repo.count(&scope).await.unwrap(), 0);
    assert_eq!(repo.count(&other).await.unwrap(), 1);
    assert!(!repo.clear(&scope).await.unwrap());
}

#[tokio::test]
async fn sqlite_submissions_roundtrip() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_submissions?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let scope = SessionScope::parse("a1", "writing", "Thai").unwrap();
    let mut annotations = BTreeMap::new();
    annotations.insert(
        ExampleId::new("w-1"),
        ProgressRecord::from_draft(
            &Draft::Writing(WritingDraft {
                human_completion: "a completion long enough to pass".into(),
                ..WritingDraft::default()
            }),
            ExampleId::new("w-1"),
            0,
            fixed_now(),
        ),
    );

    let submission = SubmissionRecord {
        id: SubmissionId::generate(),
        submitted_at: fixed_now(),
        annotations,
    };
    repo.append_submission(&scope, &submission).await.unwrap();

    let listed = repo.list_submissions(&scope).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], submission);

    let unrelated = repo.list_submissions(&judgment_scope()).await.unwrap();
    assert!(unrelated.is_empty());
}
