use std::sync::Arc;

use prep_core::model::{ChapterId, ChapterProgressPatch, Understanding};
use prep_core::time::fixed_clock;
use proptest::prelude::*;
use services::{
    AppServices, DEFAULT_EXPORT_FILE, ProgressSynchronizer, ResetOutcome, TransferError,
};
use storage::repository::{BlobRepository, InMemoryRepository, Storage};
use storage::{LocalProgressStore, PROGRESS_KEY};

fn id(raw: &str) -> ChapterId {
    raw.parse().unwrap()
}

fn setup() -> (InMemoryRepository, ProgressSynchronizer) {
    let repo = InMemoryRepository::new();
    let store = LocalProgressStore::new(Arc::new(repo.clone()));
    (repo, ProgressSynchronizer::local_only(fixed_clock(), store))
}

async fn seed(sync: &ProgressSynchronizer) {
    sync.update(
        id("Physics-11-1"),
        &ChapterProgressPatch::new().completed(true).important(true),
    )
    .await
    .unwrap();
    sync.update(
        id("Chemistry-12-3"),
        &ChapterProgressPatch::new().understanding(Understanding::new(2).unwrap()),
    )
    .await
    .unwrap();
    sync.set_subtopic(id("Chemistry-12-3"), 4, true).await.unwrap();
}

#[tokio::test]
async fn export_then_import_round_trips() {
    let (_, source) = setup();
    seed(&source).await;
    let document = source.export_document().unwrap();

    let (_, target) = setup();
    let imported = target.import_document(&document).await.unwrap();
    assert_eq!(imported, 2);
    assert_eq!(target.snapshot(), source.snapshot());
}

#[tokio::test]
async fn export_to_directory_uses_default_file_name() {
    let (_, sync) = setup();
    seed(&sync).await;
    let dir = tempfile::tempdir().unwrap();

    let path = sync.export_to_file(dir.path()).unwrap();
    assert_eq!(path, dir.path().join(DEFAULT_EXPORT_FILE));

    let (_, other) = setup();
    other.import_file(&path).await.unwrap();
    assert_eq!(other.snapshot(), sync.snapshot());
}

#[tokio::test]
async fn invalid_import_leaves_state_and_local_store_untouched() {
    let (repo, sync) = setup();
    seed(&sync).await;
    let before_map = sync.snapshot();
    let before_blob = repo.get_blob(PROGRESS_KEY).await.unwrap();

    let err = sync
        .import_document("{\"Physics-11-1\": {\"completed\": tru")
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidDocument(_)));
    assert!(err.to_string().contains("check the file format"));

    assert_eq!(sync.snapshot(), before_map);
    assert_eq!(repo.get_blob(PROGRESS_KEY).await.unwrap(), before_blob);
}

#[tokio::test]
async fn import_of_missing_file_is_io_error() {
    let (_, sync) = setup();
    let dir = tempfile::tempdir().unwrap();
    let err = sync
        .import_file(&dir.path().join("nope.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Io(_)));
}

#[tokio::test]
async fn import_replaces_rather_than_merges() {
    let (_, sync) = setup();
    seed(&sync).await;
    sync.import_document(r#"{"Biology-11-1": {"important": true}}"#)
        .await
        .unwrap();
    let map = sync.snapshot();
    assert_eq!(map.len(), 1);
    assert!(map.get(&id("Physics-11-1")).is_none());
}

#[tokio::test]
async fn confirmed_reset_clears_memory_and_local_store() {
    let (repo, sync) = setup();
    seed(&sync).await;

    let outcome = sync.reset(&|_: &str| true).await.unwrap();
    assert_eq!(outcome, ResetOutcome::Cleared);
    assert!(sync.snapshot().is_empty());
    assert_eq!(repo.get_blob(PROGRESS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn app_services_start_in_local_only_mode() {
    let storage = Storage::in_memory();
    let app = AppServices::from_storage(&storage, fixed_clock(), None).unwrap();
    let (identity, source) = app.start().await.unwrap();
    assert!(identity.is_none());
    assert_eq!(source, services::LoadSource::Local);
    assert!(!app.progress().has_remote());
    assert!(!app.auth().has_remote());
}

proptest! {
    #[test]
    fn any_update_sequence_round_trips_through_export(
        updates in prop::collection::vec(
            (
                prop::sample::select(vec!["Physics", "Chemistry", "Mathematics", "Biology"]),
                11u8..=12,
                1u32..30,
                any::<bool>(),
                0u8..=5,
            ),
            0..16,
        )
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let (_, source) = setup();
            for (subject, class, number, done, level) in &updates {
                source
                    .update(
                        ChapterId::compose(subject, *class, *number),
                        &ChapterProgressPatch::new()
                            .completed(*done)
                            .understanding(Understanding::new(*level).unwrap()),
                    )
                    .await
                    .unwrap();
            }
            let document = source.export_document().unwrap();
            let (_, target) = setup();
            target.import_document(&document).await.unwrap();
            assert_eq!(target.snapshot(), source.snapshot());
        });
    }
}
