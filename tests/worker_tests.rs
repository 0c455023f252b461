mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use presong::entities::job::{self, JobStatus};
use presong::entities::snippet::{self, SnippetState};
use presong::services::dispatcher::{QueueDispatcher, TaskDispatcher};
use presong::services::lifecycle;
use presong::services::worker::Worker;

use common::*;

async fn drain(worker: &Worker) {
    while worker.tick().await.expect("worker tick") {}
}

async fn reload(db: &sea_orm::DatabaseConnection, id: uuid::Uuid) -> snippet::Model {
    snippet::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("reload snippet")
        .expect("snippet exists")
}

#[tokio::test]
async fn worker_processes_both_jobs_and_readies_the_snippet() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;
    let snippet_model = create_snippet(&db, song.id, SnippetFixture::default()).await;

    let store = Arc::new(MemoryStore::new());
    store.seed("snippets/audio/uploaded/test.wav", b"raw-audio".to_vec());

    let dispatcher = QueueDispatcher::new(db.clone());
    lifecycle::process_uploaded_audio(&dispatcher, snippet_model.id)
        .await
        .unwrap();

    let worker = Worker::new(
        db.clone(),
        store.clone(),
        Arc::new(FakeTranscoder::new(false)),
        Arc::new(FakeAnalyzer),
    );
    drain(&worker).await;

    let ready = reload(&db, snippet_model.id).await;
    assert_eq!(ready.state, SnippetState::Ready);
    assert!(ready.audio_ready());
    assert!(ready.analysis_data.is_some());
    assert!(store.contains(&format!("snippets/audio/mp3/{}.mp3", snippet_model.id)));

    let completed = job::Entity::find()
        .filter(job::Column::Status.eq(JobStatus::Completed))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(completed.len(), 2);

    // Nothing left to do.
    assert!(!worker.tick().await.unwrap());
}

#[tokio::test]
async fn failed_job_parks_snippet_until_admin_retry() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;
    let snippet_model = create_snippet(&db, song.id, SnippetFixture::default()).await;

    let store = Arc::new(MemoryStore::new());
    store.seed("snippets/audio/uploaded/test.wav", b"raw-audio".to_vec());

    let dispatcher = QueueDispatcher::new(db.clone());
    lifecycle::process_uploaded_audio(&dispatcher, snippet_model.id)
        .await
        .unwrap();

    let transcoder = Arc::new(FakeTranscoder::new(true));
    let worker = Worker::new(db.clone(), store.clone(), transcoder.clone(), Arc::new(FakeAnalyzer));
    drain(&worker).await;

    // The transcode failed; analysis may still have landed, but the snippet
    // is parked with a readable error and never became ready.
    let parked = reload(&db, snippet_model.id).await;
    assert_eq!(parked.state, SnippetState::ProcessingError);
    assert!(parked.processing_error.is_some());

    let failed_jobs = job::Entity::find()
        .filter(job::Column::Status.eq(JobStatus::Failed))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(failed_jobs.len(), 1);
    assert!(failed_jobs[0].error.is_some());

    // The transcoder recovers and an admin retries the song.
    transcoder.fail.store(false, Ordering::SeqCst);
    let retried = lifecycle::retry_processing(&db, &dispatcher, &[song.id])
        .await
        .unwrap();
    assert_eq!(retried, 1);

    drain(&worker).await;

    let recovered = reload(&db, snippet_model.id).await;
    assert_eq!(recovered.state, SnippetState::Ready);
    assert!(recovered.processing_error.is_none());
}

#[tokio::test]
async fn stuck_jobs_are_recovered_on_startup() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;
    let snippet_model = create_snippet(&db, song.id, SnippetFixture::default()).await;

    let dispatcher = QueueDispatcher::new(db.clone());
    dispatcher
        .enqueue(presong::entities::job::JobKind::Transcode, snippet_model.id)
        .await
        .unwrap();

    // Simulate a crash mid-job.
    job::Entity::update_many()
        .col_expr(
            job::Column::Status,
            sea_orm::sea_query::Expr::value(JobStatus::Processing),
        )
        .exec(&db)
        .await
        .unwrap();

    let worker = Worker::new(
        db.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(FakeTranscoder::new(false)),
        Arc::new(FakeAnalyzer),
    );

    let recovered = worker.recover_stuck_jobs().await.unwrap();
    assert_eq!(recovered, 1);

    let pending = job::Entity::find()
        .filter(job::Column::Status.eq(JobStatus::Pending))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}
