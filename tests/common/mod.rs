#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

use presong::entities::job::JobKind;
use presong::entities::snippet::{self, SnippetState, VisualEffect};
use presong::entities::{artist, order, song, user};
use presong::error::AppError;
use presong::middleware::auth::AuthUser;
use presong::services::audio::{AnalysisProvider, AudioTranscoder};
use presong::services::dispatcher::TaskDispatcher;
use presong::services::storage::BlobStore;
use presong::services::stripe::PaymentGateway;

/// In-memory SQLite through the real migrations. A single pooled connection
/// keeps every handle on the same database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        password: Set("not-a-real-hash".to_string()),
        role: Set(user::Role::User),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn create_artist(db: &DatabaseConnection, account: &user::Model) -> artist::Model {
    artist::ActiveModel {
        user_id: Set(account.id),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert artist")
}

pub async fn create_song(db: &DatabaseConnection, artist_id: i32) -> song::Model {
    song::ActiveModel {
        id: Set(Uuid::new_v4()),
        artist_id: Set(artist_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
        complete_audio: Set(None),
        completed_at: Set(None),
    }
    .insert(db)
    .await
    .expect("insert song")
}

pub struct SnippetFixture {
    pub state: SnippetState,
    pub audio_mp3: Option<String>,
    pub analysis_data: Option<serde_json::Value>,
}

impl Default for SnippetFixture {
    fn default() -> Self {
        Self {
            state: SnippetState::Processing,
            audio_mp3: None,
            analysis_data: None,
        }
    }
}

pub async fn create_snippet(
    db: &DatabaseConnection,
    song_id: Uuid,
    fixture: SnippetFixture,
) -> snippet::Model {
    snippet::ActiveModel {
        id: Set(Uuid::new_v4()),
        song_id: Set(song_id),
        title: Set("test snippet".to_string()),
        state: Set(fixture.state),
        processing_error: Set(None),
        created_at: Set(chrono::Utc::now().naive_utc()),
        image: Set("snippets/images/test.jpg".to_string()),
        uploaded_audio: Set(Some("snippets/audio/uploaded/test.wav".to_string())),
        audio_mp3: Set(fixture.audio_mp3),
        analysis_data: Set(fixture.analysis_data),
        visual_effect: Set(VisualEffect::Pulsate),
    }
    .insert(db)
    .await
    .expect("insert snippet")
}

pub async fn create_order(
    db: &DatabaseConnection,
    song_id: Uuid,
    purchaser_id: i32,
    price: i64,
) -> order::Model {
    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        song_id: Set(song_id),
        purchaser_id: Set(purchaser_id),
        price: Set(price),
        refunded: Set(false),
        delivered: Set(false),
        created_at: Set(chrono::Utc::now().naive_utc()),
        stripe_transaction_id: Set(format!("ch_{}", Uuid::new_v4())),
    }
    .insert(db)
    .await
    .expect("insert order")
}

pub fn viewer_for(account: &user::Model) -> AuthUser {
    AuthUser {
        id: account.id,
        username: account.username.clone(),
        role: account.role.clone(),
    }
}

pub fn analysis_blob() -> serde_json::Value {
    serde_json::json!({
        "beats": [
            {"start": 0.5, "duration": 0.4},
            {"start": 0.9, "duration": 0.4}
        ]
    })
}

// ---- collaborator fakes ----

/// Payment gateway fake: flips between failing and succeeding and counts
/// reversal calls.
pub struct FakeGateway {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new(fail: bool) -> Self {
        Self {
            fail: AtomicBool::new(fail),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn reverse_charge(&self, _transaction_id: &str) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Gateway("simulated gateway outage".to_string()));
        }
        Ok(())
    }
}

/// Blob store fake backed by a map.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn seed(&self, key: &str, data: Vec<u8>) {
        self.blobs.lock().unwrap().insert(key.to_string(), data);
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<(), AppError> {
        self.blobs.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::InternalServerError(format!("no blob at {}", key)))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("mem://{}", key)
    }
}

/// Dispatcher fake that only records what was enqueued.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub enqueued: Mutex<Vec<(JobKind, Uuid)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<(JobKind, Uuid)> {
        self.enqueued.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskDispatcher for RecordingDispatcher {
    async fn enqueue(&self, kind: JobKind, snippet_id: Uuid) -> Result<(), AppError> {
        self.enqueued.lock().unwrap().push((kind, snippet_id));
        Ok(())
    }
}

/// Transcoder fake: fails while the flag is set, otherwise returns fixed mp3
/// bytes.
pub struct FakeTranscoder {
    pub fail: AtomicBool,
}

impl FakeTranscoder {
    pub fn new(fail: bool) -> Self {
        Self {
            fail: AtomicBool::new(fail),
        }
    }
}

#[async_trait]
impl AudioTranscoder for FakeTranscoder {
    async fn transcode_to_mp3(&self, _audio: &[u8]) -> Result<Vec<u8>, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Gateway("simulated transcoder failure".to_string()));
        }
        Ok(b"mp3-bytes".to_vec())
    }
}

pub struct FakeAnalyzer;

#[async_trait]
impl AnalysisProvider for FakeAnalyzer {
    async fn analyze(&self, _audio: &[u8]) -> Result<serde_json::Value, AppError> {
        Ok(analysis_blob())
    }
}
