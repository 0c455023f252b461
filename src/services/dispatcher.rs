use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

use crate::entities::job::{self, JobKind, JobStatus};
use crate::error::AppError;

/// Fire-and-forget job dispatch. The caller never waits on job completion;
/// results flow back through the lifecycle callbacks.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    async fn enqueue(&self, kind: JobKind, snippet_id: Uuid) -> Result<(), AppError>;
}

/// Database-backed dispatcher: one row per job, drained by the worker.
pub struct QueueDispatcher {
    db: DatabaseConnection,
}

impl QueueDispatcher {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskDispatcher for QueueDispatcher {
    async fn enqueue(&self, kind: JobKind, snippet_id: Uuid) -> Result<(), AppError> {
        let now = chrono::Utc::now().naive_utc();
        let job = job::ActiveModel {
            id: Set(Uuid::new_v4()),
            snippet_id: Set(snippet_id),
            kind: Set(kind.clone()),
            status: Set(JobStatus::Pending),
            error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        job.insert(&self.db).await.map_err(AppError::DatabaseError)?;
        tracing::debug!("Dispatcher | enqueued {:?} for snippet {}", kind, snippet_id);

        Ok(())
    }
}
