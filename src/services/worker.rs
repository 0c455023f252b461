use std::sync::Arc;
use std::time::Duration;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use tokio::time::sleep;

use crate::entities::job::{self, JobKind, JobStatus};
use crate::services::audio::{AnalysisProvider, AudioTranscoder};
use crate::services::lifecycle;
use crate::services::storage::BlobStore;

/// Drains the job queue: claims one pending job at a time, runs it through
/// the external audio collaborators, and routes the result into the
/// lifecycle callbacks. Jobs are claimed with a conditional status update so
/// each runs at most once even with several workers polling.
pub struct Worker {
    db: DatabaseConnection,
    store: Arc<dyn BlobStore>,
    transcoder: Arc<dyn AudioTranscoder>,
    analyzer: Arc<dyn AnalysisProvider>,
}

impl Worker {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn BlobStore>,
        transcoder: Arc<dyn AudioTranscoder>,
        analyzer: Arc<dyn AnalysisProvider>,
    ) -> Self {
        Self {
            db,
            store,
            transcoder,
            analyzer,
        }
    }

    pub async fn run(&self) {
        tracing::info!("Worker | started");

        // Jobs stuck in 'processing' from a previous run go back to pending.
        match self.recover_stuck_jobs().await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Worker | recovered {} stuck jobs", n),
            Err(e) => tracing::error!("Worker | failed to recover stuck jobs: {}", e),
        }

        loop {
            match self.tick().await {
                Ok(true) => {} // keep draining without sleeping
                Ok(false) => sleep(Duration::from_secs(5)).await,
                Err(e) => {
                    tracing::error!("Worker | error: {}", e);
                    sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    pub async fn recover_stuck_jobs(&self) -> Result<u64, DbErr> {
        let rows = job::Entity::update_many()
            .col_expr(job::Column::Status, Expr::value(JobStatus::Pending))
            .col_expr(
                job::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(job::Column::Status.eq(JobStatus::Processing))
            .exec(&self.db)
            .await?
            .rows_affected;
        Ok(rows)
    }

    /// Claims and runs at most one pending job. Returns whether there was
    /// anything to look at (claimed or lost to another worker).
    pub async fn tick(&self) -> Result<bool, DbErr> {
        let pending = job::Entity::find()
            .filter(job::Column::Status.eq(JobStatus::Pending))
            .order_by_asc(job::Column::CreatedAt)
            .one(&self.db)
            .await?;

        let Some(job_model) = pending else {
            return Ok(false);
        };

        let claimed = job::Entity::update_many()
            .col_expr(job::Column::Status, Expr::value(JobStatus::Processing))
            .col_expr(
                job::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(job::Column::Id.eq(job_model.id))
            .filter(job::Column::Status.eq(JobStatus::Pending))
            .exec(&self.db)
            .await?
            .rows_affected;

        if claimed == 0 {
            // Another worker got there first; look again straight away.
            return Ok(true);
        }

        tracing::info!("Worker | picked up {:?} job {}", job_model.kind, job_model.id);
        let started = std::time::Instant::now();

        match self.handle(&job_model).await {
            Ok(()) => {
                tracing::info!(
                    "Worker | job {} completed in {:.2?}",
                    job_model.id,
                    started.elapsed()
                );
                self.finish_job(job_model.id, JobStatus::Completed, None)
                    .await?;
            }
            Err(message) => {
                tracing::error!("Worker | job {} failed: {}", job_model.id, message);
                self.finish_job(job_model.id, JobStatus::Failed, Some(message.clone()))
                    .await?;
                if let Err(e) =
                    lifecycle::on_processing_failed(&self.db, job_model.snippet_id, &message).await
                {
                    tracing::error!(
                        "Worker | failed to record processing error for snippet {}: {}",
                        job_model.snippet_id,
                        e
                    );
                }
            }
        }

        Ok(true)
    }

    async fn finish_job(
        &self,
        job_id: uuid::Uuid,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<(), DbErr> {
        job::Entity::update_many()
            .col_expr(job::Column::Status, Expr::value(status))
            .col_expr(job::Column::Error, Expr::value(error))
            .col_expr(
                job::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(job::Column::Id.eq(job_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn handle(&self, job_model: &job::Model) -> Result<(), String> {
        let snippet = crate::entities::snippet::Entity::find_by_id(job_model.snippet_id)
            .one(&self.db)
            .await
            .map_err(|e| e.to_string())?
            .ok_or("Snippet not found")?;

        let uploaded_key = snippet
            .uploaded_audio
            .as_deref()
            .ok_or("Snippet has no uploaded audio")?;

        let audio = self
            .store
            .get(uploaded_key)
            .await
            .map_err(|e| format!("{:?}", e))?;

        match job_model.kind {
            JobKind::Transcode => {
                let mp3 = self
                    .transcoder
                    .transcode_to_mp3(&audio)
                    .await
                    .map_err(|e| format!("{:?}", e))?;

                let mp3_key = format!("snippets/audio/mp3/{}.mp3", snippet.id);
                self.store
                    .put(&mp3_key, mp3, "audio/mpeg")
                    .await
                    .map_err(|e| format!("{:?}", e))?;

                lifecycle::on_transcode_complete(&self.db, snippet.id, mp3_key)
                    .await
                    .map_err(|e| e.to_string())?;
            }
            JobKind::Analysis => {
                let data = self
                    .analyzer
                    .analyze(&audio)
                    .await
                    .map_err(|e| format!("{:?}", e))?;

                lifecycle::on_analysis_complete(&self.db, snippet.id, data)
                    .await
                    .map_err(|e| e.to_string())?;
            }
        }

        Ok(())
    }
}
