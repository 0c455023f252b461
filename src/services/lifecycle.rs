//! The snippet/order workflow engine.
//!
//! Snippets move processing → ready → published, with processing_error as a
//! recoverable side state while background jobs fail. Every transition is
//! applied as a conditional update keyed on the current state, so two racing
//! attempts (the two background jobs complete independently and in any
//! order) flip state at most once. Nothing ever moves a snippet back to
//! processing except an explicit admin retry of a failed one.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::job::JobKind;
use crate::entities::snippet::{self, SnippetState};
use crate::entities::{order, song};
use crate::error::AppError;
use crate::services::dispatcher::TaskDispatcher;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("snippet is in state {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: SnippetState,
        actual: SnippetState,
    },
    #[error("transcoded audio must be present before the snippet is marked ready")]
    MissingAudio,
    #[error("analysis data must be present before the snippet is marked ready")]
    MissingAnalysis,
    #[error("snippet state changed concurrently")]
    Conflict,
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Db(e) => AppError::DatabaseError(e),
            LifecycleError::InvalidState { .. } | LifecycleError::Conflict => {
                AppError::Conflict(err.to_string())
            }
            LifecycleError::MissingAudio | LifecycleError::MissingAnalysis => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

/// processing → ready. Preconditions: the snippet is still processing and
/// both the transcoded audio and the analysis data exist. A violated
/// precondition is a broken invariant upstream; it propagates as an error
/// and nothing is mutated.
pub async fn mark_ready(
    db: &DatabaseConnection,
    snippet: &snippet::Model,
) -> Result<(), LifecycleError> {
    if snippet.state != SnippetState::Processing {
        return Err(LifecycleError::InvalidState {
            expected: SnippetState::Processing,
            actual: snippet.state.clone(),
        });
    }
    if snippet.audio_mp3.is_none() {
        return Err(LifecycleError::MissingAudio);
    }
    if snippet.analysis_data.is_none() {
        return Err(LifecycleError::MissingAnalysis);
    }

    let rows = snippet::Entity::update_many()
        .col_expr(snippet::Column::State, Expr::value(SnippetState::Ready))
        .filter(snippet::Column::Id.eq(snippet.id))
        .filter(snippet::Column::State.eq(SnippetState::Processing))
        .exec(db)
        .await?
        .rows_affected;

    if rows == 0 {
        return Err(LifecycleError::Conflict);
    }

    tracing::info!("Lifecycle | snippet {} marked ready", snippet.id);
    Ok(())
}

/// Callback-path variant of `mark_ready`: each completing job calls this
/// once, and only the first call that finds both prerequisites present flips
/// the state. Returns whether this call performed the transition.
pub async fn try_mark_ready(
    db: &DatabaseConnection,
    snippet_id: Uuid,
) -> Result<bool, LifecycleError> {
    let Some(snippet) = snippet::Entity::find_by_id(snippet_id).one(db).await? else {
        return Ok(false);
    };

    if snippet.state != SnippetState::Processing
        || snippet.audio_mp3.is_none()
        || snippet.analysis_data.is_none()
    {
        return Ok(false);
    }

    let rows = snippet::Entity::update_many()
        .col_expr(snippet::Column::State, Expr::value(SnippetState::Ready))
        .filter(snippet::Column::Id.eq(snippet_id))
        .filter(snippet::Column::State.eq(SnippetState::Processing))
        .exec(db)
        .await?
        .rows_affected;

    if rows == 1 {
        tracing::info!("Lifecycle | snippet {} marked ready", snippet_id);
    }
    Ok(rows == 1)
}

/// ready → published, artist-triggered. The only precondition is the state
/// itself; there is no path back.
pub async fn publish(
    db: &DatabaseConnection,
    snippet: &snippet::Model,
) -> Result<(), LifecycleError> {
    if snippet.state != SnippetState::Ready {
        return Err(LifecycleError::InvalidState {
            expected: SnippetState::Ready,
            actual: snippet.state.clone(),
        });
    }

    let rows = snippet::Entity::update_many()
        .col_expr(snippet::Column::State, Expr::value(SnippetState::Published))
        .filter(snippet::Column::Id.eq(snippet.id))
        .filter(snippet::Column::State.eq(SnippetState::Ready))
        .exec(db)
        .await?
        .rows_affected;

    if rows == 0 {
        return Err(LifecycleError::Conflict);
    }

    tracing::info!("Lifecycle | snippet {} published", snippet.id);
    Ok(())
}

/// Enqueues the two independent processing jobs for a freshly uploaded
/// snippet. Does not touch snippet state; the jobs report back through the
/// callbacks below, in whatever order they finish.
pub async fn process_uploaded_audio(
    dispatcher: &dyn TaskDispatcher,
    snippet_id: Uuid,
) -> Result<(), AppError> {
    dispatcher.enqueue(JobKind::Transcode, snippet_id).await?;
    dispatcher.enqueue(JobKind::Analysis, snippet_id).await?;
    Ok(())
}

/// Transcode job callback: record the mp3 blob key, then attempt the ready
/// transition in case the analysis already landed.
pub async fn on_transcode_complete(
    db: &DatabaseConnection,
    snippet_id: Uuid,
    audio_key: String,
) -> Result<bool, LifecycleError> {
    snippet::Entity::update_many()
        .col_expr(snippet::Column::AudioMp3, Expr::value(Some(audio_key)))
        .filter(snippet::Column::Id.eq(snippet_id))
        .exec(db)
        .await?;

    try_mark_ready(db, snippet_id).await
}

/// Analysis job callback: record the analysis blob, then attempt the ready
/// transition in case the transcode already landed.
pub async fn on_analysis_complete(
    db: &DatabaseConnection,
    snippet_id: Uuid,
    data: serde_json::Value,
) -> Result<bool, LifecycleError> {
    snippet::Entity::update_many()
        .col_expr(snippet::Column::AnalysisData, Expr::value(Some(data)))
        .filter(snippet::Column::Id.eq(snippet_id))
        .exec(db)
        .await?;

    try_mark_ready(db, snippet_id).await
}

/// Failure callback for either job: park the snippet in processing_error
/// with a message administrators can read. Only applies while the snippet is
/// still processing; a snippet that already became ready stays ready.
pub async fn on_processing_failed(
    db: &DatabaseConnection,
    snippet_id: Uuid,
    message: &str,
) -> Result<(), LifecycleError> {
    snippet::Entity::update_many()
        .col_expr(
            snippet::Column::State,
            Expr::value(SnippetState::ProcessingError),
        )
        .col_expr(
            snippet::Column::ProcessingError,
            Expr::value(Some(message.to_string())),
        )
        .filter(snippet::Column::Id.eq(snippet_id))
        .filter(snippet::Column::State.eq(SnippetState::Processing))
        .exec(db)
        .await?;

    tracing::warn!("Lifecycle | snippet {} processing failed: {}", snippet_id, message);
    Ok(())
}

/// Bulk admin action: for every snippet of the given songs sitting in
/// processing_error, reset it to processing and re-enqueue both jobs.
/// Snippets in any other state are skipped silently, and a failure on one
/// snippet never aborts the rest of the batch. Returns how many were
/// re-enqueued.
pub async fn retry_processing(
    db: &DatabaseConnection,
    dispatcher: &dyn TaskDispatcher,
    song_ids: &[Uuid],
) -> Result<usize, LifecycleError> {
    if song_ids.is_empty() {
        return Ok(0);
    }

    let failed = snippet::Entity::find()
        .filter(snippet::Column::SongId.is_in(song_ids.iter().copied()))
        .filter(snippet::Column::State.eq(SnippetState::ProcessingError))
        .all(db)
        .await?;

    let mut retried = 0;
    for failed_snippet in failed {
        let claimed = snippet::Entity::update_many()
            .col_expr(snippet::Column::State, Expr::value(SnippetState::Processing))
            .col_expr(
                snippet::Column::ProcessingError,
                Expr::value(Option::<String>::None),
            )
            .filter(snippet::Column::Id.eq(failed_snippet.id))
            .filter(snippet::Column::State.eq(SnippetState::ProcessingError))
            .exec(db)
            .await?
            .rows_affected;

        if claimed == 0 {
            continue;
        }

        if let Err(e) = process_uploaded_audio(dispatcher, failed_snippet.id).await {
            tracing::warn!(
                "Lifecycle | retry enqueue failed for snippet {}: {:?}",
                failed_snippet.id,
                e
            );
            continue;
        }

        retried += 1;
    }

    Ok(retried)
}

/// Records the finished audio for a song and stamps completed_at the first
/// time, then delivers every eligible order. Refunded orders are never
/// delivered. Returns how many orders were delivered by this call.
pub async fn complete_song(
    db: &DatabaseConnection,
    song_id: Uuid,
    audio_key: String,
) -> Result<u64, LifecycleError> {
    let now = chrono::Utc::now().naive_utc();

    song::Entity::update_many()
        .col_expr(song::Column::CompleteAudio, Expr::value(Some(audio_key)))
        .col_expr(song::Column::CompletedAt, Expr::value(Some(now)))
        .filter(song::Column::Id.eq(song_id))
        .filter(song::Column::CompletedAt.is_null())
        .exec(db)
        .await?;

    let delivered = order::Entity::update_many()
        .col_expr(order::Column::Delivered, Expr::value(true))
        .filter(order::Column::SongId.eq(song_id))
        .filter(order::Column::Refunded.eq(false))
        .filter(order::Column::Delivered.eq(false))
        .exec(db)
        .await?
        .rows_affected;

    if delivered > 0 {
        tracing::info!("Lifecycle | song {} delivered {} orders", song_id, delivered);
    }
    Ok(delivered)
}
