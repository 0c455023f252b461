use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::dispatcher::TaskDispatcher;
use crate::services::refunds::RefundService;
use crate::services::storage::BlobStore;

/// Everything the handlers need, constructed once at process start and
/// passed explicitly. No globals beyond the env-derived Config.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub store: Arc<dyn BlobStore>,
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub refunds: Arc<RefundService>,
}
