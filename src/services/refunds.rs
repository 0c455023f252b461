use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::entities::order;
use crate::error::AppError;
use crate::services::stripe::PaymentGateway;

#[derive(Debug, PartialEq, Eq)]
pub enum RefundOutcome {
    Refunded,
    /// The order was already refunded; the gateway was not contacted.
    AlreadyRefunded,
}

#[derive(Debug, Default, serde::Serialize, utoipa::ToSchema)]
pub struct BatchRefundResult {
    pub refunded: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
}

/// Refund workflow, serialized per order. The gateway reversal runs first
/// and the refunded flag only flips after it succeeds, so a gateway failure
/// leaves no partial state. The per-order lock plus the conditional update
/// keyed on refunded = false keep concurrent admin actions from double
/// refunding.
pub struct RefundService {
    db: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl RefundService {
    pub fn new(db: DatabaseConnection, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            db,
            gateway,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn order_lock(&self, order_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("refund lock registry poisoned");
        locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub async fn refund(&self, order_id: Uuid) -> Result<RefundOutcome, AppError> {
        let lock = self.order_lock(order_id);
        let _guard = lock.lock().await;

        let order = order::Entity::find_by_id(order_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

        if order.refunded {
            return Ok(RefundOutcome::AlreadyRefunded);
        }

        self.gateway
            .reverse_charge(&order.stripe_transaction_id)
            .await?;

        let rows = order::Entity::update_many()
            .col_expr(order::Column::Refunded, Expr::value(true))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Refunded.eq(false))
            .exec(&self.db)
            .await?
            .rows_affected;

        if rows == 0 {
            // Lost a race after the gateway call; the charge is reversed
            // either way and the flag is already set.
            return Ok(RefundOutcome::AlreadyRefunded);
        }

        tracing::info!("Refunds | order {} refunded", order_id);
        Ok(RefundOutcome::Refunded)
    }

    /// Bulk admin action. Already-refunded orders are skipped silently;
    /// gateway or lookup failures are collected per order so one bad item
    /// never aborts the batch.
    pub async fn refund_batch(&self, order_ids: &[Uuid]) -> BatchRefundResult {
        let mut result = BatchRefundResult::default();

        for &order_id in order_ids {
            match self.refund(order_id).await {
                Ok(RefundOutcome::Refunded) => result.refunded += 1,
                Ok(RefundOutcome::AlreadyRefunded) => result.skipped += 1,
                Err(e) => {
                    tracing::warn!("Refunds | order {} failed: {:?}", order_id, e);
                    result.failed.push(format!("{}: {:?}", order_id, e));
                }
            }
        }

        result
    }
}
