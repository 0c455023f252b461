use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait};
use uuid::Uuid;

use crate::entities::{artist_payment, artist_payment_order, order};
use crate::error::AppError;
use crate::repo;

/// Sum of order prices in cents. The total of a payout batch is always
/// derived from its member orders, never stored.
pub fn total_cents(orders: &[order::Model]) -> i64 {
    orders.iter().map(|o| o.price).sum()
}

pub fn total_amount(orders: &[order::Model]) -> f64 {
    total_cents(orders) as f64 / 100.0
}

pub fn format_amount(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

/// Materializes the artist's unpaid orders into a new payout batch with
/// fixed membership. Returns None when there is nothing to pay out.
pub async fn create_payment(
    db: &DatabaseConnection,
    artist_id: i32,
) -> Result<Option<(artist_payment::Model, Vec<order::Model>)>, AppError> {
    let orders = repo::orders::unpaid_for_artist(db, artist_id).await?;
    if orders.is_empty() {
        return Ok(None);
    }

    let txn = db.begin().await?;

    let payment = artist_payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        artist_id: Set(artist_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
        paid: Set(false),
        paid_at: Set(None),
    }
    .insert(&txn)
    .await?;

    for member in &orders {
        artist_payment_order::ActiveModel {
            payment_id: Set(payment.id),
            order_id: Set(member.id),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    tracing::info!(
        "Payouts | payment {} created for artist {} over {} orders ({})",
        payment.id,
        artist_id,
        orders.len(),
        format_amount(total_cents(&orders))
    );

    Ok(Some((payment, orders)))
}

/// Flips paid once and stamps paid_at; later calls are a no-op. Returns
/// whether this call performed the flip.
pub async fn mark_paid(db: &DatabaseConnection, payment_id: Uuid) -> Result<bool, AppError> {
    let rows = artist_payment::Entity::update_many()
        .col_expr(artist_payment::Column::Paid, Expr::value(true))
        .col_expr(
            artist_payment::Column::PaidAt,
            Expr::value(Some(chrono::Utc::now().naive_utc())),
        )
        .filter(artist_payment::Column::Id.eq(payment_id))
        .filter(artist_payment::Column::Paid.eq(false))
        .exec(db)
        .await?
        .rows_affected;

    Ok(rows == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_price(price: i64) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            song_id: Uuid::new_v4(),
            purchaser_id: 1,
            price,
            refunded: false,
            delivered: false,
            created_at: chrono::Utc::now().naive_utc(),
            stripe_transaction_id: "ch_test".to_string(),
        }
    }

    #[test]
    fn total_amount_sums_cents_as_currency() {
        let orders = vec![order_with_price(500), order_with_price(750)];
        assert_eq!(total_cents(&orders), 1250);
        assert_eq!(total_amount(&orders), 12.50);
    }

    #[test]
    fn format_amount_renders_two_decimals() {
        assert_eq!(format_amount(1250), "$12.50");
        assert_eq!(format_amount(1205), "$12.05");
        assert_eq!(format_amount(99), "$0.99");
        assert_eq!(format_amount(0), "$0.00");
    }
}
