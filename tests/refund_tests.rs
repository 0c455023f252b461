mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sea_orm::EntityTrait;
use uuid::Uuid;

use presong::entities::order;
use presong::services::refunds::{RefundOutcome, RefundService};

use common::*;

async fn reload(db: &sea_orm::DatabaseConnection, id: Uuid) -> order::Model {
    order::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("reload order")
        .expect("order exists")
}

#[tokio::test]
async fn gateway_failure_leaves_order_unrefunded() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let buyer = create_user(&db, "bob").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;
    let order_model = create_order(&db, song.id, buyer.id, 1000).await;

    let gateway = Arc::new(FakeGateway::new(true));
    let refunds = RefundService::new(db.clone(), gateway.clone());

    refunds.refund(order_model.id).await.unwrap_err();
    assert_eq!(gateway.call_count(), 1);
    assert!(!reload(&db, order_model.id).await.refunded);

    // The gateway recovers; the retry goes through and flips the flag.
    gateway.fail.store(false, Ordering::SeqCst);
    let outcome = refunds.refund(order_model.id).await.unwrap();
    assert_eq!(outcome, RefundOutcome::Refunded);
    assert!(reload(&db, order_model.id).await.refunded);

    // Refunding an already-refunded order is a clean no-op that never
    // contacts the gateway again.
    let outcome = refunds.refund(order_model.id).await.unwrap();
    assert_eq!(outcome, RefundOutcome::AlreadyRefunded);
    assert_eq!(gateway.call_count(), 2);
}

#[tokio::test]
async fn refund_does_not_mark_delivered_state() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let buyer = create_user(&db, "bob").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;
    let order_model = create_order(&db, song.id, buyer.id, 1000).await;

    let refunds = RefundService::new(db.clone(), Arc::new(FakeGateway::new(false)));
    refunds.refund(order_model.id).await.unwrap();

    let after = reload(&db, order_model.id).await;
    assert!(after.refunded);
    assert!(!after.delivered);
}

#[tokio::test]
async fn batch_refund_isolates_per_order_failures() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let buyer = create_user(&db, "bob").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;

    let fresh = create_order(&db, song.id, buyer.id, 500).await;
    let already = create_order(&db, song.id, buyer.id, 750).await;

    let gateway = Arc::new(FakeGateway::new(false));
    let refunds = RefundService::new(db.clone(), gateway.clone());
    refunds.refund(already.id).await.unwrap();

    // Mixed batch: one fresh, one already refunded, one unknown id.
    let result = refunds
        .refund_batch(&[fresh.id, already.id, Uuid::new_v4()])
        .await;

    assert_eq!(result.refunded, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.failed.len(), 1);
    assert!(reload(&db, fresh.id).await.refunded);
}
