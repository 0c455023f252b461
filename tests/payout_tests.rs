mod common;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use presong::entities::{artist_payment, order};
use presong::repo;
use presong::services::payouts;

use common::*;

#[tokio::test]
async fn unpaid_orders_exclude_refunded_and_attached() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let other_account = create_user(&db, "eve").await;
    let buyer = create_user(&db, "bob").await;
    let artist = create_artist(&db, &account).await;
    let other_artist = create_artist(&db, &other_account).await;
    let song = create_song(&db, artist.id).await;
    let other_song = create_song(&db, other_artist.id).await;

    let open = create_order(&db, song.id, buyer.id, 500).await;
    let refunded = create_order(&db, song.id, buyer.id, 750).await;
    order::Entity::update_many()
        .col_expr(order::Column::Refunded, Expr::value(true))
        .filter(order::Column::Id.eq(refunded.id))
        .exec(&db)
        .await
        .unwrap();

    // Someone else's order never rolls up into this artist's payout.
    create_order(&db, other_song.id, buyer.id, 9000).await;

    let unpaid = repo::orders::unpaid_for_artist(&db, artist.id).await.unwrap();
    assert_eq!(unpaid.len(), 1);
    assert_eq!(unpaid[0].id, open.id);
}

#[tokio::test]
async fn payment_fixes_membership_and_derives_total() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let buyer = create_user(&db, "bob").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;

    create_order(&db, song.id, buyer.id, 500).await;
    create_order(&db, song.id, buyer.id, 750).await;

    let (payment, members) = payouts::create_payment(&db, artist.id)
        .await
        .unwrap()
        .expect("payment created");
    assert_eq!(members.len(), 2);
    assert_eq!(payouts::total_cents(&members), 1250);
    assert_eq!(payouts::total_amount(&members), 12.50);
    assert_eq!(payouts::format_amount(payouts::total_cents(&members)), "$12.50");

    // Attached orders no longer count as unpaid, so an immediate second run
    // finds nothing to pay out.
    assert!(payouts::create_payment(&db, artist.id).await.unwrap().is_none());

    // A later order lands in a fresh batch; membership of the first batch is
    // fixed at creation.
    let late = create_order(&db, song.id, buyer.id, 300).await;
    let (second_payment, second_members) = payouts::create_payment(&db, artist.id)
        .await
        .unwrap()
        .expect("second payment created");
    assert_ne!(second_payment.id, payment.id);
    assert_eq!(second_members.len(), 1);
    assert_eq!(second_members[0].id, late.id);
}

#[tokio::test]
async fn mark_paid_flips_once_and_stamps_paid_at() {
    let db = setup_db().await;
    let account = create_user(&db, "ada").await;
    let buyer = create_user(&db, "bob").await;
    let artist = create_artist(&db, &account).await;
    let song = create_song(&db, artist.id).await;
    create_order(&db, song.id, buyer.id, 500).await;

    let (payment, _) = payouts::create_payment(&db, artist.id)
        .await
        .unwrap()
        .expect("payment created");
    assert!(!payment.paid);
    assert!(payment.paid_at.is_none());

    assert!(payouts::mark_paid(&db, payment.id).await.unwrap());

    let paid = artist_payment::Entity::find_by_id(payment.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(paid.paid);
    let stamped_at = paid.paid_at.expect("paid_at stamped");

    // Marking again is a no-op and keeps the original stamp.
    assert!(!payouts::mark_paid(&db, payment.id).await.unwrap());
    let still_paid = artist_payment::Entity::find_by_id(payment.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still_paid.paid_at, Some(stamped_at));
}
