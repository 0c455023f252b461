pub use sea_orm_migration::prelude::*;

mod m20260715_000001_create_users_table;
mod m20260715_000002_create_refresh_tokens_table;
mod m20260715_000003_create_artists_table;
mod m20260715_000004_create_songs_table;
mod m20260715_000005_create_snippets_table;
mod m20260715_000006_create_orders_table;
mod m20260715_000007_create_artist_payments_table;
mod m20260715_000008_create_artist_payment_orders_table;
mod m20260715_000009_create_comments_table;
mod m20260715_000010_create_jobs_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260715_000001_create_users_table::Migration),
            Box::new(m20260715_000002_create_refresh_tokens_table::Migration),
            Box::new(m20260715_000003_create_artists_table::Migration),
            Box::new(m20260715_000004_create_songs_table::Migration),
            Box::new(m20260715_000005_create_snippets_table::Migration),
            Box::new(m20260715_000006_create_orders_table::Migration),
            Box::new(m20260715_000007_create_artist_payments_table::Migration),
            Box::new(m20260715_000008_create_artist_payment_orders_table::Migration),
            Box::new(m20260715_000009_create_comments_table::Migration),
            Box::new(m20260715_000010_create_jobs_table::Migration),
        ]
    }
}
