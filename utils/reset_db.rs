use sea_orm::{ConnectionTrait, Database, DbBackend, Statement};
use std::env;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = Database::connect(database_url)
        .await
        .expect("Failed to connect to database");

    let tables = [
        "jobs",
        "comments",
        "artist_payment_orders",
        "artist_payments",
        "orders",
        "snippets",
        "songs",
        "artists",
        "refresh_tokens",
        "users",
        "seaql_migrations",
    ];

    for table in tables {
        db.execute(Statement::from_string(
            DbBackend::Postgres,
            format!("DROP TABLE IF EXISTS \"{}\" CASCADE;", table),
        ))
        .await
        .unwrap();
    }

    println!("Database reset successfully");
}
