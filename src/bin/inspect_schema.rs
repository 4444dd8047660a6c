//! Prints the columns of the MailChimp mirror tables.

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

const MIRROR_TABLES: &[&str] = &["mailchimp_lists", "mailchimp_members"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url = env::var("DB_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("DB_URL or DATABASE_URL must be set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    for table in MIRROR_TABLES {
        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns WHERE table_name = $1 ORDER BY ordinal_position"
        )
        .bind(table)
        .fetch_all(&pool)
        .await?;

        if columns.is_empty() {
            println!("{}: missing", table);
            continue;
        }

        println!("{}:", table);
        for (column, data_type, nullable) in columns {
            let null_marker = if nullable == "YES" { " (nullable)" } else { "" };
            println!("  - {}: {}{}", column, data_type, null_marker);
        }
        println!();
    }

    Ok(())
}
