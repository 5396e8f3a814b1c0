//! Tweet table access.
//!
//! Query functions take a generic `Executor` so they work against a single
//! `MySqlConnection` as well as a pool or transaction. The table name comes
//! from the configuration file and is validated there before it is spliced in.

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor, MySql};
use time::macros::format_description;
use time::{PrimitiveDateTime, UtcOffset};
use tracing::debug;

use crate::analysis::TextRecord;
use crate::config::MySqlSettings;
use crate::error::Error;
use crate::tweet::Tweet;

pub const COLUMNS: [&str; 11] = [
    "tweet_id",
    "tweet",
    "created_at",
    "tweet_place",
    "favorite_count",
    "retweet_count",
    "reply_count",
    "user_name",
    "user_location",
    "user_followers_count",
    "user_friends_count",
];

/// Open the single connection used for a whole run.
pub async fn connect(settings: &MySqlSettings) -> Result<MySqlConnection, Error> {
    let (host, port) = match settings.host.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host, Some(port)),
            Err(_) => (settings.host.as_str(), None),
        },
        None => (settings.host.as_str(), None),
    };

    let mut options = MySqlConnectOptions::new()
        .host(host)
        .username(&settings.username)
        .password(&settings.password)
        .database(&settings.database)
        .charset("utf8mb4");
    if let Some(port) = port {
        options = options.port(port);
    }

    let conn = MySqlConnection::connect_with(&options).await?;
    debug!(host, database = %settings.database, user = %settings.username, "connected to mysql");
    Ok(conn)
}

pub fn create_table_statement(table: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
            tweet_id BIGINT UNSIGNED NOT NULL,
            tweet TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            tweet_place VARCHAR(255),
            favorite_count BIGINT UNSIGNED NOT NULL DEFAULT 0,
            retweet_count BIGINT UNSIGNED NOT NULL DEFAULT 0,
            reply_count BIGINT UNSIGNED NOT NULL DEFAULT 0,
            user_name VARCHAR(255) NOT NULL,
            user_location VARCHAR(255),
            user_followers_count BIGINT UNSIGNED NOT NULL DEFAULT 0,
            user_friends_count BIGINT UNSIGNED NOT NULL DEFAULT 0
        ) DEFAULT CHARSET = utf8mb4"#,
        table
    )
}

pub fn insert_statement(table: &str) -> String {
    let placeholders = vec!["?"; COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        COLUMNS.join(", "),
        placeholders
    )
}

pub async fn create_table<'e, E>(executor: E, table: &str) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let query = create_table_statement(table);
    sqlx::query(&query).execute(executor).await?;
    Ok(())
}

/// Insert one extracted tweet. Each statement commits on its own.
pub async fn insert_tweet<'e, E>(executor: E, table: &str, tweet: &Tweet) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let query = insert_statement(table);
    let created_at = tweet.created_at.to_offset(UtcOffset::UTC);
    let created_at = PrimitiveDateTime::new(created_at.date(), created_at.time());

    let result = sqlx::query(&query)
        .bind(tweet.id)
        .bind(&tweet.text)
        .bind(created_at)
        .bind(tweet.place_or_null())
        .bind(tweet.favorite_count)
        .bind(tweet.retweet_count)
        .bind(tweet.reply_count)
        .bind(&tweet.user.screen_name)
        .bind(tweet.user.location_or_null())
        .bind(tweet.user.followers_count)
        .bind(tweet.user.friends_count)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Load every stored tweet text with its creation time.
pub async fn fetch_texts<'e, E>(executor: E, table: &str) -> Result<Vec<TextRecord>, Error>
where
    E: Executor<'e, Database = MySql>,
{
    let query = format!("SELECT created_at, tweet FROM {}", table);
    let rows: Vec<(Option<PrimitiveDateTime>, String)> =
        sqlx::query_as(&query).fetch_all(executor).await?;

    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    rows.into_iter()
        .map(|(created_at, text)| {
            let created_at = created_at
                .map(|t| t.format(format))
                .transpose()
                .map_err(|e| Error::InvalidTimestamp(e.to_string()))?;
            Ok(TextRecord { created_at, text })
        })
        .collect()
}
