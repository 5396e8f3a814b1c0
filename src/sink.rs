use futures_util::{Stream, StreamExt};
use serde_json::Value;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use tracing::{debug, warn};

use crate::archive::Archive;
use crate::error::Error;
use crate::parse::{is_retweet, parse_tweet};
use crate::store;

/// Where downloaded messages end up.
pub enum Sink {
    /// Extract each tweet and insert it as one row.
    MySql {
        conn: MySqlConnection,
        table: String,
    },
    /// Keep the raw message in time bucketed gzip files.
    Archive(Archive),
}

impl Sink {
    /// Store one message. A failure only concerns this message; the caller
    /// logs it and moves on.
    pub async fn accept(&mut self, message: &Value) -> Result<(), Error> {
        match self {
            Sink::MySql { conn, table } => {
                let tweet = parse_tweet(message)?;
                store::insert_tweet(&mut *conn, table.as_str(), &tweet).await?;
                debug!(
                    table = %table,
                    "inserted {}",
                    serde_json::to_string(&tweet).unwrap_or_default()
                );
            }
            Sink::Archive(archive) => {
                archive.append(message)?;
            }
        }
        Ok(())
    }

    /// Consume raw messages until the stream ends or fails.
    ///
    /// Malformed JSON, skipped retweets and messages the sink rejects do not
    /// stop the run. A stream error does, after everything before it was
    /// stored. Returns the number of stored messages and that error, if any.
    pub async fn drain<S>(&mut self, messages: S, skip_retweets: bool) -> (usize, Result<(), Error>)
    where
        S: Stream<Item = Result<String, Error>>,
    {
        futures_util::pin_mut!(messages);

        let mut stored = 0;
        while let Some(message) = messages.next().await {
            let raw = match message {
                Ok(raw) => raw,
                Err(e) => return (stored, Err(e)),
            };
            let json: Value = match serde_json::from_str(&raw) {
                Ok(json) => json,
                Err(e) => {
                    warn!("skipping malformed message: {}", e);
                    continue;
                }
            };
            if skip_retweets && is_retweet(&json) {
                debug!("skipping retweet");
                continue;
            }
            match self.accept(&json).await {
                Ok(()) => stored += 1,
                Err(e) => warn!("skipping message: {}", e),
            }
        }
        (stored, Ok(()))
    }

    pub async fn close(self) {
        if let Sink::MySql { conn, .. } = self {
            if let Err(e) = conn.close().await {
                warn!("unable to close mysql connection: {}", e);
            }
        }
    }
}
