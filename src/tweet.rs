use serde::Serialize;
use time::OffsetDateTime;

/// Marker stored in the table for absent optional strings.
pub const NULL_MARKER: &str = "NULL";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tweet {
    pub id: u64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub place: Option<String>,
    pub favorite_count: u64,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub screen_name: String,
    pub location: Option<String>,
    pub followers_count: u64,
    pub friends_count: u64,
}

impl Tweet {
    pub fn place_or_null(&self) -> &str {
        self.place.as_deref().unwrap_or(NULL_MARKER)
    }
}

impl User {
    pub fn location_or_null(&self) -> &str {
        self.location.as_deref().unwrap_or(NULL_MARKER)
    }
}
