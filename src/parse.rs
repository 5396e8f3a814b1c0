use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::Error;
use crate::tweet::{Tweet, User};

/// Extract a [`Tweet`] from one decoded stream message.
///
/// Missing optional fields fall back to defaults. Missing required fields
/// (`id`, `text`, `created_at`, `user.screen_name`) are an error and the
/// message should be skipped.
pub fn parse_tweet(json: &Value) -> Result<Tweet, Error> {
    let id = parse_tweet_id(json)?;
    let text = parse_tweet_text(json)?;
    let created_at = parse_tweet_time(json)?;
    let user = parse_user(json)?;

    Ok(Tweet {
        id,
        text,
        created_at,
        place: parse_tweet_place(json),
        favorite_count: parse_count(json, "favorite_count"),
        retweet_count: parse_count(json, "retweet_count"),
        reply_count: parse_count(json, "reply_count"),
        user,
    })
}

pub fn parse_tweet_str(raw: &str) -> Result<Tweet, Error> {
    let json: Value = serde_json::from_str(raw)?;
    parse_tweet(&json)
}

/// Whether the message is a retweet of another status.
pub fn is_retweet(json: &Value) -> bool {
    json.get("retweeted_status").is_some_and(|v| !v.is_null())
}

fn parse_tweet_id(json: &Value) -> Result<u64, Error> {
    if let Some(id) = json.get("id").and_then(Value::as_u64) {
        return Ok(id);
    }
    json.get("id_str")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or(Error::MissingField("id"))
}

fn parse_tweet_text(json: &Value) -> Result<String, Error> {
    // Streamed statuses over 140 characters carry the untruncated body here
    let extended = json
        .get("extended_tweet")
        .and_then(|e| e.get("full_text"))
        .and_then(Value::as_str);

    extended
        .or_else(|| json.get("text").and_then(Value::as_str))
        .or_else(|| json.get("full_text").and_then(Value::as_str))
        .map(str::to_owned)
        .ok_or(Error::MissingField("text"))
}

fn parse_tweet_time(json: &Value) -> Result<OffsetDateTime, Error> {
    let time_str = json
        .get("created_at")
        .and_then(Value::as_str)
        .ok_or(Error::MissingField("created_at"))?;
    parse_timestamp(time_str)
}

/// Parse either the stream format (`Wed Oct 10 20:19:24 +0000 2018`) or RFC 3339.
pub fn parse_timestamp(time_str: &str) -> Result<OffsetDateTime, Error> {
    static STREAM_FORMAT_DESCRIPTION: &[FormatItem<'_>] = format_description!(
        "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
    );

    OffsetDateTime::parse(time_str, STREAM_FORMAT_DESCRIPTION)
        .or_else(|_| OffsetDateTime::parse(time_str, &Rfc3339))
        .map_err(|_| Error::InvalidTimestamp(time_str.to_owned()))
}

fn parse_tweet_place(json: &Value) -> Option<String> {
    json.get("place")
        .and_then(|p| p.get("country"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn parse_count(json: &Value, key: &str) -> u64 {
    json.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn parse_user(json: &Value) -> Result<User, Error> {
    let user = json.get("user").ok_or(Error::MissingField("user"))?;
    let screen_name = user
        .get("screen_name")
        .and_then(Value::as_str)
        .ok_or(Error::MissingField("user.screen_name"))?
        .to_owned();
    let location = user
        .get("location")
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(User {
        screen_name,
        location,
        followers_count: parse_count(user, "followers_count"),
        friends_count: parse_count(user, "friends_count"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    fn full_message() -> Value {
        json!({
            "id": 1050118621198921728u64,
            "id_str": "1050118621198921728",
            "text": "To make room for more expression, we will now count all emojis as equal",
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "place": { "country": "United States" },
            "favorite_count": 12,
            "retweet_count": 3,
            "reply_count": 1,
            "user": {
                "screen_name": "TwitterAPI",
                "location": "San Francisco, CA",
                "followers_count": 6129794,
                "friends_count": 12
            }
        })
    }

    #[test]
    fn extracts_every_field() {
        let tweet = parse_tweet(&full_message()).unwrap();
        assert_eq!(tweet.id, 1050118621198921728);
        assert_eq!(tweet.created_at, datetime!(2018-10-10 20:19:24 UTC));
        assert_eq!(tweet.place.as_deref(), Some("United States"));
        assert_eq!(tweet.favorite_count, 12);
        assert_eq!(tweet.retweet_count, 3);
        assert_eq!(tweet.reply_count, 1);
        assert_eq!(tweet.user.screen_name, "TwitterAPI");
        assert_eq!(tweet.user.location.as_deref(), Some("San Francisco, CA"));
        assert_eq!(tweet.user.followers_count, 6129794);
        assert_eq!(tweet.user.friends_count, 12);
    }

    #[test]
    fn missing_favorite_count_defaults_to_zero() {
        let mut message = full_message();
        message.as_object_mut().unwrap().remove("favorite_count");
        let tweet = parse_tweet(&message).unwrap();
        assert_eq!(tweet.favorite_count, 0);
    }

    #[test]
    fn null_place_and_missing_location_become_markers() {
        let mut message = full_message();
        message["place"] = Value::Null;
        message["user"].as_object_mut().unwrap().remove("location");
        let tweet = parse_tweet(&message).unwrap();
        assert_eq!(tweet.place, None);
        assert_eq!(tweet.place_or_null(), "NULL");
        assert_eq!(tweet.user.location_or_null(), "NULL");
    }

    #[test]
    fn missing_required_fields_fail() {
        for field in ["id", "text", "created_at"] {
            let mut message = full_message();
            let object = message.as_object_mut().unwrap();
            object.remove(field);
            if field == "id" {
                object.remove("id_str");
            }
            match parse_tweet(&message) {
                Err(Error::MissingField(f)) => assert_eq!(f, field),
                other => panic!("expected missing {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn prefers_extended_text() {
        let mut message = full_message();
        message["extended_tweet"] = json!({ "full_text": "the whole thing" });
        let tweet = parse_tweet(&message).unwrap();
        assert_eq!(tweet.text, "the whole thing");
    }

    #[test]
    fn accepts_rfc3339_timestamps() {
        let time = parse_timestamp("2019-07-21T08:30:00Z").unwrap();
        assert_eq!(time, datetime!(2019-07-21 08:30:00 UTC));
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(Error::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn extracted_tweet_serializes_with_rfc3339_time() {
        let tweet = parse_tweet(&full_message()).unwrap();
        let json = serde_json::to_value(&tweet).unwrap();
        assert_eq!(json["created_at"], "2018-10-10T20:19:24Z");
        assert_eq!(json["user"]["screen_name"], "TwitterAPI");
        assert_eq!(json["place"], "United States");
    }

    #[test]
    fn detects_retweets() {
        let mut message = full_message();
        assert!(!is_retweet(&message));
        message["retweeted_status"] = json!({ "id": 1 });
        assert!(is_retweet(&message));
    }

    #[test]
    fn non_status_messages_are_rejected() {
        assert!(parse_tweet_str(r#"{"limit":{"track":12,"timestamp_ms":"1"}}"#).is_err());
        assert!(matches!(parse_tweet_str("not json"), Err(Error::Json(_))));
    }
}
