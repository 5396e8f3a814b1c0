use std::path::Path;

use futures_util::{Stream, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::config::Credentials;
use crate::error::Error;
use crate::oauth;

pub const FILTER_STREAM_URL: &str = "https://stream.twitter.com/1.1/statuses/filter.json";

/// Keywords, user ids, bounding boxes and languages sent to the filter endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub track: Vec<String>,
    pub follow: Vec<String>,
    pub locations: Vec<String>,
    pub languages: Vec<String>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            track: Vec::new(),
            follow: Vec::new(),
            locations: Vec::new(),
            languages: vec!["en".to_owned()],
        }
    }
}

impl Filters {
    /// Load filters from whitespace separated files. At least one file is required.
    pub fn from_files(
        track: Option<&Path>,
        follow: Option<&Path>,
        locations: Option<&Path>,
    ) -> Result<Self, Error> {
        if track.is_none() && follow.is_none() && locations.is_none() {
            return Err(Error::NoFilters);
        }
        let load = |path: Option<&Path>| path.map(read_filter_file).unwrap_or(Ok(Vec::new()));

        Ok(Self {
            track: load(track)?,
            follow: load(follow)?,
            locations: load(locations)?,
            ..Default::default()
        })
    }

    pub fn form_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        for (key, values) in [
            ("track", &self.track),
            ("follow", &self.follow),
            ("locations", &self.locations),
            ("language", &self.languages),
        ] {
            if !values.is_empty() {
                params.push((key, values.join(",")));
            }
        }
        params
    }
}

pub fn read_filter_file(path: &Path) -> Result<Vec<String>, Error> {
    let contents = std::fs::read_to_string(path)?;
    let entries: Vec<String> = contents.split_whitespace().map(str::to_owned).collect();
    if entries.is_empty() {
        return Err(Error::EmptyFilterFile(path.display().to_string()));
    }
    Ok(entries)
}

#[derive(TypedBuilder)]
pub struct TweetStream<'a> {
    client: &'a Client,

    credentials: &'a Credentials,

    filters: Filters,

    #[builder(setter(into), default = FILTER_STREAM_URL.to_owned())]
    url: String,

    #[builder(default)]
    limit: Option<usize>,
}

impl<'a> TweetStream<'a> {
    /// Open the filtered stream and yield raw JSON messages, one per line.
    ///
    /// Rate limiting and other non-success statuses end the session before
    /// any message is produced.
    pub async fn connect(&self) -> Result<impl Stream<Item = Result<String, Error>>, Error> {
        let params = self.filters.form_params();
        let header = oauth::authorization_header(self.credentials, "POST", &self.url, &params);

        debug!(url = %self.url, ?params, "opening stream");
        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, header)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 420 || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }
        info!("connected to the streaming API");

        Ok(frame_messages(Box::pin(response.bytes_stream()), self.limit))
    }
}

struct FrameState<S> {
    chunks: S,
    buffer: Vec<u8>,
    count: usize,
    limit: Option<usize>,
    done: bool,
}

/// Split a chunked body into newline delimited messages.
///
/// Blank keep-alive lines are dropped. A chunk error is yielded once and ends
/// the stream, as does reaching `limit` messages.
pub fn frame_messages<S, B, E>(
    chunks: S,
    limit: Option<usize>,
) -> impl Stream<Item = Result<String, Error>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Error>,
{
    let state = FrameState {
        chunks,
        buffer: Vec::new(),
        count: 0,
        limit,
        done: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        if let Some(limit) = state.limit {
            if state.count >= limit {
                return None;
            }
        }

        loop {
            if let Some(line) = take_line(&mut state.buffer) {
                if line.trim().is_empty() {
                    continue;
                }
                state.count += 1;
                return Some((Ok(line), state));
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    state.done = true;
                    let error: Error = e.into();
                    return Some((Err(error), state));
                }
                None => {
                    state.done = true;
                    let rest = std::mem::take(&mut state.buffer);
                    let rest = String::from_utf8_lossy(&rest).trim().to_owned();
                    if rest.is_empty() {
                        return None;
                    }
                    state.count += 1;
                    return Some((Ok(rest), state));
                }
            }
        }
    })
}

fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    let pos = buffer.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=pos).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(String::from_utf8_lossy(&line).into_owned())
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, Error>> + Unpin {
        let parts: Vec<Result<Vec<u8>, Error>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(parts)
    }

    #[tokio::test]
    async fn frames_messages_across_chunks() {
        let messages: Vec<String> = frame_messages(
            chunks(&["{\"id\":1}\r\n\r\n{\"id\"", ":2}\r\n", "\r\n{\"id\":3}"]),
            None,
        )
        .map(Result::unwrap)
        .collect()
        .await;
        assert_eq!(messages, vec!["{\"id\":1}", "{\"id\":2}", "{\"id\":3}"]);
    }

    #[tokio::test]
    async fn stops_at_limit() {
        let messages: Vec<_> =
            frame_messages(chunks(&["a\r\nb\r\nc\r\nd\r\n"]), Some(2)).collect().await;
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let parts = vec![
            Ok(b"first\r\n".to_vec()),
            Err(Error::Network("connection reset".to_owned())),
            Ok(b"never\r\n".to_vec()),
        ];
        let results: Vec<_> = frame_messages(stream::iter(parts), None).collect().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_deref().unwrap(), "first");
        assert!(matches!(results[1], Err(Error::Network(_))));
    }

    #[test]
    fn form_params_skip_empty_filters() {
        let filters = Filters {
            track: vec!["batman".to_owned(), "joker".to_owned()],
            locations: vec!["-122.75,36.8,-121.75,37.8".to_owned()],
            ..Default::default()
        };
        assert_eq!(
            filters.form_params(),
            vec![
                ("track", "batman,joker".to_owned()),
                ("locations", "-122.75,36.8,-121.75,37.8".to_owned()),
                ("language", "en".to_owned()),
            ]
        );
    }

    #[test]
    fn filter_files() {
        let dir = tempfile::tempdir().unwrap();
        let keywords = dir.path().join("keywords.txt");
        let empty = dir.path().join("empty.txt");
        std::fs::write(&keywords, "batman\njoker  gotham\n").unwrap();
        std::fs::write(&empty, "  \n").unwrap();

        let filters = Filters::from_files(Some(&keywords), None, None).unwrap();
        assert_eq!(filters.track, vec!["batman", "joker", "gotham"]);
        assert!(filters.follow.is_empty());

        assert!(matches!(
            Filters::from_files(None, Some(&empty), None),
            Err(Error::EmptyFilterFile(_))
        ));
        assert!(matches!(
            Filters::from_files(None, None, None),
            Err(Error::NoFilters)
        ));
    }
}
