use std::path::Path;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use crate::archive::read_archive;
use crate::clean::Normalizer;
use crate::error::Error;
use crate::parse::parse_tweet;
use crate::sentiment::{PolarityScorer, Scale};

/// Raw text loaded from the table, a bulk file or an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub created_at: Option<String>,
    pub text: String,
}

impl TextRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            created_at: None,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledText {
    pub created_at: Option<String>,
    pub text: String,
    pub clean_text: String,
    pub text_len: usize,
    pub sentiment: i8,
}

pub fn label_records(
    records: Vec<TextRecord>,
    normalizer: &Normalizer,
    scorer: &dyn PolarityScorer,
    scale: Scale,
) -> Vec<LabeledText> {
    records
        .into_iter()
        .map(|record| {
            let clean_text = normalizer.normalize(&record.text);
            let sentiment = scale.label(scorer.polarity(&clean_text));
            LabeledText {
                created_at: record.created_at,
                text_len: clean_text.len(),
                text: record.text,
                clean_text,
                sentiment,
            }
        })
        .collect()
}

/// Read one text column from a delimited file with a header row.
pub fn read_delimited(path: &Path, delimiter: u8, column: &str) -> Result<Vec<TextRecord>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        // review phrases carry stray quotes; tab files are not quoted
        .quoting(delimiter != b'\t')
        .from_path(path)?;

    let index = reader
        .headers()?
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| Error::MissingColumn(column.to_owned()))?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        match row.get(index) {
            Some(text) => records.push(TextRecord::new(text)),
            None => warn!(line = ?row.position().map(|p| p.line()), "row has no {} field", column),
        }
    }
    debug!(path = %path.display(), count = records.len(), "loaded bulk file");
    Ok(records)
}

/// Extract tweet texts from archive files, skipping messages that are not tweets.
pub fn read_archives(paths: &[impl AsRef<Path>]) -> Result<Vec<TextRecord>, Error> {
    let mut records = Vec::new();
    for path in paths {
        for message in read_archive(path.as_ref())? {
            match parse_tweet(&message) {
                Ok(tweet) => records.push(TextRecord {
                    created_at: tweet.created_at.format(&Rfc3339).ok(),
                    text: tweet.text,
                }),
                Err(e) => debug!("skipping archived message: {}", e),
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::archive::Archive;
    use crate::sentiment::VaderScorer;

    #[test]
    fn love_and_hate_get_opposite_labels() {
        let records = vec![
            TextRecord::new("I love this movie"),
            TextRecord::new("I hate this movie"),
        ];
        let labeled = label_records(records, &Normalizer::plain(), &VaderScorer, Scale::Three);
        let labels: Vec<i8> = labeled.iter().map(|l| l.sentiment).collect();
        assert_eq!(labels, vec![1, -1]);
        assert_eq!(labeled[0].clean_text, "love movie");
        assert_eq!(labeled[0].text_len, "love movie".len());
    }

    #[test]
    fn labels_use_the_cleaned_text() {
        let scorer = |text: &str| if text.contains("good") { 0.5 } else { 0.0 };
        let records = vec![TextRecord::new("Good!!!"), TextRecord::new("the and of")];
        let labeled = label_records(records, &Normalizer::plain(), &scorer, Scale::Five);
        assert_eq!(labeled[0].sentiment, 4);
        assert_eq!(labeled[1].clean_text, "");
        assert_eq!(labeled[1].sentiment, 2);
    }

    #[test]
    fn reads_bulk_review_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.tsv");
        std::fs::write(
            &path,
            "PhraseId\tSentenceId\tPhrase\tSentiment\n\
             1\t1\tI love this movie\t4\n\
             2\t1\tI hate this movie\t0\n",
        )
        .unwrap();

        let records = read_delimited(&path, b'\t', "Phrase").unwrap();
        assert_eq!(
            records,
            vec![TextRecord::new("I love this movie"), TextRecord::new("I hate this movie")]
        );

        let labeled = label_records(records, &Normalizer::plain(), &VaderScorer, Scale::Three);
        assert_eq!(labeled.iter().map(|l| l.sentiment).collect::<Vec<_>>(), vec![1, -1]);

        assert!(matches!(
            read_delimited(&path, b'\t', "Review"),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn reads_tweets_from_archives() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::new(dir.path()).unwrap();
        let tweet = json!({
            "id": 7,
            "text": "Great day",
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "user": { "screen_name": "someone" }
        });
        let path = archive.append_at(&tweet, 1539202764).unwrap();
        archive.append_at(&json!({"delete": {"status": {"id": 1}}}), 1539202765).unwrap();

        let records = read_archives(&[path]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "Great day");
        assert_eq!(records[0].created_at.as_deref(), Some("2018-10-10T20:19:24Z"));
    }
}
