pub mod analysis;
pub mod archive;
pub mod clean;
pub mod config;
mod error;
pub mod lemma;
pub mod oauth;
pub mod parse;
pub mod report;
pub mod sentiment;
pub mod sink;
pub mod store;
pub mod stream;
mod tweet;
pub mod wordcloud;

pub use analysis::{label_records, LabeledText, TextRecord};
pub use archive::Archive;
pub use clean::Normalizer;
pub use config::{Config, Credentials, MySqlSettings};
pub use error::Error;
pub use parse::{parse_tweet, parse_tweet_str};
pub use sentiment::{PolarityScorer, Scale, Summary, VaderScorer};
pub use sink::Sink;
pub use stream::{Filters, TweetStream};
pub use tweet::{Tweet, User};
pub use wordcloud::WordCloud;
