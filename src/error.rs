#[derive(Debug)]
pub enum Error {
    MissingField(&'static str),
    InvalidTimestamp(String),
    MissingColumn(String),
    Config(String),
    NoFilters,
    EmptyFilterFile(String),
    RateLimited,
    Status(u16),
    Network(String),
    Database(String),
    Json(String),
    Csv(String),
    Image(String),
    Font(String),
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(s) => write!(f, "message has no usable `{}` field", s),
            Self::InvalidTimestamp(s) => write!(f, "unable to parse timestamp: {}", s),
            Self::MissingColumn(s) => write!(f, "input has no `{}` column", s),
            Self::Config(s) => write!(f, "invalid configuration: {}", s),
            Self::NoFilters => write!(f, "no filter files selected"),
            Self::EmptyFilterFile(s) => write!(f, "filter file {} is empty", s),
            Self::RateLimited => write!(f, "request rate limit reached"),
            Self::Status(code) => write!(f, "stream returned status {}", code),
            Self::Network(s) => write!(f, "unable to send request: {}", s),
            Self::Database(s) => write!(f, "database error: {}", s),
            Self::Json(s) => write!(f, "unable to parse json: {}", s),
            Self::Csv(s) => write!(f, "csv error: {}", s),
            Self::Image(s) => write!(f, "unable to write image: {}", s),
            Self::Font(s) => write!(f, "unable to load font: {}", s),
            Self::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}
