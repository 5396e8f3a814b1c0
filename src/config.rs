use std::io::{BufRead, Write};
use std::path::Path;

use configparser::ini::Ini;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

pub const DEFAULT_CONFIG_PATH: &str = "./twitter_configuration.ini";

const MYSQL_SECTION: &str = "MYSQL";
const TWITTER_SECTION: &str = "TWITTER";

/// Contents of the two-section configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mysql: MySqlSettings,
    pub twitter: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub table: String,
}

/// OAuth 1.0a user-context keys for the streaming API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut ini = reader();
        ini.load(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_ini(&ini)
    }

    pub fn parse(contents: &str) -> Result<Self, Error> {
        let mut ini = reader();
        ini.read(contents.to_owned()).map_err(Error::Config)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, Error> {
        let optional = |section: &str, key: &str, default: &str| {
            ini.get(section, key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };
        let required = |section: &str, key: &str| {
            ini.get(section, key)
                .ok_or_else(|| Error::Config(format!("missing [{}] {}", section, key)))
        };

        let mysql = MySqlSettings {
            host: optional(MYSQL_SECTION, "HOST", "localhost"),
            username: optional(MYSQL_SECTION, "USERNAME", "root"),
            password: required(MYSQL_SECTION, "PASSWORD")?,
            database: required(MYSQL_SECTION, "DATABASE")?,
            table: validate_table_name(required(MYSQL_SECTION, "TABLE")?)?,
        };
        let twitter = Credentials {
            consumer_key: required(TWITTER_SECTION, "CONSUMER_KEY")?,
            consumer_secret: required(TWITTER_SECTION, "CONSUMER_SECRET")?,
            access_token: required(TWITTER_SECTION, "ACCESS_TOKEN")?,
            access_token_secret: required(TWITTER_SECTION, "ACCESS_TOKEN_SECRET")?,
        };

        Ok(Self { mysql, twitter })
    }

    pub fn to_ini_string(&self) -> String {
        let mut ini = Ini::new_cs();
        let mut set = |section: &str, key: &str, value: &str| {
            ini.set(section, key, Some(value.to_owned()));
        };
        set(MYSQL_SECTION, "HOST", &self.mysql.host);
        set(MYSQL_SECTION, "USERNAME", &self.mysql.username);
        set(MYSQL_SECTION, "PASSWORD", &self.mysql.password);
        set(MYSQL_SECTION, "DATABASE", &self.mysql.database);
        set(MYSQL_SECTION, "TABLE", &self.mysql.table);
        set(TWITTER_SECTION, "CONSUMER_KEY", &self.twitter.consumer_key);
        set(TWITTER_SECTION, "CONSUMER_SECRET", &self.twitter.consumer_secret);
        set(TWITTER_SECTION, "ACCESS_TOKEN", &self.twitter.access_token);
        set(
            TWITTER_SECTION,
            "ACCESS_TOKEN_SECRET",
            &self.twitter.access_token_secret,
        );
        ini.writes()
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(path, self.to_ini_string())?;
        Ok(())
    }
}

/// Case-insensitive reader that keeps `#` and `;` inside values, so secrets
/// containing them survive a write and load.
fn reader() -> Ini {
    let mut defaults = Ini::new().defaults();
    defaults.enable_inline_comments = false;
    Ini::new_from_defaults(defaults)
}

/// The table name is spliced into SQL text, so only plain identifiers pass.
pub fn validate_table_name(table: String) -> Result<String, Error> {
    static IDENTIFIER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

    if IDENTIFIER_RE.is_match(&table) {
        Ok(table)
    } else {
        Err(Error::Config(format!("invalid table name {:?}", table)))
    }
}

/// Interactively ask for every setting, one line per prompt.
pub fn prompt_config<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Config, Error> {
    let mut ask = |prompt: &str| -> Result<String, Error> {
        write!(output, "{}", prompt)?;
        output.flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(line.trim().to_owned())
    };

    let mysql = MySqlSettings {
        host: ask("Hostname (i.e. localhost): ")?,
        username: ask("MySQL Username: ")?,
        password: ask("MySQL User Password: ")?,
        database: ask("MySQL Database Name (i.e. twitter_db): ")?,
        table: validate_table_name(ask("MySQL Table Name (i.e. TWEETS_BY_KEYWORD): ")?)?,
    };
    let twitter = Credentials {
        consumer_key: ask("Twitter CONSUMER_KEY: ")?,
        consumer_secret: ask("Twitter CONSUMER_SECRET: ")?,
        access_token: ask("Twitter ACCESS_TOKEN: ")?,
        access_token_secret: ask("Twitter ACCESS_TOKEN_SECRET: ")?,
    };

    Ok(Config { mysql, twitter })
}

pub fn confirm_overwrite<R: BufRead, W: Write>(
    path: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<bool, Error> {
    if !path.is_file() {
        return Ok(true);
    }
    write!(
        output,
        "{} already exists. Do you want to override? (y/n): ",
        path.display()
    )?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
