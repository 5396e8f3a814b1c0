use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Client;
use sqlx::Connection;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use tweet_sentiment::analysis::{read_archives, read_delimited};
use tweet_sentiment::config::{confirm_overwrite, prompt_config, DEFAULT_CONFIG_PATH};
use tweet_sentiment::report::write_csv;
use tweet_sentiment::wordcloud::load_font;
use tweet_sentiment::{
    label_records, store, Archive, Config, Error, Filters, Normalizer, Scale, Sink, Summary,
    TweetStream, VaderScorer, WordCloud,
};

#[derive(Parser)]
#[command(about = "Stream tweets into MySQL or gzip archives and label their sentiment")]
struct Args {
    /// Configuration file with [MYSQL] and [TWITTER] sections
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level: debug, info, warn or error
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download tweets matching keyword, user id or location filters
    Download(DownloadArgs),
    /// Clean stored texts and label their sentiment
    Analyze(AnalyzeArgs),
    /// Write the configuration file from interactive prompts
    Configure,
}

#[derive(clap::Args)]
struct DownloadArgs {
    /// File containing keywords, i.e. batman joker
    #[arg(short, long)]
    track: Option<PathBuf>,

    /// File containing user ids, i.e. 25073877
    #[arg(short, long)]
    follow: Option<PathBuf>,

    /// File containing bounding boxes, i.e. -122.75,36.8,-121.75,37.8
    #[arg(short, long)]
    locations: Option<PathBuf>,

    /// Language filter, may be repeated
    #[arg(long = "language", default_value = "en")]
    languages: Vec<String>,

    /// Number of messages to take before stopping
    #[arg(short = 'n', long, default_value_t = 10_000_000)]
    limit: usize,

    /// Skip retweets
    #[arg(long)]
    skip_retweets: bool,

    #[command(subcommand)]
    output: DownloadOutput,
}

#[derive(Subcommand)]
enum DownloadOutput {
    /// Insert extracted tweets into the configured table
    Mysql {
        /// Create the table first if it does not exist
        #[arg(long)]
        create_table: bool,
    },
    /// Append raw messages to gzip JSON-lines files
    Archive {
        #[arg(long, default_value = "json")]
        dir: PathBuf,
    },
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// Name of the word cloud image, saved under ./img
    #[arg(long = "wc")]
    wc_filename: Option<String>,

    /// Name of the csv file, saved under ./csv
    #[arg(long = "csv")]
    csv_filename: Option<String>,

    /// Print the percentage of texts per sentiment label
    #[arg(long)]
    sent: bool,

    #[arg(long, value_enum, default_value_t = Scale::Three)]
    scale: Scale,

    /// TTF font used for the word cloud
    #[arg(long)]
    font: Option<PathBuf>,

    #[command(subcommand)]
    source: Source,
}

#[derive(Subcommand)]
enum Source {
    /// Texts stored in the configured table
    Mysql,
    /// Delimited file with a header row, such as a review dump
    File {
        path: PathBuf,

        #[arg(long, default_value = "Phrase")]
        column: String,

        #[arg(long, default_value = "\t")]
        delimiter: char,
    },
    /// Gzip JSON-lines files written by `download archive`
    Archive {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("unable to set up logging: {}", e);
    }

    let result = match args.command {
        Command::Download(download_args) => download(&args.config, download_args).await,
        Command::Analyze(analyze_args) => analyze(&args.config, analyze_args).await,
        Command::Configure => configure(&args.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::NoFilters) => {
            eprintln!("No filter files selected. Please add them");
            ExitCode::from(2)
        }
        Err(Error::RateLimited) => {
            eprintln!("Request rate limit reached");
            ExitCode::from(3)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn download(config_path: &Path, args: DownloadArgs) -> Result<(), Error> {
    let mut filters = Filters::from_files(
        args.track.as_deref(),
        args.follow.as_deref(),
        args.locations.as_deref(),
    )?;
    filters.languages = args.languages;
    let config = Config::load(config_path)?;

    println!("Active tracking filters are:");
    if let Some(path) = &args.track {
        println!("\tKeywords from {}", path.display());
    }
    if let Some(path) = &args.follow {
        println!("\tUserids from {}", path.display());
    }
    if let Some(path) = &args.locations {
        println!("\tLocations from {}", path.display());
    }

    let mut sink = match args.output {
        DownloadOutput::Mysql { create_table } => {
            let mut conn = store::connect(&config.mysql).await?;
            if create_table {
                store::create_table(&mut conn, &config.mysql.table).await?;
            }
            Sink::MySql {
                conn,
                table: config.mysql.table.clone(),
            }
        }
        DownloadOutput::Archive { dir } => Sink::Archive(Archive::new(dir)?),
    };

    // Only bound the connect phase; the response body stays open indefinitely
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let tweet_stream = TweetStream::builder()
        .client(&client)
        .credentials(&config.twitter)
        .filters(filters)
        .limit(Some(args.limit))
        .build();

    let messages = match tweet_stream.connect().await {
        Ok(messages) => messages,
        Err(e) => {
            sink.close().await;
            return Err(e);
        }
    };
    let (stored, result) = sink.drain(messages, args.skip_retweets).await;

    sink.close().await;
    info!(stored, "stream finished");
    result
}

async fn analyze(config_path: &Path, args: AnalyzeArgs) -> Result<(), Error> {
    let (records, normalizer, subject) = match args.source {
        Source::Mysql => {
            let config = Config::load(config_path)?;
            let mut conn = store::connect(&config.mysql).await?;
            info!(
                "connected to {} as {}",
                config.mysql.database, config.mysql.username
            );
            let records = store::fetch_texts(&mut conn, &config.mysql.table).await;
            if let Err(e) = conn.close().await {
                warn!("unable to close mysql connection: {}", e);
            }
            (records?, Normalizer::social(), "tweets")
        }
        Source::File {
            path,
            column,
            delimiter,
        } => {
            let delimiter = u8::try_from(delimiter)
                .map_err(|_| Error::Config(format!("delimiter {:?} is not one byte", delimiter)))?;
            (
                read_delimited(&path, delimiter, &column)?,
                Normalizer::plain(),
                "reviews",
            )
        }
        Source::Archive { paths } => (read_archives(&paths)?, Normalizer::social(), "tweets"),
    };
    info!(count = records.len(), "loaded texts");

    let labeled = label_records(records, &normalizer, &VaderScorer, args.scale);

    if args.sent {
        let summary = Summary::from_labels(args.scale, subject, labeled.iter().map(|l| l.sentiment));
        println!("{}", summary);
    }

    if let Some(name) = args.wc_filename {
        let font = load_font(args.font.as_deref())?;
        let path = output_path("img", &name, "_word_cloud.png");
        let path = WordCloud::default().save(
            labeled.iter().map(|l| l.clean_text.as_str()),
            &font,
            &path,
        )?;
        println!("{} saved successfully", path.display());
    }

    if let Some(name) = args.csv_filename {
        let file_name = output_path("", &name, &format!("_{}.csv", subject));
        let path = write_csv(Path::new("csv"), &file_name.to_string_lossy(), &labeled)?;
        println!("{} saved successfully", path.display());
    }

    Ok(())
}

/// `dir/name` when `name` has an extension, `dir/<name><suffix>` otherwise.
fn output_path(dir: &str, name: &str, suffix: &str) -> PathBuf {
    let file_name = if Path::new(name).extension().is_some() {
        name.to_owned()
    } else {
        format!("{}{}", name, suffix)
    };
    Path::new(dir).join(file_name)
}

fn configure(path: &Path) -> Result<(), Error> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();

    if !confirm_overwrite(path, &mut input, &mut output)? {
        println!("No configuration file generated");
        return Ok(());
    }
    let config = prompt_config(&mut input, &mut output)?;
    config.write(path)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}
