use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tinylink_core::shortener::DEFAULT_VALIDITY_MINUTES;
use tinylink_shortener::registry::DEFAULT_MAX_ATTEMPTS;

pub const STORE_PATH_ENV: &str = "TINYLINK_STORE_PATH";
pub const BASE_URL_ENV: &str = "TINYLINK_BASE_URL";
pub const GENERATOR_ENV: &str = "TINYLINK_GENERATOR";
pub const MAX_ATTEMPTS_ENV: &str = "TINYLINK_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "TINYLINK_LOG_FORMAT";

pub const DEFAULT_STORE_PATH: &str = "tinylink.json";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    #[value(name = "random")]
    Random,
    #[value(name = "seq")]
    Seq,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Seq => write!(f, "seq"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "tinylink", about = "Register and resolve expiring short links")]
pub struct CLI {
    /// JSON file holding every registered link.
    #[arg(long, global = true, env = STORE_PATH_ENV, default_value = DEFAULT_STORE_PATH)]
    pub store_path: PathBuf,

    /// Prefix used when printing short URLs.
    #[arg(long, global = true, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        global = true,
        env = GENERATOR_ENV,
        value_enum,
        default_value_t = GeneratorArg::Random
    )]
    pub generator: GeneratorArg,

    /// Generated candidates to try before giving up.
    #[arg(
        long,
        global = true,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    #[arg(
        long,
        global = true,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new short link.
    Create {
        /// Destination URL.
        url: String,
        /// Custom short code (3-20 letters or digits).
        #[arg(long)]
        code: Option<String>,
        /// Minutes the link stays active (1-10080).
        #[arg(long, default_value_t = DEFAULT_VALIDITY_MINUTES, allow_negative_numbers = true)]
        validity: i64,
    },
    /// Look up where a short code points.
    Resolve { code: String },
    /// Check whether a short code has ever been registered.
    Exists { code: String },
    /// Count total, active and expired links.
    Stats,
    /// List every link, newest first.
    List,
}
