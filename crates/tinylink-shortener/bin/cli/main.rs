mod cli;

use crate::cli::{Command, GeneratorArg, LogFormatArg, CLI};
use anyhow::Context;
use clap::Parser;
use jiff::{SignedDuration, Timestamp};
use std::io::Write;
use std::process::ExitCode;
use tinylink_core::SystemClock;
use tinylink_generator::{Generator, RandomGenerator, SeqGenerator};
use tinylink_shortener::{
    Registry, RegistrySettings, Resolution, ShortenRequest, Shortener, ShortenerError,
};
use tinylink_storage::JsonFileStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_OK: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_NOT_FOUND: u8 = 1;
const EXIT_EXPIRED: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        store_path = %config.store_path.display(),
        generator = %config.generator,
        max_attempts = config.max_attempts,
        "opening short link registry"
    );

    let generator: Box<dyn Generator> = match config.generator {
        GeneratorArg::Random => Box::new(RandomGenerator::new()),
        GeneratorArg::Seq => Box::new(SeqGenerator::new()),
    };
    let settings = RegistrySettings::builder()
        .max_attempts(config.max_attempts)
        .build();

    let store = JsonFileStore::new(&config.store_path);
    // held until the command, including any flush, has finished
    let _lock = store
        .lock()
        .await
        .with_context(|| format!("failed to lock {}", store.lock_path().display()))?;

    let registry = Registry::open(store, generator, SystemClock, settings)
        .await
        .with_context(|| format!("failed to load links from {}", config.store_path.display()))?;

    let now = registry.now();
    let status = run(
        &registry,
        config.command,
        &config.base_url,
        now,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )
    .await?;
    Ok(ExitCode::from(status))
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

/// Executes `command`, writing results to `out` and problems to `err`, and
/// returns the process exit status.
async fn run(
    shortener: &dyn Shortener,
    command: Command,
    base_url: &str,
    now: Timestamp,
    out: &mut impl Write,
    err: &mut impl Write,
) -> anyhow::Result<u8> {
    match command {
        Command::Create {
            url,
            code,
            validity,
        } => {
            let request = ShortenRequest {
                original_url: url,
                custom_code: code,
                validity_minutes: validity,
            };

            let created = match shortener.create(request).await {
                Ok(created) => created,
                Err(ShortenerError::Invalid(errors)) => {
                    writeln!(err, "cannot create short link:")?;
                    for error in &errors {
                        writeln!(err, "  - {error}")?;
                    }
                    return Ok(EXIT_FAILURE);
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = &created.flush {
                warn!(error = %e, "short link was created but not saved");
                writeln!(err, "warning: link was created but could not be saved: {e}")?;
            }

            let record = &created.record;
            writeln!(out, "{}", record.short_code().to_url(base_url))?;
            writeln!(out, "  -> {}", record.original_url())?;
            writeln!(out, "  expires at {}", record.expires_at())?;
            Ok(EXIT_OK)
        }
        Command::Resolve { code } => match shortener.resolve(&code) {
            Resolution::Active(record) => {
                writeln!(out, "{}", record.original_url())?;
                Ok(EXIT_OK)
            }
            Resolution::Expired(record) => {
                writeln!(
                    err,
                    "short code '{code}' expired at {} (was {})",
                    record.expires_at(),
                    record.original_url()
                )?;
                Ok(EXIT_EXPIRED)
            }
            Resolution::NotFound => {
                writeln!(err, "short code '{code}' not found")?;
                Ok(EXIT_NOT_FOUND)
            }
        },
        Command::Exists { code } => {
            writeln!(out, "{}", shortener.exists(&code))?;
            Ok(EXIT_OK)
        }
        Command::Stats => {
            let summary = shortener.summarize();
            writeln!(out, "total:   {}", summary.total)?;
            writeln!(out, "active:  {}", summary.active)?;
            writeln!(out, "expired: {}", summary.expired)?;
            Ok(EXIT_OK)
        }
        Command::List => {
            for record in shortener.records() {
                let status = match record.remaining(now) {
                    Some(left) => format!("{} left", humanize(left)),
                    None => "expired".to_string(),
                };
                writeln!(
                    out,
                    "{}\t{}\t{}\tcreated {} ago",
                    record.short_code().to_url(base_url),
                    record.original_url(),
                    status,
                    humanize(record.age(now)),
                )?;
            }
            Ok(EXIT_OK)
        }
    }
}

/// Coarse rendering in the largest whole unit: minutes, hours or days.
fn humanize(duration: SignedDuration) -> String {
    let minutes = duration.as_mins();
    if minutes < 1 {
        "<1m".to_string()
    } else if minutes < 60 {
        format!("{minutes}m")
    } else if minutes < 1_440 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}d", minutes / 1_440)
    }
}
