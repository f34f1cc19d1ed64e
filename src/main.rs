mod app;
mod batch;
mod error;
mod model;
mod msg;

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::{App, Outcome};
use batch::ProcessRunner;
use model::config::{AppConfig, project_dirs};
use model::document::Document;
use model::options::Options;

fn main() -> Result<()> {
    let options = Options::parse();
    let config = AppConfig::load()?;

    // Initialize logging to file (never stdout, which carries the document)
    let log_dir = project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("pathops"));
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "pathops.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    tracing::info!(
        document = %options.document.display(),
        verb = %options.ink_verb,
        selected = options.ids.len(),
        dry_run = options.dry_run,
        "pathops starting"
    );

    let input = fs::read(&options.document)
        .with_context(|| format!("reading {}", options.document.display()))?;
    let doc = Document::from_bytes(&input)
        .with_context(|| format!("parsing {}", options.document.display()))?;
    tracing::debug!(ids = doc.id_count(), "document parsed");

    let mut app = App::new(config, options, ProcessRunner);
    let outcome = app.run(doc);

    // Messages reach the user through the host's stderr dialog
    let mut stderr = io::stderr().lock();
    for msg in &app.notifications {
        if msg.is_abort() {
            tracing::warn!("{msg}");
        }
        writeln!(stderr, "{msg}")?;
    }

    let outcome = outcome.inspect_err(|e| tracing::error!("run failed: {e:#}"))?;

    let mut stdout = io::stdout().lock();
    match outcome {
        Outcome::Unchanged => stdout.write_all(&input)?,
        Outcome::Modified(doc) => stdout.write_all(&doc.to_bytes()?)?,
    }
    stdout.flush()?;

    tracing::info!("pathops finished");
    Ok(())
}
