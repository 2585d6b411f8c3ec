//! `journal`: command-line access to a journal database.
//!
//! # Usage
//!
//! ```
//! journal import entries.json
//! journal list --owner alice --from 2025-01-01 --to 2025-01-31
//! journal followups 3f2a… "What changed?" "Who was there?"
//! ```
//!
//! Settings come from `journal.toml` (or `--config`) and `JOURNAL_*`
//! environment variables. Results are printed to stdout as JSON.

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use journal_core::{
  entry::{Entry, EntryPatch, NewEntry},
  stats::Statistics,
  store::EntryStore,
  validate,
};
use journal_store_sqlite::SqliteStore;
use serde::Serialize;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Journal entry store")]
struct Cli {
  /// Path to the TOML settings file.
  #[arg(short, long, default_value = "journal.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create or replace every entry in a JSON array, all or nothing.
  Import { file: PathBuf },

  /// List entries, newest first.
  List {
    #[arg(long)]
    owner: Option<String>,
    /// First day of the range, `YYYY-MM-DD`.
    #[arg(long, requires = "to")]
    from:  Option<String>,
    /// Last day of the range, inclusive.
    #[arg(long, requires = "from")]
    to:    Option<String>,
  },

  /// Print one entry by its id.
  Show { id: String },

  Delete { id: String },

  /// Move an entry to another date.
  SetDate { id: String, date: String },

  /// Replace an entry's follow-up questions.
  Followups {
    id:        String,
    questions: Vec<String>,
  },

  /// Summarise one owner's entries.
  Stats {
    #[arg(long)]
    owner: Option<String>,
  },

  /// Write every entry to a file as pretty-printed JSON.
  Export { file: PathBuf },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  if let Some(parent) = settings.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let path = &settings.store_path;
  let store = SqliteStore::open_with(path, settings.store_options())
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;

  run(cli.command, &store, &settings).await
}

async fn run(
  command: Command,
  store: &SqliteStore,
  settings: &Settings,
) -> anyhow::Result<()> {
  match command {
    Command::Import { file } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
      let entries: Vec<NewEntry> =
        serde_json::from_str(&raw).context("parsing entries")?;
      let keys = store.create_or_replace_batch(entries).await?;
      print_json(&keys)
    }

    Command::List { owner, from, to } => {
      let entries = list(store, owner.as_deref(), from.zip(to)).await?;
      print_json(&entries)
    }

    Command::Show { id } => {
      let entry = store
        .get(&id)
        .await?
        .with_context(|| format!("no entry with id {id}"))?;
      print_json(&entry)
    }

    Command::Delete { id } => {
      anyhow::ensure!(store.delete(&id).await?, "no entry with id {id}");
      print_json(&serde_json::json!({ "deleted": id }))
    }

    Command::SetDate { id, date } => {
      let date = validate::parse_date(&date)?;
      let patch = EntryPatch { date: Some(date), ..EntryPatch::default() };
      anyhow::ensure!(store.update(&id, patch).await?, "no entry with id {id}");
      print_json(&serde_json::json!({ "id": id, "date": date }))
    }

    Command::Followups { id, questions } => {
      anyhow::ensure!(
        store.update_followups(&id, questions.clone()).await?,
        "no entry with id {id}"
      );
      print_json(&serde_json::json!({ "id": id, "followups": questions }))
    }

    Command::Stats { owner } => {
      let owner = owner.unwrap_or_else(|| settings.default_owner.clone());
      let entries = store.get_by_owner(&owner).await?;
      print_json(&Statistics::from_entries(&entries))
    }

    Command::Export { file } => {
      let entries = store.get_all().await?;
      let json = serde_json::to_string_pretty(&entries)?;
      std::fs::write(&file, json)
        .with_context(|| format!("writing {}", file.display()))?;
      tracing::info!(count = entries.len(), path = %file.display(), "exported");
      Ok(())
    }
  }
}

async fn list(
  store: &SqliteStore,
  owner: Option<&str>,
  range: Option<(String, String)>,
) -> anyhow::Result<Vec<Entry>> {
  let Some((from, to)) = range else {
    return Ok(match owner {
      Some(owner) => store.get_by_owner(owner).await?,
      None => store.get_all().await?,
    });
  };

  let from = validate::parse_date(&from)?;
  let to = validate::parse_date(&to)?;
  let mut entries = store.get_by_date_range(from, to).await?;
  if let Some(owner) = owner {
    entries.retain(|e| e.owner_id == owner);
  }
  Ok(entries)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
