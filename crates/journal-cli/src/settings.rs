//! Layered settings: an optional TOML file under `JOURNAL_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use journal_core::entry::DEFAULT_OWNER;
use journal_store_sqlite::StoreOptions;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite file holding the journal. A leading `~/` is expanded.
  pub store_path:    PathBuf,
  /// Owner used when a command does not name one.
  pub default_owner: String,
  /// Create the `users` table alongside the journal tables.
  pub users_table:   bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:    PathBuf::from("data/journal.db"),
      default_owner: DEFAULT_OWNER.to_owned(),
      users_table:   false,
    }
  }
}

impl Settings {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("JOURNAL").try_parsing(true))
      .build()
      .context("failed to read settings")?;

    let mut settings: Self =
      raw.try_deserialize().context("failed to deserialise Settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions { users_table: self.users_table }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let settings = Settings::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(settings.default_owner, DEFAULT_OWNER);
    assert!(!settings.users_table);
  }

  #[test]
  fn tilde_expands_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let expanded = expand_tilde(Path::new("~/journal.db"));
    assert_eq!(expanded, PathBuf::from(home).join("journal.db"));
    assert_eq!(expand_tilde(Path::new("rel/j.db")), PathBuf::from("rel/j.db"));
  }
}
