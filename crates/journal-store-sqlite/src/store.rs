//! The SQLite implementation of [`EntryStore`].

use std::path::Path;

use chrono::NaiveDate;
use journal_core::{
  entry::{Entry, EntryKey, EntryPatch, NewEntry, QaPair},
  identity,
  store::EntryStore,
  validate,
};
use rusqlite::{Connection, OptionalExtension as _, Params, params};

use crate::{
  Result,
  encode::{ChildLists, EncodedEntry, EncodedPatch, RawEntry, encode_date},
  reconcile::{
    ScalarKind, delete_children, read_followups, read_qa_chain, read_scalar,
    reconcile_all,
  },
  schema::{SCHEMA, USERS_SCHEMA},
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Schema choices made when a store is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
  /// Also create the `users` table used by authenticating deployments.
  pub users_table: bool,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A journal entry store backed by a single SQLite file.
///
/// Clones share one connection thread, so calls never run concurrently.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  pub async fn open_with(
    path: impl AsRef<Path>,
    options: StoreOptions,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.ensure_schema(options).await?;
    Ok(store)
  }

  /// Open an empty in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with(StoreOptions::default()).await
  }

  pub async fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.ensure_schema(options).await?;
    Ok(store)
  }

  /// Create any missing tables and indexes. Safe to call repeatedly.
  pub async fn ensure_schema(&self, options: StoreOptions) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        if options.users_table {
          conn.execute_batch(USERS_SCHEMA)?;
        }
        Ok(())
      })
      .await?;
    tracing::info!(users_table = options.users_table, "journal schema ready");
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Reconcile the given collections of an existing entry, leaving the parent
  /// row and every other collection alone.
  async fn reconcile_existing(
    &self,
    id: &str,
    lists: ChildLists,
  ) -> Result<bool> {
    let id = id.to_owned();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(key) = resolve_key(&tx, &id)? else {
          return Ok(false);
        };
        reconcile_all(&tx, &key, &lists)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(found)
  }

  async fn load(&self, filter: Filter) -> Result<Vec<Entry>> {
    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| Ok(load_entries(conn, &filter)?))
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }
}

// ─── EntryStore impl ─────────────────────────────────────────────────────────

impl EntryStore for SqliteStore {
  type Error = crate::Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create_or_replace(&self, entry: NewEntry) -> Result<EntryKey> {
    let identity = identity::resolve(entry.id.as_deref());
    let encoded = EncodedEntry::new(&identity, entry);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_entry(&tx, &encoded)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(key = %identity.key(), "entry written");
    Ok(identity.into_key())
  }

  async fn create_or_replace_batch(
    &self,
    entries: Vec<NewEntry>,
  ) -> Result<Vec<EntryKey>> {
    let mut keys = Vec::with_capacity(entries.len());
    let mut encoded = Vec::with_capacity(entries.len());
    for entry in entries {
      let identity = identity::resolve(entry.id.as_deref());
      encoded.push(EncodedEntry::new(&identity, entry));
      keys.push(identity.into_key());
    }

    let count = encoded.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for entry in &encoded {
          write_entry(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(count, "entry batch written");
    Ok(keys)
  }

  async fn update<'a>(
    &'a self,
    id: &'a str,
    patch: EntryPatch,
  ) -> Result<bool> {
    let patch = EncodedPatch::from(patch);
    let id_str = id.to_owned();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(key) = resolve_key(&tx, &id_str)? else {
          return Ok(false);
        };

        if patch.touches_parent {
          tx.execute(
            "UPDATE entries SET
               created_at = COALESCE(?2, created_at),
               date       = COALESCE(?3, date),
               text       = COALESCE(?4, text),
               question   = COALESCE(?5, question),
               owner_id   = COALESCE(?6, owner_id)
             WHERE entry_id = ?1",
            params![
              key,
              patch.created_at,
              patch.date,
              patch.text,
              patch.question,
              patch.owner_id,
            ],
          )?;
        }
        reconcile_all(&tx, &key, &patch.children)?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      tracing::debug!(id, "update target not found");
    }
    Ok(found)
  }

  async fn update_followups<'a>(
    &'a self,
    id: &'a str,
    followups: Vec<String>,
  ) -> Result<bool> {
    let lists =
      ChildLists { followups: Some(followups), ..ChildLists::default() };
    self.reconcile_existing(id, lists).await
  }

  async fn update_qa_chain<'a>(
    &'a self,
    id: &'a str,
    qa_chain: Vec<QaPair>,
  ) -> Result<bool> {
    let lists =
      ChildLists { qa_chain: Some(qa_chain), ..ChildLists::default() };
    self.reconcile_existing(id, lists).await
  }

  async fn delete<'a>(&'a self, id: &'a str) -> Result<bool> {
    let id_str = id.to_owned();

    let deleted: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(key) = resolve_key(&tx, &id_str)? else {
          return Ok(None);
        };
        delete_children(&tx, &key)?;
        tx.execute("DELETE FROM entries WHERE entry_id = ?1", params![key])?;
        tx.commit()?;
        Ok(Some(key))
      })
      .await?;

    match deleted {
      Some(key) => {
        tracing::info!(id, key = %key, "entry deleted");
        Ok(true)
      }
      None => Ok(false),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get<'a>(&'a self, id: &'a str) -> Result<Option<Entry>> {
    let id_str = id.to_owned();

    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        let Some(key) = resolve_key(conn, &id_str)? else {
          return Ok(None);
        };
        let parent = query_parents(
          conn,
          &format!("{PARENT_COLUMNS} WHERE entry_id = ?1"),
          params![key],
        )?
        .into_iter()
        .next();
        Ok(parent.map(|p| hydrate(conn, p)).transpose()?)
      })
      .await?;

    raw.map(RawEntry::into_entry).transpose()
  }

  async fn get_all(&self) -> Result<Vec<Entry>> { self.load(Filter::All).await }

  async fn get_by_date_range(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<Entry>> {
    validate::date_range(start, end)?;
    let filter =
      Filter::DateRange { start: encode_date(start), end: encode_date(end) };
    self.load(filter).await
  }

  async fn get_by_owner<'a>(
    &'a self,
    owner_id: &'a str,
  ) -> Result<Vec<Entry>> {
    self.load(Filter::Owner(owner_id.to_owned())).await
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

const PARENT_COLUMNS: &str =
  "SELECT entry_id, original_id, created_at, date, text, question, owner_id
   FROM entries";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, entry_id";

/// Which parent rows a read selects.
enum Filter {
  All,
  DateRange { start: String, end: String },
  Owner(String),
}

/// Find the persisted key for either a caller-supplied identity or the key
/// itself. An exact key match wins.
fn resolve_key(
  conn: &Connection,
  id: &str,
) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT entry_id FROM entries
       WHERE entry_id = ?1 OR original_id = ?1
       ORDER BY entry_id = ?1 DESC
       LIMIT 1",
      params![id],
      |row| row.get(0),
    )
    .optional()
}

/// Upsert the parent row (full column overwrite) and reconcile all six
/// collections.
fn write_entry(
  conn: &Connection,
  entry: &EncodedEntry,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO entries (
       entry_id, original_id, created_at, date, text, question, owner_id
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(entry_id) DO UPDATE SET
       original_id = excluded.original_id,
       created_at  = excluded.created_at,
       date        = excluded.date,
       text        = excluded.text,
       question    = excluded.question,
       owner_id    = excluded.owner_id",
    params![
      entry.entry_id,
      entry.original_id,
      entry.created_at,
      entry.date,
      entry.text,
      entry.question,
      entry.owner_id,
    ],
  )?;
  reconcile_all(conn, &entry.entry_id, &entry.children)
}

fn load_entries(
  conn: &Connection,
  filter: &Filter,
) -> rusqlite::Result<Vec<RawEntry>> {
  let parents = match filter {
    Filter::All => {
      query_parents(conn, &format!("{PARENT_COLUMNS} {NEWEST_FIRST}"), [])?
    }
    Filter::DateRange { start, end } => query_parents(
      conn,
      &format!("{PARENT_COLUMNS} WHERE date BETWEEN ?1 AND ?2 {NEWEST_FIRST}"),
      params![start, end],
    )?,
    Filter::Owner(owner) => query_parents(
      conn,
      &format!("{PARENT_COLUMNS} WHERE owner_id = ?1 {NEWEST_FIRST}"),
      params![owner],
    )?,
  };

  parents.into_iter().map(|p| hydrate(conn, p)).collect()
}

fn query_parents<P: Params>(
  conn: &Connection,
  sql: &str,
  params: P,
) -> rusqlite::Result<Vec<RawEntry>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(params, |row| {
      Ok(RawEntry {
        entry_id:    row.get(0)?,
        original_id: row.get(1)?,
        created_at:  row.get(2)?,
        date:        row.get(3)?,
        text:        row.get(4)?,
        question:    row.get(5)?,
        owner_id:    row.get(6)?,
        topics:      Vec::new(),
        emotions:    Vec::new(),
        thoughts:    Vec::new(),
        goals:       Vec::new(),
        followups:   Vec::new(),
        qa_chain:    Vec::new(),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Fill in the six collections, one query each.
fn hydrate(conn: &Connection, mut raw: RawEntry) -> rusqlite::Result<RawEntry> {
  let id = raw.entry_id.clone();
  raw.topics = read_scalar(conn, ScalarKind::Topics, &id)?;
  raw.emotions = read_scalar(conn, ScalarKind::Emotions, &id)?;
  raw.thoughts = read_scalar(conn, ScalarKind::Thoughts, &id)?;
  raw.goals = read_scalar(conn, ScalarKind::Goals, &id)?;
  raw.followups = read_followups(conn, &id)?;
  raw.qa_chain = read_qa_chain(conn, &id)?;
  Ok(raw)
}
