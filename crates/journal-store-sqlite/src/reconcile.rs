//! Child-collection reconciliation.
//!
//! Each of an entry's six collections is synchronised against a new list by
//! position:
//!
//! 1. existing rows are fetched in the table's canonical read order (value
//!    order for scalar tables, `order_index` for ordered tables);
//! 2. value `i` overwrites existing row `i`, or is inserted under a fresh row
//!    key when there is no row `i`;
//! 3. existing rows past the end of the new list are deleted.
//!
//! Matching is purely positional. Because scalar tables are read back in
//! value order, changing one scalar value can move other values onto
//! different row keys. Row keys carry no meaning outside this module, so
//! that is accepted in exchange for never deleting and reinserting a whole
//! collection.
//!
//! Everything here runs on a caller-supplied connection, normally an open
//! [`rusqlite::Transaction`]; nothing commits.

use journal_core::{entry::QaPair, identity::generate_key};
use rusqlite::{Connection, params};

use crate::encode::{ChildLists, RawQaPair, encode_dt};

// ─── Tables ──────────────────────────────────────────────────────────────────

/// The four structurally identical single-value collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
  Topics,
  Emotions,
  Thoughts,
  Goals,
}

impl ScalarKind {
  pub const ALL: [ScalarKind; 4] =
    [Self::Topics, Self::Emotions, Self::Thoughts, Self::Goals];

  pub fn table(self) -> &'static str {
    match self {
      Self::Topics => "topics",
      Self::Emotions => "emotions",
      Self::Thoughts => "thoughts",
      Self::Goals => "goals",
    }
  }

  pub fn column(self) -> &'static str {
    match self {
      Self::Topics => "topic",
      Self::Emotions => "emotion",
      Self::Thoughts => "thought",
      Self::Goals => "goal",
    }
  }
}

/// Follow-up questions, kept in list order.
pub struct Followups;

/// Question/answer pairs, kept in list order.
pub struct QaChain;

/// Per-table SQL used by [`reconcile`].
pub trait ChildTable {
  type Value;

  fn table(&self) -> &'static str;

  /// Select `row_id` for one entry (`?1`) in canonical read order.
  fn existing_sql(&self) -> String;

  /// Overwrite row `row_id` with `value`, now at list position `index`.
  fn update_row(
    &self,
    conn: &Connection,
    row_id: &str,
    value: &Self::Value,
    index: usize,
  ) -> rusqlite::Result<()>;

  fn insert_row(
    &self,
    conn: &Connection,
    row_id: &str,
    entry_id: &str,
    value: &Self::Value,
    index: usize,
  ) -> rusqlite::Result<()>;
}

impl ChildTable for ScalarKind {
  type Value = String;

  fn table(&self) -> &'static str { ScalarKind::table(*self) }

  // `row_id` only breaks ties between duplicate values.
  fn existing_sql(&self) -> String {
    format!(
      "SELECT row_id FROM {} WHERE entry_id = ?1 ORDER BY {}, row_id",
      self.table(),
      self.column()
    )
  }

  fn update_row(
    &self,
    conn: &Connection,
    row_id: &str,
    value: &String,
    _index: usize,
  ) -> rusqlite::Result<()> {
    let sql = format!(
      "UPDATE {} SET {} = ?1 WHERE row_id = ?2",
      self.table(),
      self.column()
    );
    conn.prepare_cached(&sql)?.execute(params![value, row_id])?;
    Ok(())
  }

  fn insert_row(
    &self,
    conn: &Connection,
    row_id: &str,
    entry_id: &str,
    value: &String,
    _index: usize,
  ) -> rusqlite::Result<()> {
    let sql = format!(
      "INSERT INTO {} (row_id, entry_id, {}) VALUES (?1, ?2, ?3)",
      self.table(),
      self.column()
    );
    conn.prepare_cached(&sql)?.execute(params![row_id, entry_id, value])?;
    Ok(())
  }
}

impl ChildTable for Followups {
  type Value = String;

  fn table(&self) -> &'static str { "followups" }

  fn existing_sql(&self) -> String {
    "SELECT row_id FROM followups
     WHERE entry_id = ?1
     ORDER BY order_index, row_id"
      .to_owned()
  }

  fn update_row(
    &self,
    conn: &Connection,
    row_id: &str,
    question: &String,
    index: usize,
  ) -> rusqlite::Result<()> {
    conn
      .prepare_cached(
        "UPDATE followups SET question = ?1, order_index = ?2
         WHERE row_id = ?3",
      )?
      .execute(params![question, index as i64, row_id])?;
    Ok(())
  }

  fn insert_row(
    &self,
    conn: &Connection,
    row_id: &str,
    entry_id: &str,
    question: &String,
    index: usize,
  ) -> rusqlite::Result<()> {
    conn
      .prepare_cached(
        "INSERT INTO followups (row_id, entry_id, question, order_index)
         VALUES (?1, ?2, ?3, ?4)",
      )?
      .execute(params![row_id, entry_id, question, index as i64])?;
    Ok(())
  }
}

impl ChildTable for QaChain {
  type Value = QaPair;

  fn table(&self) -> &'static str { "qa_chain" }

  fn existing_sql(&self) -> String {
    "SELECT row_id FROM qa_chain
     WHERE entry_id = ?1
     ORDER BY order_index, row_id"
      .to_owned()
  }

  fn update_row(
    &self,
    conn: &Connection,
    row_id: &str,
    pair: &QaPair,
    index: usize,
  ) -> rusqlite::Result<()> {
    conn
      .prepare_cached(
        "UPDATE qa_chain
         SET question = ?1, answer = ?2, created_at = ?3, order_index = ?4
         WHERE row_id = ?5",
      )?
      .execute(params![
        pair.question,
        pair.answer,
        pair.created_at.map(encode_dt),
        index as i64,
        row_id,
      ])?;
    Ok(())
  }

  fn insert_row(
    &self,
    conn: &Connection,
    row_id: &str,
    entry_id: &str,
    pair: &QaPair,
    index: usize,
  ) -> rusqlite::Result<()> {
    conn
      .prepare_cached(
        "INSERT INTO qa_chain (
           row_id, entry_id, question, answer, created_at, order_index
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      )?
      .execute(params![
        row_id,
        entry_id,
        pair.question,
        pair.answer,
        pair.created_at.map(encode_dt),
        index as i64,
      ])?;
    Ok(())
  }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Row counts touched by one [`reconcile`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
  pub updated:  usize,
  pub inserted: usize,
  pub deleted:  usize,
}

/// Synchronise `table`'s rows for `entry_id` with `values`, by position.
///
/// An empty `values` deletes every row of the collection. Any row-level
/// failure is returned as-is; the caller's transaction must roll back.
pub fn reconcile<T: ChildTable>(
  conn: &Connection,
  table: &T,
  entry_id: &str,
  values: &[T::Value],
) -> rusqlite::Result<Reconciled> {
  let existing = existing_row_ids(conn, table, entry_id)?;
  let mut outcome = Reconciled::default();

  for (index, value) in values.iter().enumerate() {
    match existing.get(index) {
      Some(row_id) => {
        table.update_row(conn, row_id, value, index)?;
        outcome.updated += 1;
      }
      None => {
        let row_id = generate_key();
        table.insert_row(conn, row_id.as_str(), entry_id, value, index)?;
        outcome.inserted += 1;
      }
    }
  }

  if let Some(surplus) = existing.get(values.len()..) {
    let sql = format!("DELETE FROM {} WHERE row_id = ?1", table.table());
    let mut stmt = conn.prepare_cached(&sql)?;
    for row_id in surplus {
      stmt.execute(params![row_id])?;
      outcome.deleted += 1;
    }
  }

  tracing::debug!(
    table = table.table(),
    entry_id,
    updated = outcome.updated,
    inserted = outcome.inserted,
    deleted = outcome.deleted,
    "reconciled child collection"
  );

  Ok(outcome)
}

/// Reconcile every collection present in `lists`; absent ones are untouched.
pub fn reconcile_all(
  conn: &Connection,
  entry_id: &str,
  lists: &ChildLists,
) -> rusqlite::Result<()> {
  let scalars = [
    (ScalarKind::Topics, &lists.topics),
    (ScalarKind::Emotions, &lists.emotions),
    (ScalarKind::Thoughts, &lists.thoughts),
    (ScalarKind::Goals, &lists.goals),
  ];
  for (kind, values) in scalars {
    if let Some(values) = values {
      reconcile(conn, &kind, entry_id, values)?;
    }
  }

  if let Some(followups) = &lists.followups {
    reconcile(conn, &Followups, entry_id, followups)?;
  }
  if let Some(qa_chain) = &lists.qa_chain {
    reconcile(conn, &QaChain, entry_id, qa_chain)?;
  }
  Ok(())
}

/// Delete every child row of `entry_id` in all six tables.
pub fn delete_children(
  conn: &Connection,
  entry_id: &str,
) -> rusqlite::Result<()> {
  let tables = ScalarKind::ALL
    .iter()
    .map(|k| k.table())
    .chain([Followups.table(), QaChain.table()]);
  for table in tables {
    conn.execute(
      &format!("DELETE FROM {table} WHERE entry_id = ?1"),
      params![entry_id],
    )?;
  }
  Ok(())
}

fn existing_row_ids<T: ChildTable>(
  conn: &Connection,
  table: &T,
  entry_id: &str,
) -> rusqlite::Result<Vec<String>> {
  let sql = table.existing_sql();
  let mut stmt = conn.prepare_cached(&sql)?;
  let rows = stmt
    .query_map(params![entry_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Values of a scalar collection, lexicographically.
pub fn read_scalar(
  conn: &Connection,
  kind: ScalarKind,
  entry_id: &str,
) -> rusqlite::Result<Vec<String>> {
  let sql = format!(
    "SELECT {c} FROM {t} WHERE entry_id = ?1 ORDER BY {c}, row_id",
    c = kind.column(),
    t = kind.table()
  );
  let mut stmt = conn.prepare_cached(&sql)?;
  let rows = stmt
    .query_map(params![entry_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn read_followups(
  conn: &Connection,
  entry_id: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT question FROM followups
     WHERE entry_id = ?1
     ORDER BY order_index, row_id",
  )?;
  let rows = stmt
    .query_map(params![entry_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn read_qa_chain(
  conn: &Connection,
  entry_id: &str,
) -> rusqlite::Result<Vec<RawQaPair>> {
  let mut stmt = conn.prepare_cached(
    "SELECT question, answer, created_at FROM qa_chain
     WHERE entry_id = ?1
     ORDER BY order_index, row_id",
  )?;
  let rows = stmt
    .query_map(params![entry_id], |row| {
      Ok(RawQaPair {
        question:   row.get(0)?,
        answer:     row.get(1)?,
        created_at: row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::SCHEMA;

  const ENTRY: &str = "entry-1";

  fn conn() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory db");
    conn.execute_batch(SCHEMA).expect("schema");
    conn
      .execute(
        "INSERT INTO entries (entry_id, created_at, date, text)
         VALUES (?1, '2025-01-01T00:00:00.000000000Z', '2025-01-01', 'body')",
        params![ENTRY],
      )
      .expect("parent row");
    conn
  }

  fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
  }

  fn set(conn: &Connection, kind: ScalarKind, values: &[&str]) -> Reconciled {
    reconcile(conn, &kind, ENTRY, &strings(values)).unwrap()
  }

  fn scalars(conn: &Connection, kind: ScalarKind) -> Vec<String> {
    read_scalar(conn, kind, ENTRY).unwrap()
  }

  /// `(row_id, value)` in canonical read order.
  fn topic_rows(conn: &Connection) -> Vec<(String, String)> {
    let mut stmt = conn
      .prepare(
        "SELECT row_id, topic FROM topics
         WHERE entry_id = ?1 ORDER BY topic, row_id",
      )
      .unwrap();
    let rows = stmt
      .query_map(params![ENTRY], |r| Ok((r.get(0)?, r.get(1)?)))
      .unwrap()
      .collect::<rusqlite::Result<_>>()
      .unwrap();
    rows
  }

  fn followup_rows(conn: &Connection) -> Vec<(String, String, i64)> {
    let mut stmt = conn
      .prepare(
        "SELECT row_id, question, order_index FROM followups
         WHERE entry_id = ?1 ORDER BY order_index",
      )
      .unwrap();
    let rows = stmt
      .query_map(params![ENTRY], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
      .unwrap()
      .collect::<rusqlite::Result<_>>()
      .unwrap();
    rows
  }

  #[test]
  fn empty_existing_is_pure_insertion() {
    let conn = conn();
    let outcome = set(&conn, ScalarKind::Topics, &["work", "family"]);

    assert_eq!(outcome, Reconciled { updated: 0, inserted: 2, deleted: 0 });
    assert_eq!(scalars(&conn, ScalarKind::Topics), ["family", "work"]);
  }

  #[test]
  fn grow_overwrites_in_place_then_inserts() {
    let conn = conn();
    set(&conn, ScalarKind::Topics, &["work", "family"]);
    let before: Vec<String> =
      topic_rows(&conn).into_iter().map(|(id, _)| id).collect();

    let outcome = set(&conn, ScalarKind::Topics, &["work", "family", "health"]);
    assert_eq!(outcome, Reconciled { updated: 2, inserted: 1, deleted: 0 });

    let after = topic_rows(&conn);
    assert_eq!(after.len(), 3);
    // The two original rows survive under their original keys.
    for id in &before {
      assert!(after.iter().any(|(row_id, _)| row_id == id));
    }
  }

  #[test]
  fn scalar_matching_follows_value_order_not_identity() {
    let conn = conn();
    set(&conn, ScalarKind::Topics, &["work", "family"]);
    // Stored order is ["family", "work"].
    let rows = topic_rows(&conn);
    let family_row = rows[0].0.clone();
    let work_row = rows[1].0.clone();

    set(&conn, ScalarKind::Topics, &["work", "family", "health"]);

    // Position 0 of the new list lands on the row that used to hold "family".
    let value_of = |id: &str| {
      topic_rows(&conn)
        .into_iter()
        .find(|(row_id, _)| row_id == id)
        .map(|(_, v)| v)
        .unwrap()
    };
    assert_eq!(value_of(&family_row), "work");
    assert_eq!(value_of(&work_row), "family");
  }

  #[test]
  fn shrink_deletes_surplus_rows() {
    let conn = conn();
    set(&conn, ScalarKind::Goals, &["a", "b", "c", "d"]);

    let outcome = set(&conn, ScalarKind::Goals, &["x", "y"]);
    assert_eq!(outcome, Reconciled { updated: 2, inserted: 0, deleted: 2 });
    assert_eq!(scalars(&conn, ScalarKind::Goals), ["x", "y"]);
  }

  #[test]
  fn empty_list_drains_collection() {
    let conn = conn();
    set(&conn, ScalarKind::Emotions, &["calm", "tired"]);

    let outcome = set(&conn, ScalarKind::Emotions, &[]);
    assert_eq!(outcome.deleted, 2);
    assert!(scalars(&conn, ScalarKind::Emotions).is_empty());
  }

  #[test]
  fn ordered_rows_are_restamped() {
    let conn = conn();
    reconcile(&conn, &Followups, ENTRY, &strings(&["q1", "q2", "q3"])).unwrap();
    let first_row = followup_rows(&conn)[0].0.clone();

    reconcile(&conn, &Followups, ENTRY, &strings(&["q3"])).unwrap();

    let rows = followup_rows(&conn);
    assert_eq!(rows, vec![(first_row, "q3".to_string(), 0)]);
  }

  #[test]
  fn qa_pairs_overwrite_every_field() {
    let conn = conn();
    let stamped = QaPair::answered_now("How was it?", "Long day");
    reconcile(&conn, &QaChain, ENTRY, &[stamped]).unwrap();

    let plain = QaPair::new("Why?", "Because");
    reconcile(&conn, &QaChain, ENTRY, &[plain]).unwrap();

    let chain = read_qa_chain(&conn, ENTRY).unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].question, "Why?");
    assert_eq!(chain[0].answer, "Because");
    assert!(chain[0].created_at.is_none());
  }

  #[test]
  fn collections_are_independent() {
    let conn = conn();
    let lists = ChildLists {
      topics: Some(strings(&["work"])),
      followups: Some(strings(&["What next?"])),
      ..ChildLists::default()
    };
    reconcile_all(&conn, ENTRY, &lists).unwrap();

    // Absent collections are left alone.
    let only_topics =
      ChildLists { topics: Some(vec![]), ..ChildLists::default() };
    reconcile_all(&conn, ENTRY, &only_topics).unwrap();

    assert!(scalars(&conn, ScalarKind::Topics).is_empty());
    assert_eq!(read_followups(&conn, ENTRY).unwrap(), ["What next?"]);
  }

  #[test]
  fn child_rows_need_a_parent() {
    let conn = conn();
    let err =
      reconcile(&conn, &ScalarKind::Topics, "missing", &strings(&["x"]));
    assert!(err.is_err());
  }

  #[test]
  fn delete_children_clears_all_tables() {
    let conn = conn();
    let lists = ChildLists {
      topics:    Some(strings(&["t"])),
      emotions:  Some(strings(&["e"])),
      thoughts:  Some(strings(&["th"])),
      goals:     Some(strings(&["g"])),
      followups: Some(strings(&["f"])),
      qa_chain:  Some(vec![QaPair::new("q", "a")]),
    };
    reconcile_all(&conn, ENTRY, &lists).unwrap();
    delete_children(&conn, ENTRY).unwrap();

    for kind in ScalarKind::ALL {
      assert!(read_scalar(&conn, kind, ENTRY).unwrap().is_empty());
    }
    assert!(read_followups(&conn, ENTRY).unwrap().is_empty());
    assert!(read_qa_chain(&conn, ENTRY).unwrap().is_empty());
  }
}
