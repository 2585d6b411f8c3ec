//! The `EntryStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `journal-store-sqlite`). Higher layers ([`JournalService`], the CLI)
//! depend on this abstraction, not on any concrete backend.
//!
//! [`JournalService`]: crate::service::JournalService

use std::future::Future;

use chrono::NaiveDate;

use crate::entry::{Entry, EntryKey, EntryPatch, NewEntry, QaPair};

/// Abstraction over a journal entry store backend.
///
/// Every method is atomic: it either applies completely or leaves the store
/// as it was before the call. Methods taking an `id` accept either the
/// caller-supplied identity or the persisted key.
///
/// Stores assume a single writer per entry. Two writers reconciling the same
/// entry at once can interleave between the read and write phases of a
/// reconciliation.
pub trait EntryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist `entry`, overwriting any entry with the same resolved key, and
  /// reconcile all six collections against the payload.
  fn create_or_replace(
    &self,
    entry: NewEntry,
  ) -> impl Future<Output = Result<EntryKey, Self::Error>> + Send + '_;

  /// [`create_or_replace`](Self::create_or_replace) for many entries in one
  /// transaction. Any failure rolls back the whole batch.
  fn create_or_replace_batch(
    &self,
    entries: Vec<NewEntry>,
  ) -> impl Future<Output = Result<Vec<EntryKey>, Self::Error>> + Send + '_;

  /// Overwrite the parent fields present in `patch` and reconcile the
  /// collections present in it. Returns `false` if `id` matches nothing.
  fn update<'a>(
    &'a self,
    id: &'a str,
    patch: EntryPatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Reconcile only the follow-up questions of an entry.
  fn update_followups<'a>(
    &'a self,
    id: &'a str,
    followups: Vec<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Reconcile only the question/answer chain of an entry.
  fn update_qa_chain<'a>(
    &'a self,
    id: &'a str,
    qa_chain: Vec<QaPair>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Remove an entry and every child row. Returns `false` if `id` matches
  /// nothing.
  fn delete<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve one hydrated entry. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Entry>, Self::Error>> + Send + 'a;

  /// Every entry, newest `created_at` first.
  fn get_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + '_;

  /// Entries whose logical date lies in `start..=end`, newest first.
  fn get_by_date_range(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + '_;

  /// Entries belonging to `owner_id`, newest first.
  fn get_by_owner<'a>(
    &'a self,
    owner_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + 'a;
}
