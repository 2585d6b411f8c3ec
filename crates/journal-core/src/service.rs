//! Journaling workflow on top of any [`EntryStore`].
//!
//! Text analysis is an external collaborator reached through the
//! [`Analyzer`] trait. [`JournalService`] validates input, runs the
//! analyzer, and turns the result into store writes.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entry::{Entry, EntryPatch, NewEntry, QaPair},
  stats::Statistics,
  store::EntryStore,
  validate,
};

// ─── Analyzer seam ───────────────────────────────────────────────────────────

/// What the analyzer extracts from an entry's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
  pub topics:    Vec<String>,
  pub emotions:  Vec<String>,
  pub thoughts:  Vec<String>,
  pub goals:     Vec<String>,
  #[serde(alias = "followup_questions")]
  pub followups: Vec<String>,
  pub qa_pairs:  Vec<QaPair>,
  /// A prompt to show next to the entry.
  pub question:  String,
}

/// Turns free text into candidate collections. Opaque to this crate.
pub trait Analyzer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn analyze<'a>(
    &'a self,
    text: &'a str,
  ) -> impl Future<Output = Result<Analysis, Self::Error>> + Send + 'a;
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct JournalService<S, A> {
  store:    S,
  analyzer: A,
}

impl<S: EntryStore, A: Analyzer> JournalService<S, A> {
  pub fn new(store: S, analyzer: A) -> Self { Self { store, analyzer } }

  pub fn store(&self) -> &S { &self.store }

  /// Validate, analyze and persist a new entry under a generated key.
  pub async fn write_entry(
    &self,
    text: &str,
    date: NaiveDate,
    owner_id: &str,
  ) -> Result<Entry> {
    validate::entry_text(text)?;
    let analysis = self.analyze(text).await?;

    let entry = NewEntry {
      question: analysis.question,
      topics: analysis.topics,
      emotions: analysis.emotions,
      thoughts: analysis.thoughts,
      goals: analysis.goals,
      followups: analysis.followups,
      qa_chain: analysis.qa_pairs,
      ..NewEntry::new(date, text).with_owner(owner_id)
    };

    let key = self.store.create_or_replace(entry).await.map_err(store_err)?;
    tracing::info!(%key, %date, "journal entry written");

    self
      .store
      .get(key.as_str())
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::NotFound(key.to_string()))
  }

  /// Re-run analysis on a stored entry and replace its derived collections.
  /// The QA chain is left as it is.
  pub async fn reanalyze(&self, id: &str) -> Result<Analysis> {
    let entry = self.require(id).await?;
    let analysis = self.analyze(&entry.text).await?;

    let patch = EntryPatch {
      question: Some(analysis.question.clone()),
      topics: Some(analysis.topics.clone()),
      emotions: Some(analysis.emotions.clone()),
      thoughts: Some(analysis.thoughts.clone()),
      goals: Some(analysis.goals.clone()),
      followups: Some(analysis.followups.clone()),
      ..EntryPatch::default()
    };

    if !self.store.update(id, patch).await.map_err(store_err)? {
      return Err(Error::NotFound(id.to_owned()));
    }
    tracing::info!(id, "journal entry reanalyzed");
    Ok(analysis)
  }

  /// Append an answered question to the entry's QA chain.
  pub async fn answer(
    &self,
    id: &str,
    question: &str,
    answer: &str,
  ) -> Result<Vec<QaPair>> {
    validate::answer(answer)?;
    let mut chain = self.require(id).await?.qa_chain;
    chain.push(QaPair::answered_now(question, answer));

    if !self
      .store
      .update_qa_chain(id, chain.clone())
      .await
      .map_err(store_err)?
    {
      return Err(Error::NotFound(id.to_owned()));
    }
    Ok(chain)
  }

  /// Apply a partial update. Replacement text is held to the same rules as
  /// new entries.
  pub async fn update_entry(&self, id: &str, patch: EntryPatch) -> Result<()> {
    if let Some(text) = &patch.text {
      validate::entry_text(text)?;
    }
    if !self.store.update(id, patch).await.map_err(store_err)? {
      return Err(Error::NotFound(id.to_owned()));
    }
    tracing::info!(id, "journal entry updated");
    Ok(())
  }

  /// Move an entry to another logical date given as `YYYY-MM-DD`.
  pub async fn set_date(&self, id: &str, date: &str) -> Result<NaiveDate> {
    let date = validate::parse_date(date)?;
    let patch = EntryPatch { date: Some(date), ..EntryPatch::default() };

    if !self.store.update(id, patch).await.map_err(store_err)? {
      return Err(Error::NotFound(id.to_owned()));
    }
    Ok(date)
  }

  /// One owner's entries for a single logical date, newest first.
  pub async fn entries_on(
    &self,
    owner_id: &str,
    date: NaiveDate,
  ) -> Result<Vec<Entry>> {
    let mut entries = self
      .store
      .get_by_date_range(date, date)
      .await
      .map_err(store_err)?;
    entries.retain(|e| e.owner_id == owner_id);
    Ok(entries)
  }

  pub async fn statistics(&self, owner_id: &str) -> Result<Statistics> {
    let entries = self.store.get_by_owner(owner_id).await.map_err(store_err)?;
    Ok(Statistics::from_entries(&entries))
  }

  async fn require(&self, id: &str) -> Result<Entry> {
    self
      .store
      .get(id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::NotFound(id.to_owned()))
  }

  async fn analyze(&self, text: &str) -> Result<Analysis> {
    self
      .analyzer
      .analyze(text)
      .await
      .map_err(|e| Error::Analyzer(Box::new(e)))
  }
}

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}
