//! A journal entry and its six child collections.
//!
//! An entry is persisted as one parent row plus rows in six child tables.
//! [`Entry`] is the denormalized read model assembled from all seven;
//! [`NewEntry`] and [`EntryPatch`] are the write payloads.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Owner recorded when a payload does not name one.
pub const DEFAULT_OWNER: &str = "default_user";

// ─── Keys ────────────────────────────────────────────────────────────────────

/// The persisted primary key of an entry. Immutable once assigned.
///
/// Keys are opaque strings: either a generated UUID or an identity supplied
/// verbatim by the caller.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryKey(String);

impl EntryKey {
  pub fn new(key: impl Into<String>) -> Self { Self(key.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_string(self) -> String { self.0 }
}

impl fmt::Display for EntryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for EntryKey {
  fn as_ref(&self) -> &str { &self.0 }
}

impl From<String> for EntryKey {
  fn from(key: String) -> Self { Self(key) }
}

impl From<&str> for EntryKey {
  fn from(key: &str) -> Self { Self(key.to_owned()) }
}

// ─── Child values ────────────────────────────────────────────────────────────

/// One question/answer exchange attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
  pub question:   String,
  pub answer:     String,
  /// When the answer was given, if known.
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl QaPair {
  pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
    Self { question: question.into(), answer: answer.into(), created_at: None }
  }

  /// A pair stamped with the current time.
  pub fn answered_now(
    question: impl Into<String>,
    answer: impl Into<String>,
  ) -> Self {
    Self { created_at: Some(Utc::now()), ..Self::new(question, answer) }
  }
}

// ─── Write payloads ──────────────────────────────────────────────────────────

/// Payload for [`EntryStore::create_or_replace`].
///
/// [`EntryStore::create_or_replace`]: crate::store::EntryStore::create_or_replace
///
/// Missing collections deserialize as empty, which drains any rows already
/// stored under the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
  /// Caller-supplied identity. Blank or absent means "generate one".
  #[serde(default)]
  pub id:         Option<String>,
  /// Defaults to the time of the write.
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  pub date:       NaiveDate,
  pub text:       String,
  /// The current prompt shown alongside the entry.
  #[serde(default)]
  pub question:   String,
  #[serde(default)]
  pub owner_id:   Option<String>,

  #[serde(default)]
  pub topics:     Vec<String>,
  #[serde(default)]
  pub emotions:   Vec<String>,
  #[serde(default)]
  pub thoughts:   Vec<String>,
  #[serde(default)]
  pub goals:      Vec<String>,
  #[serde(default, alias = "followup_questions")]
  pub followups:  Vec<String>,
  #[serde(default)]
  pub qa_chain:   Vec<QaPair>,
}

impl NewEntry {
  /// An entry with only a date and body; everything else defaults.
  pub fn new(date: NaiveDate, text: impl Into<String>) -> Self {
    Self {
      id: None,
      created_at: None,
      date,
      text: text.into(),
      question: String::new(),
      owner_id: None,
      topics: Vec::new(),
      emotions: Vec::new(),
      thoughts: Vec::new(),
      goals: Vec::new(),
      followups: Vec::new(),
      qa_chain: Vec::new(),
    }
  }

  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
    self.owner_id = Some(owner_id.into());
    self
  }

  pub fn owner_or_default(&self) -> &str {
    self.owner_id.as_deref().unwrap_or(DEFAULT_OWNER)
  }
}

/// Partial update for [`EntryStore::update`](crate::store::EntryStore::update).
///
/// `None` leaves a field or collection untouched. `Some(vec![])` drains the
/// collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryPatch {
  pub created_at: Option<DateTime<Utc>>,
  pub date:       Option<NaiveDate>,
  pub text:       Option<String>,
  pub question:   Option<String>,
  pub owner_id:   Option<String>,

  pub topics:     Option<Vec<String>>,
  pub emotions:   Option<Vec<String>>,
  pub thoughts:   Option<Vec<String>>,
  pub goals:      Option<Vec<String>>,
  #[serde(alias = "followup_questions")]
  pub followups:  Option<Vec<String>>,
  pub qa_chain:   Option<Vec<QaPair>>,
}

impl EntryPatch {
  /// Whether any parent-row column is set.
  pub fn touches_parent(&self) -> bool {
    self.created_at.is_some()
      || self.date.is_some()
      || self.text.is_some()
      || self.question.is_some()
      || self.owner_id.is_some()
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A fully hydrated entry: parent columns plus all six collections.
///
/// Scalar collections (topics, emotions, thoughts, goals) come back sorted
/// lexicographically; followups and the QA chain keep their stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub key:         EntryKey,
  pub original_id: Option<String>,
  pub created_at:  DateTime<Utc>,
  pub date:        NaiveDate,
  pub text:        String,
  pub question:    String,
  pub owner_id:    String,

  pub topics:      Vec<String>,
  pub emotions:    Vec<String>,
  pub thoughts:    Vec<String>,
  pub goals:       Vec<String>,
  pub followups:   Vec<String>,
  pub qa_chain:    Vec<QaPair>,
}

impl Entry {
  /// The identity callers know this entry by: the supplied identity if there
  /// was one, otherwise the persisted key.
  pub fn id(&self) -> &str {
    self.original_id.as_deref().unwrap_or(self.key.as_str())
  }
}
