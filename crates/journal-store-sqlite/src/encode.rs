//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed nanosecond precision
//! and a `Z` suffix, so text order equals time order. Logical dates are
//! stored as `YYYY-MM-DD`, which makes `BETWEEN` an inclusive calendar range.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use journal_core::{
  entry::{Entry, EntryKey, EntryPatch, NewEntry, QaPair},
  identity::EntryIdentity,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Child lists ─────────────────────────────────────────────────────────────

/// The collections a write touches. `None` leaves a collection untouched.
#[derive(Debug, Default)]
pub struct ChildLists {
  pub topics:    Option<Vec<String>>,
  pub emotions:  Option<Vec<String>>,
  pub thoughts:  Option<Vec<String>>,
  pub goals:     Option<Vec<String>>,
  pub followups: Option<Vec<String>>,
  pub qa_chain:  Option<Vec<QaPair>>,
}

// ─── Write rows ──────────────────────────────────────────────────────────────

/// A [`NewEntry`] with its identity resolved and parent columns encoded.
pub struct EncodedEntry {
  pub entry_id:    String,
  pub original_id: Option<String>,
  pub created_at:  String,
  pub date:        String,
  pub text:        String,
  pub question:    String,
  pub owner_id:    String,
  /// Every collection is present: absent payload fields were defaulted to
  /// empty when the payload was built.
  pub children:    ChildLists,
}

impl EncodedEntry {
  pub fn new(identity: &EntryIdentity, entry: NewEntry) -> Self {
    let owner_id = entry.owner_or_default().to_owned();
    Self {
      entry_id: identity.key().as_str().to_owned(),
      original_id: identity.original_id().map(str::to_owned),
      created_at: encode_dt(entry.created_at.unwrap_or_else(Utc::now)),
      date: encode_date(entry.date),
      text: entry.text,
      question: entry.question,
      owner_id,
      children: ChildLists {
        topics:    Some(entry.topics),
        emotions:  Some(entry.emotions),
        thoughts:  Some(entry.thoughts),
        goals:     Some(entry.goals),
        followups: Some(entry.followups),
        qa_chain:  Some(entry.qa_chain),
      },
    }
  }
}

/// An [`EntryPatch`] with parent columns encoded; `None` means unchanged.
pub struct EncodedPatch {
  pub created_at:     Option<String>,
  pub date:           Option<String>,
  pub text:           Option<String>,
  pub question:       Option<String>,
  pub owner_id:       Option<String>,
  pub touches_parent: bool,
  pub children:       ChildLists,
}

impl From<EntryPatch> for EncodedPatch {
  fn from(patch: EntryPatch) -> Self {
    let touches_parent = patch.touches_parent();
    Self {
      created_at: patch.created_at.map(encode_dt),
      date: patch.date.map(encode_date),
      text: patch.text,
      question: patch.question,
      owner_id: patch.owner_id,
      touches_parent,
      children: ChildLists {
        topics:    patch.topics,
        emotions:  patch.emotions,
        thoughts:  patch.thoughts,
        goals:     patch.goals,
        followups: patch.followups,
        qa_chain:  patch.qa_chain,
      },
    }
  }
}

// ─── Read rows ───────────────────────────────────────────────────────────────

/// Raw strings read from a `qa_chain` row.
pub struct RawQaPair {
  pub question:   String,
  pub answer:     String,
  pub created_at: Option<String>,
}

impl RawQaPair {
  pub fn into_pair(self) -> Result<QaPair> {
    Ok(QaPair {
      question:   self.question,
      answer:     self.answer,
      created_at: self
        .created_at
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(decode_dt)
        .transpose()?,
    })
  }
}

/// Raw strings read from an `entries` row plus its hydrated children.
pub struct RawEntry {
  // entries columns
  pub entry_id:    String,
  pub original_id: Option<String>,
  pub created_at:  String,
  pub date:        String,
  pub text:        String,
  pub question:    String,
  pub owner_id:    String,
  // child tables
  pub topics:      Vec<String>,
  pub emotions:    Vec<String>,
  pub thoughts:    Vec<String>,
  pub goals:       Vec<String>,
  pub followups:   Vec<String>,
  pub qa_chain:    Vec<RawQaPair>,
}

impl RawEntry {
  pub fn into_entry(self) -> Result<Entry> {
    let qa_chain: Vec<QaPair> = self
      .qa_chain
      .into_iter()
      .map(RawQaPair::into_pair)
      .collect::<Result<_>>()?;

    Ok(Entry {
      key:         EntryKey::new(self.entry_id),
      // Older rows may hold '' instead of NULL here and in
      // `qa_chain.created_at`.
      original_id: self.original_id.filter(|id| !id.is_empty()),
      created_at:  decode_dt(&self.created_at)?,
      date:        decode_date(&self.date)?,
      text:        self.text,
      question:    self.question,
      owner_id:    self.owner_id,
      topics:      self.topics,
      emotions:    self.emotions,
      thoughts:    self.thoughts,
      goals:       self.goals,
      followups:   self.followups,
      qa_chain,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let early = "2025-01-01T09:00:00Z".parse::<DateTime<Utc>>().unwrap();
    let late = early + chrono::Duration::milliseconds(1500);
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn nanoseconds_survive_encoding() {
    let dt = "2025-01-01T08:00:00.123456789Z".parse::<DateTime<Utc>>().unwrap();
    let encoded = encode_dt(dt);
    assert_eq!(encoded, "2025-01-01T08:00:00.123456789Z");
    assert_eq!(decode_dt(&encoded).unwrap(), dt);
  }

  #[test]
  fn whole_seconds_keep_fixed_width() {
    let dt = "2025-01-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap();
    assert_eq!(encode_dt(dt), "2025-01-01T08:00:00.000000000Z");
  }

  #[test]
  fn empty_qa_timestamp_reads_as_none() {
    let raw = RawQaPair {
      question:   "Q".into(),
      answer:     "A".into(),
      created_at: Some(String::new()),
    };
    assert_eq!(raw.into_pair().unwrap().created_at, None);
  }

  #[test]
  fn bad_stored_date_is_reported() {
    assert!(matches!(decode_date("2025/01/01"), Err(Error::DateParse(_))));
  }
}
