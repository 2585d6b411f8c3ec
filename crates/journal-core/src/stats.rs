//! Aggregate statistics over a set of entries.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// How many topics and emotions [`Statistics::top_topics`] and
/// [`Statistics::top_emotions`] keep.
pub const TOP_N: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
  pub total_entries:           usize,
  /// Earliest and latest logical date, if there are entries.
  pub date_range:              Option<(NaiveDate, NaiveDate)>,
  pub top_topics:              Vec<(String, usize)>,
  pub top_emotions:            Vec<(String, usize)>,
  /// Entries per calendar day across the inclusive date range, rounded to
  /// two decimals.
  pub average_entries_per_day: f64,
}

impl Statistics {
  pub fn from_entries(entries: &[Entry]) -> Self {
    if entries.is_empty() {
      return Self::default();
    }

    let first = entries.iter().map(|e| e.date).min();
    let last = entries.iter().map(|e| e.date).max();
    let date_range = first.zip(last);

    let average_entries_per_day = match date_range {
      Some((first, last)) => {
        let days = (last - first).num_days() + 1;
        round2(entries.len() as f64 / days as f64)
      }
      None => 0.0,
    };

    Self {
      total_entries: entries.len(),
      date_range,
      top_topics: top_counts(entries.iter().flat_map(|e| e.topics.iter())),
      top_emotions: top_counts(entries.iter().flat_map(|e| e.emotions.iter())),
      average_entries_per_day,
    }
  }
}

/// Most frequent values first; ties in lexicographic order.
fn top_counts<'a>(
  values: impl Iterator<Item = &'a String>,
) -> Vec<(String, usize)> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for v in values {
    *counts.entry(v.as_str()).or_default() += 1;
  }

  let mut ranked: Vec<(String, usize)> = counts
    .into_iter()
    .map(|(v, n)| (v.to_owned(), n))
    .collect();
  ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
  ranked.truncate(TOP_N);
  ranked
}

fn round2(x: f64) -> f64 { (x * 100.0).round() / 100.0 }

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::entry::EntryKey;

  fn entry(date: &str, topics: &[&str], emotions: &[&str]) -> Entry {
    Entry {
      key:         EntryKey::new(date),
      original_id: None,
      created_at:  Utc::now(),
      date:        date.parse().unwrap(),
      text:        String::new(),
      question:    String::new(),
      owner_id:    "default_user".into(),
      topics:      topics.iter().map(|s| s.to_string()).collect(),
      emotions:    emotions.iter().map(|s| s.to_string()).collect(),
      thoughts:    vec![],
      goals:       vec![],
      followups:   vec![],
      qa_chain:    vec![],
    }
  }

  #[test]
  fn empty_input_yields_zeroes() {
    let stats = Statistics::from_entries(&[]);
    assert_eq!(stats.total_entries, 0);
    assert!(stats.date_range.is_none());
    assert!(stats.top_topics.is_empty());
    assert_eq!(stats.average_entries_per_day, 0.0);
  }

  #[test]
  fn counts_and_ranks() {
    let entries = vec![
      entry("2025-01-01", &["work", "family"], &["calm"]),
      entry("2025-01-02", &["work"], &["tired", "calm"]),
      entry("2025-01-04", &["health", "work"], &["happy"]),
    ];

    let stats = Statistics::from_entries(&entries);
    assert_eq!(stats.total_entries, 3);
    assert_eq!(
      stats.date_range,
      Some(("2025-01-01".parse().unwrap(), "2025-01-04".parse().unwrap()))
    );
    assert_eq!(stats.top_topics[0], ("work".to_string(), 3));
    // Ties break alphabetically.
    assert_eq!(stats.top_topics[1], ("family".to_string(), 1));
    assert_eq!(stats.top_topics[2], ("health".to_string(), 1));
    assert_eq!(stats.top_emotions[0], ("calm".to_string(), 2));
    // 3 entries over 4 days.
    assert_eq!(stats.average_entries_per_day, 0.75);
  }

  #[test]
  fn keeps_only_top_five() {
    let entries = vec![entry(
      "2025-03-01",
      &["a", "b", "c", "d", "e", "f", "g"],
      &[],
    )];
    let stats = Statistics::from_entries(&entries);
    assert_eq!(stats.top_topics.len(), TOP_N);
    assert_eq!(stats.average_entries_per_day, 1.0);
  }
}
