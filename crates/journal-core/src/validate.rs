//! Input validation. Every check here runs before a store transaction opens.

use chrono::NaiveDate;

use crate::{Error, Result};

pub const MIN_ENTRY_CHARS: usize = 10;
pub const MAX_ENTRY_CHARS: usize = 10_000;
pub const MIN_ANSWER_CHARS: usize = 5;

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|e| Error::Validation(format!("invalid date {s:?}: {e}")))
}

/// Inclusive range bounds must be ordered.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
  if start > end {
    return Err(Error::Validation(format!(
      "range start {start} is after range end {end}"
    )));
  }
  Ok(())
}

/// Body text of a journal entry written through the service.
pub fn entry_text(text: &str) -> Result<()> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation("entry text is empty".into()));
  }
  if trimmed.chars().count() < MIN_ENTRY_CHARS {
    return Err(Error::Validation(format!(
      "entry text must be at least {MIN_ENTRY_CHARS} characters"
    )));
  }
  if text.chars().count() > MAX_ENTRY_CHARS {
    return Err(Error::Validation(format!(
      "entry text must be at most {MAX_ENTRY_CHARS} characters"
    )));
  }
  Ok(())
}

/// An answer to a follow-up question.
pub fn answer(text: &str) -> Result<()> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation("answer is empty".into()));
  }
  if trimmed.chars().count() < MIN_ANSWER_CHARS {
    return Err(Error::Validation(format!(
      "answer must be at least {MIN_ANSWER_CHARS} characters"
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_iso_dates_only() {
    assert_eq!(
      parse_date("2025-01-15").unwrap(),
      NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    );
    assert!(matches!(parse_date("15/01/2025"), Err(Error::Validation(_))));
    assert!(matches!(parse_date("2025-02-30"), Err(Error::Validation(_))));
  }

  #[test]
  fn range_may_be_a_single_day() {
    let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    assert!(date_range(day, day).is_ok());
    assert!(date_range(day.succ_opt().unwrap(), day).is_err());
  }

  #[test]
  fn entry_text_bounds() {
    assert!(entry_text("   ").is_err());
    assert!(entry_text("too short").is_err());
    assert!(entry_text("Walked to the river after work.").is_ok());
    assert!(entry_text(&"a".repeat(MAX_ENTRY_CHARS + 1)).is_err());
  }

  #[test]
  fn entry_text_counts_characters_not_bytes() {
    // Ten multi-byte characters.
    assert!(entry_text("今日はとても良い一日だ").is_ok());
  }

  #[test]
  fn answer_bounds() {
    assert!(answer("").is_err());
    assert!(answer(" ok ").is_err());
    assert!(answer("It went fine").is_ok());
  }
}
