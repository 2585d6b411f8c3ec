//! Identity resolution for incoming entries.
//!
//! A caller may name an entry itself (and so overwrite an
//! existing one) or leave identity to the store. Both cases end up as a
//! persisted [`EntryKey`]; the tag records which one happened so the
//! caller-visible identity can be stored next to the key.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::EntryKey;

/// How an entry's persisted key came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum EntryIdentity {
  /// A fresh UUID minted by the store.
  Generated(EntryKey),
  /// The caller's identity, used verbatim as the key.
  CallerSupplied(EntryKey),
}

impl EntryIdentity {
  pub fn key(&self) -> &EntryKey {
    match self {
      Self::Generated(key) | Self::CallerSupplied(key) => key,
    }
  }

  pub fn into_key(self) -> EntryKey {
    match self {
      Self::Generated(key) | Self::CallerSupplied(key) => key,
    }
  }

  /// The value for the `original_id` column: only caller-supplied
  /// identities are recorded.
  pub fn original_id(&self) -> Option<&str> {
    match self {
      Self::Generated(_) => None,
      Self::CallerSupplied(key) => Some(key.as_str()),
    }
  }
}

/// Decide the persisted key for an entry. Never fails and performs no I/O.
///
/// A non-blank candidate is used verbatim; otherwise a v4 UUID is generated.
pub fn resolve(candidate: Option<&str>) -> EntryIdentity {
  match candidate {
    Some(id) if !id.trim().is_empty() => {
      EntryIdentity::CallerSupplied(EntryKey::new(id))
    }
    _ => EntryIdentity::Generated(generate_key()),
  }
}

/// Mint a new globally unique key. Also used for child row keys.
pub fn generate_key() -> EntryKey {
  EntryKey::new(Uuid::new_v4().hyphenated().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn caller_identity_is_used_verbatim() {
    let identity = resolve(Some("entry_20250101"));
    assert_eq!(
      identity,
      EntryIdentity::CallerSupplied(EntryKey::new("entry_20250101"))
    );
    assert_eq!(identity.original_id(), Some("entry_20250101"));
  }

  #[test]
  fn missing_identity_is_generated() {
    let identity = resolve(None);
    assert!(matches!(identity, EntryIdentity::Generated(_)));
    assert!(identity.original_id().is_none());
    assert!(Uuid::parse_str(identity.key().as_str()).is_ok());
  }

  #[test]
  fn blank_identity_counts_as_missing() {
    assert!(matches!(resolve(Some("")), EntryIdentity::Generated(_)));
    assert!(matches!(resolve(Some("   ")), EntryIdentity::Generated(_)));
  }

  #[test]
  fn generated_keys_differ() {
    assert_ne!(resolve(None).into_key(), resolve(None).into_key());
  }
}
