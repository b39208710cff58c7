//! Identity: the opaque, address-like key every caller acts under.
//!
//! The core never authenticates an identity; it is supplied by whatever
//! runtime sits in front of the registry. It only checks that the key is
//! well-formed so it can be stored and encoded unambiguously.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest identity accepted, in bytes.
pub const MAX_IDENTITY_LEN: usize = 128;

/// Prefix reserved for system accounts in the ledger.
pub const RESERVED_PREFIX: char = '@';

/// A validated caller identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
  /// Validate and wrap `raw`.
  ///
  /// Rejects empty keys, keys longer than [`MAX_IDENTITY_LEN`], keys with
  /// whitespace or the legacy delimiters `;` and `|`, and keys starting with
  /// [`RESERVED_PREFIX`].
  pub fn parse(raw: impl Into<String>) -> Result<Self> {
    let raw = raw.into();
    let well_formed = !raw.is_empty()
      && raw.len() <= MAX_IDENTITY_LEN
      && !raw.starts_with(RESERVED_PREFIX)
      && !raw.chars().any(|c| c.is_whitespace() || c == ';' || c == '|');

    if well_formed {
      Ok(Self(raw))
    } else {
      Err(Error::InvalidIdentity(raw))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl FromStr for Identity {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for Identity {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(value) }
}

impl From<Identity> for String {
  fn from(id: Identity) -> Self { id.0 }
}
