//! Member: a registered identity permitted to own and lend books.
//!
//! Members are never deleted. Removal only flips the status, so a removed
//! identity stays distinguishable from one that was never registered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::identity::Identity;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MemberStatus {
  #[default]
  Active,
  Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub identity:      Identity,
  pub name:          String,
  pub status:        MemberStatus,
  /// Set once when the member is first added; never changes.
  pub registered_at: DateTime<Utc>,
}

impl Member {
  /// A freshly registered, active member.
  pub fn new(identity: Identity, name: impl Into<String>, registered_at: DateTime<Utc>) -> Self {
    Self { identity, name: name.into(), status: MemberStatus::Active, registered_at }
  }

  pub fn is_active(&self) -> bool { self.status == MemberStatus::Active }
}
