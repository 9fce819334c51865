//! Player data structure.

use serde::{Deserialize, Serialize};

/// Unique identifier for a player. Assigned by the account backend, never by us.
pub type PlayerId = i64;

/// A tournament entrant, resolved against the user directory.
///
/// The display name is resolved once at verification time and cached here.
/// Two players are the same player iff their ids are equal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub display_name: String,
    pub verified: bool,
}

impl Player {
    /// Create an unverified player with a resolved identity.
    pub fn new(id: PlayerId, username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            display_name: display_name.into(),
            verified: false,
        }
    }

    /// Same player, marked verified (used when a slot caches a lookup result).
    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }
}
