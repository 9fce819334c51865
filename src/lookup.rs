//! User lookup: the seam between the tournament and the account backend.
//!
//! The tournament only ever asks "who is this username?"; where the answer
//! comes from is this module's business. The shipped implementation is a
//! CSV-seeded in-memory directory.

use crate::models::{Player, PlayerId};
use serde::Deserialize;
use std::io;
use std::path::Path;

/// Why a lookup produced no player.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LookupError {
    /// No user with that username exists.
    NotFound,
    /// The backend could not be reached or answered garbage.
    Connection(String),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::NotFound => write!(f, "user not found"),
            LookupError::Connection(reason) => write!(f, "lookup failed: {}", reason),
        }
    }
}

impl std::error::Error for LookupError {}

/// Resolves usernames to players.
pub trait UserLookup {
    fn lookup_by_username(&self, username: &str) -> Result<Player, LookupError>;
}

/// One row of the directory seed file.
#[derive(Clone, Debug, Deserialize)]
struct DirectoryUser {
    id: PlayerId,
    username: String,
    /// Optional; falls back to the username when blank.
    #[serde(default)]
    display_name: String,
}

impl DirectoryUser {
    fn to_player(&self) -> Player {
        let display_name = if self.display_name.trim().is_empty() {
            self.username.clone()
        } else {
            self.display_name.clone()
        };
        Player::new(self.id, self.username.clone(), display_name)
    }
}

/// In-memory user directory seeded from a `id,username,display_name` CSV.
///
/// Stands in for the account backend; usernames resolve case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct UserDirectory {
    users: Vec<DirectoryUser>,
}

impl UserDirectory {
    /// Load the directory from a CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let reader = csv::Reader::from_path(path)?;
        Self::collect(reader)
    }

    /// Load the directory from any CSV reader (used by tests).
    pub fn from_reader(rdr: impl io::Read) -> Result<Self, csv::Error> {
        Self::collect(csv::Reader::from_reader(rdr))
    }

    fn collect<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, csv::Error> {
        let mut users = Vec::new();
        for row in reader.deserialize() {
            users.push(row?);
        }
        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Resolve a user by id (login sessions store ids, not names).
    pub fn lookup_by_id(&self, id: PlayerId) -> Option<Player> {
        self.users.iter().find(|u| u.id == id).map(|u| u.to_player())
    }
}

impl UserLookup for UserDirectory {
    fn lookup_by_username(&self, username: &str) -> Result<Player, LookupError> {
        self.users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .map(|u| u.to_player())
            .ok_or(LookupError::NotFound)
    }
}
