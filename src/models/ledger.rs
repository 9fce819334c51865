//! Cumulative per-player win/loss counters, independent of bracket position.

use crate::models::player::{Player, PlayerId};
use serde::{Deserialize, Serialize};

/// Totals for one player across the tournament session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub player_id: PlayerId,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
}

impl LedgerEntry {
    fn zeroed(player_id: PlayerId) -> Self {
        Self {
            player_id,
            ..Self::default()
        }
    }
}

/// Monotonic stat ledger for one tournament. Entries are kept in insertion
/// order of first appearance and are never decremented or removed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultsLedger {
    entries: Vec<LedgerEntry>,
}

impl ResultsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with a zeroed entry per entrant, in seeding order.
    pub fn seeded(players: &[Player]) -> Self {
        Self {
            entries: players.iter().map(|p| LedgerEntry::zeroed(p.id)).collect(),
        }
    }

    /// Count one played match for a player: a win or a loss.
    ///
    /// No membership check: an id the ledger has never seen gets a fresh
    /// zeroed entry first, then the increment.
    pub fn record(&mut self, player_id: PlayerId, won: bool) {
        let entry = self.entry_mut(player_id);
        entry.matches_played += 1;
        if won {
            entry.wins += 1;
        } else {
            entry.losses += 1;
        }
    }

    /// Entries for display, in insertion order of first appearance.
    pub fn snapshot(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.player_id == player_id)
    }

    fn entry_mut(&mut self, player_id: PlayerId) -> &mut LedgerEntry {
        if let Some(idx) = self.entries.iter().position(|e| e.player_id == player_id) {
            return &mut self.entries[idx];
        }
        self.entries.push(LedgerEntry::zeroed(player_id));
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }
}
