//! Entrant registration: one local user plus 7 verified remote slots.
//!
//! Verification is split in two phases so the user lookup can run without
//! holding the registry: `begin_verify` validates the typed username and
//! hands out a ticket, `complete_verify` applies the lookup result only if
//! the slot has not been verified, re-verified, or reset in the meantime.

use crate::lookup::LookupError;
use crate::models::{Player, SetupView, SlotView, TournamentError};

/// Entrants in one tournament: the local user plus [`REMOTE_SLOTS`] others.
pub const TOURNAMENT_SIZE: usize = 8;
/// Slots 2..=8 are filled by lookup; slot 1 is always the local user.
pub const REMOTE_SLOTS: usize = TOURNAMENT_SIZE - 1;

const FIRST_REMOTE_SLOT: usize = 2;

#[derive(Clone, Debug, Default)]
struct RemoteSlot {
    /// Username as typed, present while a verification is pending or done.
    entered: Option<String>,
    /// The resolved player once verified. Immutable until a reset.
    verified: Option<Player>,
    /// Bumped on every begin_verify and reset; stale tickets never apply.
    epoch: u64,
}

/// Handle for one in-flight verification, returned by [`PlayerRegistry::begin_verify`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VerifyTicket {
    slot: usize,
    epoch: u64,
}

/// What applying a lookup result did to the slot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VerifyOutcome {
    /// The slot now holds this verified player.
    Verified(Player),
    /// The ticket was superseded (slot re-verified, already verified, or
    /// reset); the lookup result was discarded and nothing changed.
    Stale,
}

/// Collects and validates the 8 entrants of one tournament.
#[derive(Clone, Debug)]
pub struct PlayerRegistry {
    local: Player,
    slots: Vec<RemoteSlot>,
}

impl PlayerRegistry {
    /// Registry for a tournament hosted by `local`, who fills slot 1 and
    /// needs no verification.
    pub fn new(local: Player) -> Self {
        Self {
            local: local.verified(),
            slots: vec![RemoteSlot::default(); REMOTE_SLOTS],
        }
    }

    /// The local user hosting the tournament.
    pub fn local(&self) -> &Player {
        &self.local
    }

    /// Validate the typed username for a slot and open a verification.
    ///
    /// Checks, in order: empty username, the local user's own username,
    /// a username already entered in another slot. An already-verified slot
    /// is left untouched; the returned ticket is stale by construction.
    pub fn begin_verify(
        &mut self,
        slot: usize,
        username: &str,
    ) -> Result<VerifyTicket, TournamentError> {
        let idx = Self::slot_offset(slot)?;
        let username = username.trim();
        if username.is_empty() {
            return Err(TournamentError::EmptyUsername);
        }
        if username.eq_ignore_ascii_case(&self.local.username) {
            return Err(TournamentError::SelfEntry);
        }
        let duplicate = self.slots.iter().enumerate().any(|(i, s)| {
            i != idx
                && s.entered
                    .as_deref()
                    .is_some_and(|entered| entered.eq_ignore_ascii_case(username))
        });
        if duplicate {
            return Err(TournamentError::DuplicateEntry);
        }
        if self.slots[idx].verified.is_some() {
            // Immutable until reset; hand back the current epoch so the
            // completion lands in the stale path.
            return Ok(VerifyTicket {
                slot,
                epoch: self.slots[idx].epoch,
            });
        }
        self.slots[idx].epoch += 1;
        self.slots[idx].entered = Some(username.to_string());
        Ok(VerifyTicket {
            slot,
            epoch: self.slots[idx].epoch,
        })
    }

    /// Apply the result of the lookup opened by `ticket`.
    ///
    /// A ticket that no longer matches the slot's epoch, or whose slot is
    /// already verified, reports [`VerifyOutcome::Stale`] and changes
    /// nothing. Failed lookups clear the slot so the user can retry.
    pub fn complete_verify(
        &mut self,
        ticket: VerifyTicket,
        looked_up: Result<Player, LookupError>,
    ) -> Result<VerifyOutcome, TournamentError> {
        let idx = Self::slot_offset(ticket.slot)?;
        if self.slots[idx].verified.is_some() || self.slots[idx].epoch != ticket.epoch {
            log::debug!("discarding stale verification result for slot {}", ticket.slot);
            return Ok(VerifyOutcome::Stale);
        }
        let player = match looked_up {
            Ok(player) => player,
            Err(LookupError::NotFound) => {
                self.slots[idx].entered = None;
                return Err(TournamentError::PlayerNotFound);
            }
            Err(LookupError::Connection(reason)) => {
                log::warn!("user lookup for slot {} failed: {}", ticket.slot, reason);
                self.slots[idx].entered = None;
                return Err(TournamentError::LookupFailed);
            }
        };
        // Usernames were checked at begin time, but two different usernames
        // can still resolve to one account; entrant ids must stay distinct.
        let id_taken = player.id == self.local.id
            || self.slots.iter().enumerate().any(|(i, s)| {
                i != idx && s.verified.as_ref().is_some_and(|p| p.id == player.id)
            });
        if id_taken {
            self.slots[idx].entered = None;
            return Err(TournamentError::DuplicatePlayer(player.id));
        }
        let player = player.verified();
        self.slots[idx].verified = Some(player.clone());
        Ok(VerifyOutcome::Verified(player))
    }

    /// True once every remote slot is verified (7 of 7; the local user is
    /// implicitly the 8th entrant).
    pub fn all_verified(&self) -> bool {
        self.slots.iter().all(|s| s.verified.is_some())
    }

    /// The 8 entrants, local user first, then slots 2..=8 in order.
    pub fn entrants(&self) -> Result<Vec<Player>, TournamentError> {
        if !self.all_verified() {
            return Err(TournamentError::NotAllVerified);
        }
        let mut players = Vec::with_capacity(TOURNAMENT_SIZE);
        players.push(self.local.clone());
        players.extend(self.slots.iter().filter_map(|s| s.verified.clone()));
        Ok(players)
    }

    /// Clear every remote slot (back to the main menu). In-flight
    /// verifications become stale.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.entered = None;
            slot.verified = None;
            slot.epoch += 1;
        }
    }

    /// The setup screen's projection of this registry.
    pub fn setup_view(&self) -> SetupView {
        SetupView {
            local: self.local.clone(),
            slots: self
                .slots
                .iter()
                .enumerate()
                .map(|(i, s)| SlotView {
                    slot: i + FIRST_REMOTE_SLOT,
                    entered: s.entered.clone(),
                    player: s.verified.clone(),
                })
                .collect(),
            all_verified: self.all_verified(),
        }
    }

    fn slot_offset(slot: usize) -> Result<usize, TournamentError> {
        if (FIRST_REMOTE_SLOT..=TOURNAMENT_SIZE).contains(&slot) {
            Ok(slot - FIRST_REMOTE_SLOT)
        } else {
            Err(TournamentError::SlotOutOfRange(slot))
        }
    }
}
