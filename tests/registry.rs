//! Integration tests for entrant verification: slot checks, lookup
//! completion, and the stale-response guard.

use pong_tournament_web::{
    LookupError, Player, PlayerRegistry, TournamentError, UserDirectory, UserLookup, VerifyOutcome,
};

const USERS_CSV: &str = "\
id,username,display_name
1,mrossi,Marco
2,lbianchi,Lucia
3,gverdi,Giulia
4,afontana,Andrea
5,schiara,Chiara
6,dmoretti,Davide
7,fgalli,Francesca
8,tricci,Tommaso
9,evitale,Elena
";

fn directory() -> UserDirectory {
    UserDirectory::from_reader(USERS_CSV.as_bytes()).unwrap()
}

fn registry() -> PlayerRegistry {
    PlayerRegistry::new(Player::new(1, "mrossi", "Marco"))
}

/// Run both verification phases against the directory.
fn verify(reg: &mut PlayerRegistry, slot: usize, username: &str) -> Player {
    let dir = directory();
    let ticket = reg.begin_verify(slot, username).unwrap();
    match reg
        .complete_verify(ticket, dir.lookup_by_username(username))
        .unwrap()
    {
        VerifyOutcome::Verified(p) => p,
        VerifyOutcome::Stale => panic!("verification of {username} was unexpectedly stale"),
    }
}

#[test]
fn empty_username_is_rejected() {
    let mut reg = registry();
    assert!(matches!(
        reg.begin_verify(2, "   "),
        Err(TournamentError::EmptyUsername)
    ));
}

#[test]
fn own_username_is_rejected_case_insensitively() {
    let mut reg = registry();
    assert!(matches!(
        reg.begin_verify(2, "MRossi"),
        Err(TournamentError::SelfEntry)
    ));
}

#[test]
fn username_entered_in_another_slot_is_rejected() {
    let mut reg = registry();
    reg.begin_verify(2, "lbianchi").unwrap();
    assert!(matches!(
        reg.begin_verify(3, "LBIANCHI"),
        Err(TournamentError::DuplicateEntry)
    ));
}

#[test]
fn username_verified_in_another_slot_is_rejected() {
    let mut reg = registry();
    verify(&mut reg, 2, "lbianchi");
    assert!(matches!(
        reg.begin_verify(3, "lbianchi"),
        Err(TournamentError::DuplicateEntry)
    ));
}

#[test]
fn slot_out_of_range_is_rejected() {
    let mut reg = registry();
    assert!(matches!(
        reg.begin_verify(1, "lbianchi"),
        Err(TournamentError::SlotOutOfRange(1))
    ));
    assert!(matches!(
        reg.begin_verify(9, "lbianchi"),
        Err(TournamentError::SlotOutOfRange(9))
    ));
}

#[test]
fn seven_verified_slots_complete_the_field() {
    let mut reg = registry();
    let usernames = [
        "lbianchi", "gverdi", "afontana", "schiara", "dmoretti", "fgalli", "tricci",
    ];
    for (i, username) in usernames.iter().enumerate() {
        assert!(!reg.all_verified());
        assert!(matches!(
            reg.entrants(),
            Err(TournamentError::NotAllVerified)
        ));
        let p = verify(&mut reg, i + 2, username);
        assert!(p.verified);
    }
    assert!(reg.all_verified());

    let entrants = reg.entrants().unwrap();
    assert_eq!(entrants.len(), 8);
    // Local user first, then slots 2..=8 in order.
    assert_eq!(entrants[0].id, 1);
    let ids: Vec<i64> = entrants.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert!(entrants.iter().all(|p| p.verified));
}

#[test]
fn unknown_username_clears_the_slot_for_retry() {
    let mut reg = registry();
    let dir = directory();
    let ticket = reg.begin_verify(2, "ghost").unwrap();
    assert!(matches!(
        reg.complete_verify(ticket, dir.lookup_by_username("ghost")),
        Err(TournamentError::PlayerNotFound)
    ));
    let view = reg.setup_view();
    assert!(view.slots[0].entered.is_none());
    assert!(view.slots[0].player.is_none());
    // The same slot can be retried with a corrected name.
    verify(&mut reg, 2, "lbianchi");
}

#[test]
fn connection_failure_clears_the_slot() {
    let mut reg = registry();
    let ticket = reg.begin_verify(2, "lbianchi").unwrap();
    assert!(matches!(
        reg.complete_verify(ticket, Err(LookupError::Connection("timeout".into()))),
        Err(TournamentError::LookupFailed)
    ));
    assert!(reg.setup_view().slots[0].entered.is_none());
}

#[test]
fn completion_after_reset_is_stale() {
    let mut reg = registry();
    let dir = directory();
    let ticket = reg.begin_verify(2, "lbianchi").unwrap();
    reg.reset();
    let outcome = reg
        .complete_verify(ticket, dir.lookup_by_username("lbianchi"))
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Stale);
    assert!(!reg.all_verified());
    assert!(reg.setup_view().slots[0].player.is_none());
}

#[test]
fn only_the_latest_verification_of_a_slot_lands() {
    let mut reg = registry();
    let dir = directory();
    let first = reg.begin_verify(2, "lbianchi").unwrap();
    let second = reg.begin_verify(2, "gverdi").unwrap();

    // The superseded lookup returns first; it must not touch the slot.
    let outcome = reg
        .complete_verify(first, dir.lookup_by_username("lbianchi"))
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Stale);

    match reg
        .complete_verify(second, dir.lookup_by_username("gverdi"))
        .unwrap()
    {
        VerifyOutcome::Verified(p) => assert_eq!(p.username, "gverdi"),
        VerifyOutcome::Stale => panic!("latest verification must land"),
    }
}

#[test]
fn verified_slot_is_immutable_until_reset() {
    let mut reg = registry();
    let dir = directory();
    verify(&mut reg, 2, "lbianchi");

    let ticket = reg.begin_verify(2, "gverdi").unwrap();
    let outcome = reg
        .complete_verify(ticket, dir.lookup_by_username("gverdi"))
        .unwrap();
    assert_eq!(outcome, VerifyOutcome::Stale);

    let view = reg.setup_view();
    assert_eq!(view.slots[0].player.as_ref().unwrap().username, "lbianchi");

    reg.reset();
    verify(&mut reg, 2, "gverdi");
}

#[test]
fn two_usernames_resolving_to_one_account_are_rejected() {
    let mut reg = registry();
    verify(&mut reg, 2, "lbianchi");

    // A second username that the backend maps to the same account id.
    let ticket = reg.begin_verify(3, "lucia-alt").unwrap();
    assert!(matches!(
        reg.complete_verify(ticket, Ok(Player::new(2, "lucia-alt", "Lucia"))),
        Err(TournamentError::DuplicatePlayer(2))
    ));
    assert!(reg.setup_view().slots[1].entered.is_none());
}

#[test]
fn alias_of_the_local_user_is_rejected() {
    let mut reg = registry();
    let ticket = reg.begin_verify(2, "marco-alt").unwrap();
    assert!(matches!(
        reg.complete_verify(ticket, Ok(Player::new(1, "marco-alt", "Marco"))),
        Err(TournamentError::DuplicatePlayer(1))
    ));
}
