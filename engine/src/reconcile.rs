//! Client display reconciliation.
//!
//! Clients may run a local spin animation and show a preview result before the
//! authoritative settlement arrives. The server result always wins: any
//! preview that disagrees is replaced wholesale, and totals shown to the
//! player are taken from the server result alone. The preview never feeds back
//! into balances.

use spindle_types::{Outcome, SettlementResult};

/// What the client should display for the player right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayState {
    /// Settlement not yet received; an optional locally-animated preview may
    /// be on screen.
    Calculating { preview: Option<Outcome> },
    /// Authoritative result, ready to render.
    Final {
        outcome: Outcome,
        total_wagered: u64,
        total_won: u64,
        net_result: i64,
        new_balance: u64,
        /// True when a preview was showing a different outcome and has been
        /// replaced.
        preview_overridden: bool,
    },
}

/// Display state while the spin is still in flight.
pub fn calculating(preview: Option<Outcome>) -> DisplayState {
    DisplayState::Calculating { preview }
}

/// Fold the authoritative settlement into the display for one player.
///
/// `current_balance` is the player's last known balance, used only when the
/// player had no bets in the round and thus no per-player entry.
pub fn reconcile(
    preview: Option<Outcome>,
    server: &SettlementResult,
    player: &str,
    current_balance: u64,
) -> DisplayState {
    let preview_overridden = preview.is_some_and(|p| p != server.outcome);
    match server.for_player(player) {
        Some(mine) => DisplayState::Final {
            outcome: server.outcome,
            total_wagered: mine.total_wagered,
            total_won: mine.total_won,
            net_result: mine.net_result,
            new_balance: mine.new_balance,
            preview_overridden,
        },
        None => DisplayState::Final {
            outcome: server.outcome,
            total_wagered: 0,
            total_won: 0,
            net_result: 0,
            new_balance: current_balance,
            preview_overridden,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_types::PlayerSettlement;

    fn server_result(winning: u8) -> SettlementResult {
        let mut result = SettlementResult::empty(3, Outcome::of(winning).unwrap());
        result.total_wagered = 15;
        result.total_won = 355;
        result.per_player.push(PlayerSettlement {
            player: "alice".to_string(),
            total_wagered: 15,
            total_won: 355,
            net_result: 340,
            new_balance: 440,
        });
        result
    }

    #[test]
    fn server_result_overrides_a_conflicting_preview() {
        let preview = Outcome::of(22).unwrap();
        let state = reconcile(Some(preview), &server_result(7), "alice", 85);
        match state {
            DisplayState::Final {
                outcome,
                new_balance,
                preview_overridden,
                ..
            } => {
                assert_eq!(outcome.winning_number, 7);
                assert_eq!(new_balance, 440);
                assert!(preview_overridden);
            }
            DisplayState::Calculating { .. } => panic!("expected a final state"),
        }
    }

    #[test]
    fn matching_preview_is_not_flagged() {
        let preview = Outcome::of(7).unwrap();
        let state = reconcile(Some(preview), &server_result(7), "alice", 85);
        assert!(matches!(
            state,
            DisplayState::Final { preview_overridden: false, .. }
        ));
    }

    #[test]
    fn totals_come_from_the_server_alone() {
        let state = reconcile(None, &server_result(7), "alice", 1);
        assert!(matches!(
            state,
            DisplayState::Final {
                total_wagered: 15,
                total_won: 355,
                net_result: 340,
                new_balance: 440,
                ..
            }
        ));
    }

    #[test]
    fn spectator_keeps_their_balance() {
        let state = reconcile(None, &server_result(7), "bob", 120);
        assert!(matches!(
            state,
            DisplayState::Final {
                total_wagered: 0,
                new_balance: 120,
                ..
            }
        ));
    }

    #[test]
    fn calculating_carries_the_preview() {
        let preview = Outcome::of(11).unwrap();
        assert_eq!(
            calculating(Some(preview)),
            DisplayState::Calculating { preview: Some(preview) }
        );
    }
}
