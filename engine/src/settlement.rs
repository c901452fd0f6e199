//! Round settlement.
//!
//! Pure function of (bets, outcome, post-debit balances): identical inputs
//! produce a bit-identical [`SettlementResult`]. Stakes were debited at
//! placement, so a win credits winnings only (`amount * odds`) and a loss
//! credits nothing; losing stakes are never re-debited.

use std::collections::HashMap;

use spindle_types::{
    column_group, dozen_group, Bet, BetKind, BetResolution, Outcome, PlayerId, PlayerSettlement,
    SettlementResult,
};

/// Whether a bet wins against the given outcome. Zero loses every outside
/// bet, including even and low.
pub fn bet_wins(bet: &Bet, outcome: &Outcome) -> bool {
    let n = outcome.winning_number;
    match bet.kind {
        BetKind::Straight
        | BetKind::Split
        | BetKind::Street
        | BetKind::Corner
        | BetKind::Line => bet.numbers.contains(&n),
        BetKind::Red => outcome.color == spindle_types::Color::Red,
        BetKind::Black => outcome.color == spindle_types::Color::Black,
        BetKind::Even => outcome.is_even,
        BetKind::Odd => n != 0 && !outcome.is_even,
        BetKind::Low => outcome.is_low,
        BetKind::High => n != 0 && !outcome.is_low,
        BetKind::Dozen => n != 0 && outcome.dozen == dozen_group(&bet.numbers),
        BetKind::Column => n != 0 && outcome.column == column_group(&bet.numbers),
    }
}

/// Settle every bet in a round against its outcome.
///
/// `balances` holds each player's post-debit balance at settlement time; the
/// per-player `new_balance` is that figure plus the player's winnings. Bets
/// resolve in admission order, players aggregate in order of first appearance.
pub fn settle(
    round_id: u64,
    bets: &[Bet],
    outcome: Outcome,
    balances: &HashMap<PlayerId, u64>,
) -> SettlementResult {
    if bets.is_empty() {
        return SettlementResult::empty(round_id, outcome);
    }

    let mut per_bet = Vec::with_capacity(bets.len());
    let mut player_order: Vec<PlayerId> = Vec::new();
    let mut wagered: HashMap<PlayerId, u64> = HashMap::new();
    let mut won: HashMap<PlayerId, u64> = HashMap::new();
    let mut total_wagered = 0u64;
    let mut total_won = 0u64;

    for bet in bets {
        let wins = bet_wins(bet, &outcome);
        let payout = if wins { bet.amount * bet.kind.odds() } else { 0 };
        per_bet.push(BetResolution {
            bet_id: bet.id,
            player: bet.player.clone(),
            won: wins,
            payout,
        });
        if !wagered.contains_key(&bet.player) {
            player_order.push(bet.player.clone());
        }
        *wagered.entry(bet.player.clone()).or_insert(0) += bet.amount;
        *won.entry(bet.player.clone()).or_insert(0) += payout;
        total_wagered += bet.amount;
        total_won += payout;
    }

    let per_player = player_order
        .into_iter()
        .map(|player| {
            let total_wagered = wagered[&player];
            let total_won = won[&player];
            let balance = balances.get(&player).copied().unwrap_or(0);
            PlayerSettlement {
                new_balance: balance + total_won,
                net_result: total_won as i64 - total_wagered as i64,
                total_wagered,
                total_won,
                player,
            }
        })
        .collect();

    SettlementResult {
        round_id,
        outcome,
        per_bet,
        per_player,
        total_wagered,
        total_won,
    }
}
