//! Bankroll arithmetic. A wager's stake leaves the bankroll at
//! placement time; the gross payout (not net profit) comes back only
//! on WON or VOID. LOST wagers keep the stake deducted with no credit,
//! which nets out to -stake without double counting.

use crate::records::{CashMovement, Wager};
use chrono::{DateTime, Duration, Local, NaiveTime, Utc};

/// Positive skew on the "current" cutoff so same-instant placements
/// are included. Any positive epsilon works if applied consistently.
pub const CURRENT_BALANCE_SKEW: Duration = Duration::seconds(10);

/// Net balance considering everything strictly before `cutoff`.
pub fn balance_as_of(
    movements: &[CashMovement],
    wagers: &[Wager],
    cutoff: DateTime<Utc>,
) -> f64 {
    let tx_balance: f64 = movements
        .iter()
        .filter(|t| t.timestamp < cutoff)
        .map(|t| t.signed_amount())
        .sum();

    let relevant = wagers.iter().filter(|w| w.placed_at < cutoff);
    let (stakes, payouts) = relevant.fold((0.0, 0.0), |(s, p), w| (s + w.stake, p + w.payout()));

    tx_balance - stakes + payouts
}

/// Current balance (cutoff = now + skew).
pub fn current_balance(movements: &[CashMovement], wagers: &[Wager], now: DateTime<Utc>) -> f64 {
    balance_as_of(movements, wagers, now + CURRENT_BALANCE_SKEW)
}

/// Midnight local time of `now`'s day, as a UTC instant.
pub fn start_of_today(now: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = now
        .with_timezone(&Local)
        .date_naive()
        .and_time(NaiveTime::MIN);
    match midnight.and_local_timezone(Local) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
            dt.with_timezone(&Utc)
        }
        // Midnight skipped by a DST jump; fall back to the raw instant.
        chrono::LocalResult::None => now,
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankrollSnapshot {
    pub balance: f64,
    /// Balance as of the start of the current local day.
    pub previous_balance: f64,
    /// Today's delta (balance - previous_balance).
    pub delta: f64,
    /// Delta as percent of the previous balance; 0 when previous is 0.
    pub delta_pct: f64,
    /// Total stake currently at risk in open wagers.
    pub open_stake: f64,
}

/// Current vs start-of-day view used for the trend card.
pub fn snapshot(movements: &[CashMovement], wagers: &[Wager], now: DateTime<Utc>) -> BankrollSnapshot {
    let balance = current_balance(movements, wagers, now);
    let previous_balance = balance_as_of(movements, wagers, start_of_today(now));
    let delta = balance - previous_balance;
    let delta_pct = if previous_balance != 0.0 {
        delta / previous_balance * 100.0
    } else {
        0.0
    };
    let open_stake = wagers.iter().filter(|w| w.is_open()).map(|w| w.stake).sum();

    BankrollSnapshot {
        balance,
        previous_balance,
        delta,
        delta_pct,
        open_stake,
    }
}
