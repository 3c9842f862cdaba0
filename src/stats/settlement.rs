//! Wager settlement: terminal status + realized profit from an
//! observed outcome. All operations are in-place mutations of a single
//! wager; collection-level policy (same-day rules, persistence) lives
//! in the session.

use crate::errors::{TrackerError, TrackerResult};
use crate::records::{Side, Wager, WagerStatus};

/// Realized profit for a wager under `status`.
#[inline]
pub fn profit_for(status: WagerStatus, stake: f64, odd: f64) -> f64 {
    match status {
        WagerStatus::Won => stake * (odd - 1.0),
        WagerStatus::Void => 0.0,
        WagerStatus::Lost | WagerStatus::Open => -stake,
    }
}

/// Settle an open wager against the observed outcome value.
///
/// UNDER: observed < line -> WON, == line -> VOID (push), > line -> LOST.
/// OVER is the mirror image. Re-settling a settled wager must go
/// through `reset_to_open` first.
pub fn settle(wager: &mut Wager, observed: f64) -> TrackerResult<()> {
    if !wager.is_open() {
        return Err(TrackerError::NotOpen(wager.id.clone()));
    }
    if !observed.is_finite() {
        return Err(TrackerError::InvalidValue(format!(
            "observed outcome must be numeric, got {observed}"
        )));
    }

    let status = if observed == wager.line {
        WagerStatus::Void
    } else {
        let won = match wager.side {
            Side::Under => observed < wager.line,
            Side::Over => observed > wager.line,
        };
        if won {
            WagerStatus::Won
        } else {
            WagerStatus::Lost
        }
    };

    wager.status = status;
    wager.observed = Some(observed);
    wager.profit = profit_for(status, wager.stake, wager.odd);
    Ok(())
}

/// Undo a settlement: clears the observed outcome and re-opens the
/// wager, putting its stake back at risk.
pub fn reset_to_open(wager: &mut Wager) {
    wager.status = WagerStatus::Open;
    wager.observed = None;
    wager.profit = -wager.stake;
}

/// Correct the priced odd. Silently no-ops (returns false) for odds
/// below 1.0 or non-finite input; otherwise recomputes profit under
/// the current status. Open wagers keep profit == -stake regardless.
pub fn reprice(wager: &mut Wager, new_odd: f64) -> bool {
    if !new_odd.is_finite() || new_odd < 1.0 {
        return false;
    }
    wager.odd = new_odd;
    wager.profit = profit_for(wager.status, wager.stake, wager.odd);
    true
}
