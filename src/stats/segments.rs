//! Per-bucket performance over the settled set: fixed odds bands,
//! officiating-context (referee) groups, and the UNDER/OVER split.
//! Low-volume buckets are still reported; confidence flagging is the
//! consumer's concern.

use crate::records::{Side, Wager, WagerStatus};
use std::collections::HashMap;

/// Fixed decimal-odd bands, half-open [lo, hi).
pub const ODDS_BANDS: [(f64, f64); 5] = [
    (1.00, 1.60),
    (1.60, 1.75),
    (1.75, 1.90),
    (1.90, 2.10),
    (2.10, f64::INFINITY),
];

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsBand {
    pub label: String,
    pub lo: f64,
    pub profit: f64,
    pub stake: f64,
    /// Percent; 0 for an empty band.
    pub roi: f64,
    pub win_rate: f64,
    pub avg_odd: f64,
    pub count: usize,
    pub wins: usize,
}

/// Partition settled wagers into the fixed odds bands.
pub fn odds_bands(wagers: &[Wager]) -> Vec<OddsBand> {
    ODDS_BANDS
        .iter()
        .map(|&(lo, hi)| {
            let in_band: Vec<&Wager> = wagers
                .iter()
                .filter(|w| w.is_settled() && w.odd >= lo && w.odd < hi)
                .collect();

            let profit: f64 = in_band.iter().map(|w| w.profit).sum();
            let stake: f64 = in_band.iter().map(|w| w.stake).sum();
            let wins = in_band.iter().filter(|w| w.status == WagerStatus::Won).count();
            let count = in_band.len();

            OddsBand {
                label: if hi.is_finite() {
                    format!("{lo:.2}-{hi:.2}")
                } else {
                    format!("{lo:.2}+")
                },
                lo,
                profit,
                stake,
                roi: if stake > 0.0 { profit / stake * 100.0 } else { 0.0 },
                win_rate: if count > 0 {
                    wins as f64 / count as f64 * 100.0
                } else {
                    0.0
                },
                avg_odd: if count > 0 {
                    in_band.iter().map(|w| w.odd).sum::<f64>() / count as f64
                } else {
                    0.0
                },
                count,
                wins,
            }
        })
        .collect()
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefereeSlice {
    pub referee: String,
    pub profit: f64,
    pub count: usize,
    pub wins: usize,
}

/// Group settled wagers by referee, sorted descending by profit. When
/// the number of groups exceeds `display_limit` per end, only the
/// top-N and bottom-N by profit are surfaced.
pub fn referee_breakdown(wagers: &[Wager], display_limit: usize) -> Vec<RefereeSlice> {
    let mut groups: HashMap<&str, RefereeSlice> = HashMap::new();
    for w in wagers.iter().filter(|w| w.is_settled()) {
        let entry = groups.entry(w.referee.as_str()).or_insert_with(|| RefereeSlice {
            referee: w.referee.clone(),
            profit: 0.0,
            count: 0,
            wins: 0,
        });
        entry.profit += w.profit;
        entry.count += 1;
        if w.status == WagerStatus::Won {
            entry.wins += 1;
        }
    }

    let mut slices: Vec<RefereeSlice> = groups.into_values().collect();
    slices.sort_by(|a, b| b.profit.total_cmp(&a.profit));

    if slices.len() > display_limit * 2 {
        let bottom = slices.split_off(slices.len() - display_limit);
        slices.truncate(display_limit);
        slices.extend(bottom);
    }
    slices
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideSplit {
    pub under_profit: f64,
    pub under_count: usize,
    pub over_profit: f64,
    pub over_count: usize,
}

pub fn side_split(wagers: &[Wager]) -> SideSplit {
    let mut split = SideSplit {
        under_profit: 0.0,
        under_count: 0,
        over_profit: 0.0,
        over_count: 0,
    };
    for w in wagers.iter().filter(|w| w.is_settled()) {
        match w.side {
            Side::Under => {
                split.under_profit += w.profit;
                split.under_count += 1;
            }
            Side::Over => {
                split.over_profit += w.profit;
                split.over_count += 1;
            }
        }
    }
    split
}
