//! Aggregate performance metrics over a caller-supplied wager slice.
//! All functions are pure -- they take records and return computed
//! values. Only settled (risk-resolved) wagers count toward ratios;
//! VOID stays in the denominator and contributes zero profit.

use crate::records::{Wager, WagerStatus};
use chrono::{DateTime, NaiveDate, Utc};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Trailing window for the rolling volatility of daily profit.
pub const VOLATILITY_WINDOW: usize = 5;

/// Optional slice filters (date range, minimum edge/stake).
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_edge: Option<f64>,
    pub min_stake: Option<f64>,
}

impl StatsFilter {
    pub fn apply(&self, wagers: &[Wager]) -> Vec<Wager> {
        wagers
            .iter()
            .filter(|w| self.from.map_or(true, |f| w.placed_at >= f))
            .filter(|w| self.to.map_or(true, |t| w.placed_at < t))
            .filter(|w| self.min_edge.map_or(true, |e| w.edge >= e))
            .filter(|w| self.min_stake.map_or(true, |s| w.stake >= s))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_profit: f64,
    pub total_stakes: f64,
    pub wins: usize,
    pub settled_count: usize,
    /// Percent; 0 when nothing is settled (never NaN).
    pub win_rate: f64,
    /// Percent; 0 when no stakes are settled.
    pub roi: f64,
    pub open_count: usize,
    pub open_stake: f64,
}

pub fn compute_kpis(wagers: &[Wager]) -> Kpis {
    let settled: Vec<&Wager> = wagers.iter().filter(|w| w.is_settled()).collect();
    let total_profit: f64 = settled.iter().map(|w| w.profit).sum();
    let total_stakes: f64 = settled.iter().map(|w| w.stake).sum();
    let wins = settled.iter().filter(|w| w.status == WagerStatus::Won).count();

    let win_rate = if settled.is_empty() {
        0.0
    } else {
        wins as f64 / settled.len() as f64 * 100.0
    };
    let roi = if total_stakes > 0.0 {
        total_profit / total_stakes * 100.0
    } else {
        0.0
    };

    let open: Vec<&Wager> = wagers.iter().filter(|w| w.is_open()).collect();

    Kpis {
        total_profit,
        total_stakes,
        wins,
        settled_count: settled.len(),
        win_rate,
        roi,
        open_count: open.len(),
        open_stake: open.iter().map(|w| w.stake).sum(),
    }
}

/// One step of the per-bet cumulative profit curve.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativePoint {
    pub timestamp: DateTime<Utc>,
    pub profit: f64,
    pub cumulative: f64,
    pub peak: f64,
    /// peak - cumulative, always >= 0.
    pub drawdown: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeSeries {
    pub points: Vec<CumulativePoint>,
    pub max_drawdown: f64,
}

/// Chronological cumulative profit with running peak and drawdown,
/// one point per settled wager.
pub fn cumulative_series(wagers: &[Wager]) -> CumulativeSeries {
    let mut settled: Vec<&Wager> = wagers.iter().filter(|w| w.is_settled()).collect();
    settled.sort_by_key(|w| w.placed_at);

    let mut points = Vec::with_capacity(settled.len());
    let mut cumulative = 0.0;
    let mut peak = 0.0_f64;
    let mut max_drawdown = 0.0_f64;

    for w in settled {
        cumulative += w.profit;
        peak = peak.max(cumulative);
        let drawdown = peak - cumulative;
        max_drawdown = max_drawdown.max(drawdown);
        points.push(CumulativePoint {
            timestamp: w.placed_at,
            profit: w.profit,
            cumulative,
            peak,
            drawdown,
        });
    }

    CumulativeSeries { points, max_drawdown }
}

/// One calendar day of settled activity. Cumulative/peak/drawdown here
/// are recomputed over the daily aggregation -- a different series from
/// the per-bet one, and deliberately so.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub profit: f64,
    pub count: usize,
    pub wins: usize,
    pub cumulative: f64,
    pub peak: f64,
    pub drawdown: f64,
}

pub fn daily_series(wagers: &[Wager]) -> Vec<DailyPoint> {
    let mut days: BTreeMap<NaiveDate, (f64, usize, usize)> = BTreeMap::new();
    for w in wagers.iter().filter(|w| w.is_settled()) {
        let entry = days.entry(w.placed_at.date_naive()).or_insert((0.0, 0, 0));
        entry.0 += w.profit;
        entry.1 += 1;
        if w.status == WagerStatus::Won {
            entry.2 += 1;
        }
    }

    let mut cumulative = 0.0;
    let mut peak = 0.0_f64;
    days.into_iter()
        .map(|(date, (profit, count, wins))| {
            cumulative += profit;
            peak = peak.max(cumulative);
            DailyPoint {
                date,
                profit,
                count,
                wins,
                cumulative,
                peak,
                drawdown: peak - cumulative,
            }
        })
        .collect()
}

/// Model-vs-market pricing accuracy over wagers where the prediction,
/// the bookmaker line and the observed outcome are all present.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    /// Mean absolute error of the model prediction vs observed.
    pub model_mae: f64,
    /// Mean absolute error of the bookmaker line vs observed.
    pub line_mae: f64,
    /// line_mae / model_mae; above 1 means the model priced closer
    /// than the book. 0 when model_mae is 0.
    pub efficiency: f64,
    pub sample_count: usize,
    /// Mean claimed edge over the settled set.
    pub avg_edge: f64,
    /// Realized ROI per point of claimed edge; 0 when edge is 0.
    pub clv: f64,
}

pub fn accuracy_report(wagers: &[Wager]) -> AccuracyReport {
    let mut model_err = 0.0;
    let mut line_err = 0.0;
    let mut n = 0usize;
    for w in wagers {
        if let Some(observed) = w.observed {
            model_err += (w.prediction - observed).abs();
            line_err += (w.line - observed).abs();
            n += 1;
        }
    }
    let model_mae = if n > 0 { model_err / n as f64 } else { 0.0 };
    let line_mae = if n > 0 { line_err / n as f64 } else { 0.0 };
    let efficiency = if model_mae > 0.0 { line_mae / model_mae } else { 0.0 };

    let settled: Vec<&Wager> = wagers.iter().filter(|w| w.is_settled()).collect();
    let avg_edge = if settled.is_empty() {
        0.0
    } else {
        settled.iter().map(|w| w.edge).sum::<f64>() / settled.len() as f64
    };
    let roi = compute_kpis(wagers).roi;
    let clv = if avg_edge != 0.0 { roi / avg_edge } else { 0.0 };

    AccuracyReport {
        model_mae,
        line_mae,
        efficiency,
        sample_count: n,
        avg_edge,
        clv,
    }
}

/// Rolling sample std-dev of daily profit. Each point's trailing
/// window is clipped at the start of the series; windows shorter than
/// two days report 0.
pub fn rolling_volatility(daily: &[DailyPoint], window: usize) -> Vec<f64> {
    (0..daily.len())
        .map(|i| {
            let start = i.saturating_sub(window.saturating_sub(1));
            let slice: Vec<f64> = daily[start..=i].iter().map(|d| d.profit).collect();
            if slice.len() < 2 {
                0.0
            } else {
                slice.iter().std_dev()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CandidateMatch, Side};
    use crate::stats::settlement;
    use chrono::TimeZone;

    fn at(days: i64, secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + days * 86_400 + secs, 0).unwrap()
    }

    fn settled(
        stake: f64,
        odd: f64,
        line: f64,
        prediction: f64,
        observed: f64,
        ts: DateTime<Utc>,
    ) -> Wager {
        let m = CandidateMatch {
            id: uuid::Uuid::new_v4().to_string(),
            league: "Unknown".into(),
            home_team: "A".into(),
            away_team: "B".into(),
            referee: "Ref".into(),
            prediction,
            line,
            odd,
            edge: 20.0,
            side: Side::Under,
            created_at: ts,
        };
        let mut w = Wager::from_candidate(m, stake, ts);
        settlement::settle(&mut w, observed).expect("settle");
        w
    }

    fn open_wager(stake: f64, ts: DateTime<Utc>) -> Wager {
        let m = CandidateMatch {
            id: uuid::Uuid::new_v4().to_string(),
            league: "Unknown".into(),
            home_team: "A".into(),
            away_team: "B".into(),
            referee: "Ref".into(),
            prediction: 8.0,
            line: 10.0,
            odd: 1.9,
            edge: 20.0,
            side: Side::Under,
            created_at: ts,
        };
        Wager::from_candidate(m, stake, ts)
    }

    #[test]
    fn test_kpis_exclude_open_wagers() {
        let wagers = vec![
            settled(100.0, 1.9, 10.0, 8.0, 9.0, at(0, 0)),  // WON +90
            settled(100.0, 1.9, 10.0, 8.0, 12.0, at(0, 1)), // LOST -100
            open_wager(50.0, at(0, 2)),
        ];
        let k = compute_kpis(&wagers);
        assert_eq!(k.settled_count, 2);
        assert!((k.total_profit - (-10.0)).abs() < 1e-9);
        assert_eq!(k.total_stakes, 200.0);
        assert_eq!(k.win_rate, 50.0);
        assert!((k.roi - (-5.0)).abs() < 1e-9);
        assert_eq!(k.open_count, 1);
        assert_eq!(k.open_stake, 50.0);
    }

    #[test]
    fn test_kpis_zero_division_safety() {
        let k = compute_kpis(&[open_wager(50.0, at(0, 0))]);
        assert_eq!(k.win_rate, 0.0);
        assert_eq!(k.roi, 0.0);
    }

    #[test]
    fn test_void_counts_in_denominator() {
        let wagers = vec![
            settled(100.0, 1.9, 10.0, 8.0, 9.0, at(0, 0)),  // WON
            settled(100.0, 1.9, 10.0, 8.0, 10.0, at(0, 1)), // VOID (push)
        ];
        let k = compute_kpis(&wagers);
        assert_eq!(k.settled_count, 2);
        assert_eq!(k.win_rate, 50.0);
        assert!((k.total_profit - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_monotonicity() {
        // +90, -100, -100, +180, -100: peak never decreases,
        // drawdown never negative, max >= each point.
        let wagers = vec![
            settled(100.0, 1.9, 10.0, 8.0, 9.0, at(0, 0)),
            settled(100.0, 1.9, 10.0, 8.0, 12.0, at(0, 10)),
            settled(100.0, 1.9, 10.0, 8.0, 12.0, at(0, 20)),
            settled(100.0, 2.8, 10.0, 8.0, 9.0, at(0, 30)),
            settled(100.0, 1.9, 10.0, 8.0, 12.0, at(0, 40)),
        ];
        let series = cumulative_series(&wagers);
        let mut last_peak = f64::MIN;
        for p in &series.points {
            assert!(p.peak >= last_peak, "peak must be non-decreasing");
            assert!(p.drawdown >= 0.0);
            assert!(series.max_drawdown >= p.drawdown);
            assert!((p.drawdown - (p.peak - p.cumulative)).abs() < 1e-9);
            last_peak = p.peak;
        }
        // Cumulative path: 90, -10, -110, 60, -40. Peak after bet 1 is
        // 90, so the deepest trough is 90 - (-110) = 200.
        assert!((series.max_drawdown - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_series_sorts_by_timestamp() {
        let wagers = vec![
            settled(100.0, 1.9, 10.0, 8.0, 12.0, at(0, 50)), // later, LOST
            settled(100.0, 1.9, 10.0, 8.0, 9.0, at(0, 0)),   // earlier, WON
        ];
        let series = cumulative_series(&wagers);
        assert!((series.points[0].cumulative - 90.0).abs() < 1e-9);
        assert!((series.points[1].cumulative - (-10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_daily_series_regroups_per_day() {
        let wagers = vec![
            settled(100.0, 1.9, 10.0, 8.0, 9.0, at(0, 0)),    // day 0: +90
            settled(100.0, 1.9, 10.0, 8.0, 12.0, at(0, 100)), // day 0: -100
            settled(100.0, 1.9, 10.0, 8.0, 9.0, at(1, 0)),    // day 1: +90
        ];
        let days = daily_series(&wagers);
        assert_eq!(days.len(), 2);
        assert!((days[0].profit - (-10.0)).abs() < 1e-9);
        assert_eq!(days[0].count, 2);
        assert_eq!(days[0].wins, 1);
        // Day-level peak differs from the bet-level one (which saw +90
        // intraday); at day granularity the first point is already -10.
        assert_eq!(days[0].peak, 0.0);
        assert!((days[0].drawdown - 10.0).abs() < 1e-9);
        assert!((days[1].cumulative - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_report_needs_all_three_values() {
        let mut wagers = vec![
            settled(100.0, 1.9, 28.5, 22.1, 24.0, at(0, 0)),
            settled(100.0, 1.9, 30.0, 27.0, 31.0, at(0, 1)),
        ];
        wagers.push(open_wager(50.0, at(0, 2))); // no observed: excluded
        let acc = accuracy_report(&wagers);
        assert_eq!(acc.sample_count, 2);
        // model errors: |22.1-24| = 1.9, |27-31| = 4 -> mean 2.95
        assert!((acc.model_mae - 2.95).abs() < 1e-9);
        // line errors: |28.5-24| = 4.5, |30-31| = 1 -> mean 2.75
        assert!((acc.line_mae - 2.75).abs() < 1e-9);
        assert!((acc.efficiency - 2.75 / 2.95).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_report_empty_is_zeroed() {
        let acc = accuracy_report(&[]);
        assert_eq!(acc.sample_count, 0);
        assert_eq!(acc.model_mae, 0.0);
        assert_eq!(acc.efficiency, 0.0);
        assert_eq!(acc.clv, 0.0);
    }

    #[test]
    fn test_rolling_volatility_clips_at_start() {
        let wagers = vec![
            settled(100.0, 1.9, 10.0, 8.0, 9.0, at(0, 0)),
            settled(100.0, 1.9, 10.0, 8.0, 12.0, at(1, 0)),
            settled(100.0, 1.9, 10.0, 8.0, 9.0, at(2, 0)),
        ];
        let days = daily_series(&wagers);
        let vol = rolling_volatility(&days, VOLATILITY_WINDOW);
        assert_eq!(vol.len(), 3);
        assert_eq!(vol[0], 0.0, "single-day window has no deviation");
        assert!(vol[1] > 0.0);
        assert!(vol[2] > 0.0);
    }

    #[test]
    fn test_filter_by_range_and_edge() {
        let mut early = settled(100.0, 1.9, 10.0, 8.0, 9.0, at(0, 0));
        early.edge = 5.0;
        let late = settled(100.0, 1.9, 10.0, 8.0, 9.0, at(3, 0));

        let filter = StatsFilter {
            from: Some(at(1, 0)),
            ..Default::default()
        };
        assert_eq!(filter.apply(&[early.clone(), late.clone()]).len(), 1);

        let filter = StatsFilter {
            min_edge: Some(10.0),
            ..Default::default()
        };
        let kept = filter.apply(&[early, late]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].edge, 20.0);
    }
}
