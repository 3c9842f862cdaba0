use chrono::{DateTime, Utc};

/// Which side of the bookmaker line the bet is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Under,
    Over,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Under => write!(f, "UNDER"),
            Self::Over => write!(f, "OVER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WagerStatus {
    Open,
    Won,
    Lost,
    Void,
}

/// A parsed prediction awaiting a stake. Transient: promoted into a
/// `Wager` when the user commits, never persisted on its own.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMatch {
    pub id: String,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub referee: String,
    /// Model-predicted value, same unit as the bookmaker line.
    pub prediction: f64,
    /// Bookmaker line (numeric threshold).
    pub line: f64,
    /// Priced decimal odd, >= 1.0.
    pub odd: f64,
    /// Claimed model-vs-market advantage, percent.
    pub edge: f64,
    pub side: Side,
    pub created_at: DateTime<Utc>,
}

/// One placed bet. Mutated in place by settlement and odd correction,
/// deleted only while still same-day.
///
/// Invariant: while OPEN, profit == -stake (capital at risk). Settled:
/// WON -> stake*(odd-1), LOST -> -stake, VOID -> 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wager {
    pub id: String,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub referee: String,
    pub prediction: f64,
    pub line: f64,
    pub odd: f64,
    pub edge: f64,
    pub side: Side,
    pub stake: f64,
    pub status: WagerStatus,
    /// Observed outcome value, present once settled.
    pub observed: Option<f64>,
    pub profit: f64,
    /// Placement instant; also the bet date for same-day-edit rules.
    pub placed_at: DateTime<Utc>,
}

impl Wager {
    /// Promote a candidate into an open wager with the given stake.
    pub fn from_candidate(m: CandidateMatch, stake: f64, placed_at: DateTime<Utc>) -> Self {
        Self {
            id: m.id,
            league: m.league,
            home_team: m.home_team,
            away_team: m.away_team,
            referee: m.referee,
            prediction: m.prediction,
            line: m.line,
            odd: m.odd,
            edge: m.edge,
            side: m.side,
            stake,
            status: WagerStatus::Open,
            observed: None,
            profit: -stake,
            placed_at,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == WagerStatus::Open
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.status != WagerStatus::Open
    }

    /// Gross amount credited back to the bankroll for this wager.
    /// LOST and OPEN wagers credit nothing; their stake stays deducted.
    #[inline]
    pub fn payout(&self) -> f64 {
        match self.status {
            WagerStatus::Won => self.stake * self.odd,
            WagerStatus::Void => self.stake,
            WagerStatus::Open | WagerStatus::Lost => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> CandidateMatch {
        CandidateMatch {
            id: "m1".into(),
            league: "Unknown".into(),
            home_team: "Como".into(),
            away_team: "Udinese".into(),
            referee: "Arena A.".into(),
            prediction: 22.1,
            line: 28.5,
            odd: 1.91,
            edge: 25.8,
            side: Side::Under,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_wager_profit_is_negative_stake() {
        let w = Wager::from_candidate(candidate(), 100.0, Utc::now());
        assert_eq!(w.status, WagerStatus::Open);
        assert_eq!(w.profit, -100.0);
        assert_eq!(w.payout(), 0.0, "open wager credits nothing back");
    }

    #[test]
    fn test_payout_by_status() {
        let mut w = Wager::from_candidate(candidate(), 50.0, Utc::now());
        w.status = WagerStatus::Won;
        assert!((w.payout() - 50.0 * 1.91).abs() < 1e-9);
        w.status = WagerStatus::Void;
        assert_eq!(w.payout(), 50.0);
        w.status = WagerStatus::Lost;
        assert_eq!(w.payout(), 0.0);
    }

    #[test]
    fn test_wire_shape_round_trips_uppercase_enums() {
        let w = Wager::from_candidate(candidate(), 10.0, Utc::now());
        let json = serde_json::to_value(&w).expect("serialize");
        assert_eq!(json["side"], "UNDER");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["homeTeam"], "Como");
        let back: Wager = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.id, "m1");
    }
}
