use crate::config::AppConfig;
use crate::errors::{TrackerError, TrackerResult};
use crate::records::{CandidateMatch, CashMovement, MovementKind, Wager};
use crate::stats::{bankroll, settlement};
use crate::store::Store;
use chrono::{DateTime, Local, Utc};
use portable_atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::RwLock;

// ── Session state machine ──

/// Replaces the original deferred-write flag with an explicit
/// transition: saves are suppressed unless the session is Ready, so an
/// empty in-memory collection can never overwrite persisted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Loading,
    Ready,
    LoadFailed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::LoadFailed => write!(f, "load_failed"),
        }
    }
}

/// The two record collections plus the load-gate phase. Exclusively
/// owned by the running session; statistics are recomputed from full
/// snapshots on every read.
pub struct Session {
    pub wagers: Vec<Wager>,
    pub movements: Vec<CashMovement>,
    pub phase: SessionPhase,
}

impl Session {
    pub fn new() -> Self {
        Self {
            wagers: Vec::new(),
            movements: Vec::new(),
            phase: SessionPhase::Loading,
        }
    }

    fn ensure_ready(&self) -> TrackerResult<()> {
        match self.phase {
            SessionPhase::Ready => Ok(()),
            SessionPhase::Loading => Err(TrackerError::NotReady("initial load in progress")),
            SessionPhase::LoadFailed => Err(TrackerError::NotReady(
                "initial load failed; saving is blocked to avoid data loss",
            )),
        }
    }

    pub fn balance(&self, now: DateTime<Utc>) -> f64 {
        bankroll::current_balance(&self.movements, &self.wagers, now)
    }

    fn find_wager_mut(&mut self, id: &str) -> TrackerResult<&mut Wager> {
        self.wagers
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    // ── Mutation entry points (validate, then mutate; no partial state) ──

    /// Promote candidates into open wagers with a shared stake.
    /// Rejected before any wager is created when the total stake
    /// exceeds the current balance.
    pub fn place_bets(
        &mut self,
        candidates: Vec<CandidateMatch>,
        stake: f64,
        now: DateTime<Utc>,
    ) -> TrackerResult<Vec<String>> {
        self.ensure_ready()?;
        if candidates.is_empty() {
            return Err(TrackerError::InvalidValue("no matches selected".into()));
        }
        if !stake.is_finite() || stake <= 0.0 {
            return Err(TrackerError::InvalidValue(format!("stake must be positive, got {stake}")));
        }

        let needed = stake * candidates.len() as f64;
        let available = self.balance(now);
        if needed > available {
            return Err(TrackerError::InsufficientFunds { needed, available });
        }

        let ids: Vec<String> = candidates.iter().map(|m| m.id.clone()).collect();
        self.wagers
            .extend(candidates.into_iter().map(|m| Wager::from_candidate(m, stake, now)));

        tracing::info!(count = ids.len(), stake, "bets placed");
        Ok(ids)
    }

    pub fn settle_wager(&mut self, id: &str, observed: f64) -> TrackerResult<Wager> {
        self.ensure_ready()?;
        let wager = self.find_wager_mut(id)?;
        settlement::settle(wager, observed)?;
        tracing::info!(id, observed, status = ?wager.status, profit = wager.profit, "wager settled");
        Ok(wager.clone())
    }

    /// Undo a settlement. Same-day only.
    pub fn reset_wager(&mut self, id: &str, now: DateTime<Utc>) -> TrackerResult<Wager> {
        self.ensure_ready()?;
        let wager = self.find_wager_mut(id)?;
        if !same_local_day(wager.placed_at, now) {
            return Err(TrackerError::SameDayOnly("reset"));
        }
        settlement::reset_to_open(wager);
        tracing::info!(id, "wager reset to open");
        Ok(wager.clone())
    }

    /// Correct the priced odd. Settled wagers are locked after the bet
    /// day; open wagers stay editable from the active view.
    pub fn reprice_wager(&mut self, id: &str, new_odd: f64, now: DateTime<Utc>) -> TrackerResult<bool> {
        self.ensure_ready()?;
        let wager = self.find_wager_mut(id)?;
        if wager.is_settled() && !same_local_day(wager.placed_at, now) {
            return Err(TrackerError::SameDayOnly("odd correction"));
        }
        Ok(settlement::reprice(wager, new_odd))
    }

    /// Remove a wager, returning its stake to the balance. Same-day only.
    pub fn delete_wager(&mut self, id: &str, now: DateTime<Utc>) -> TrackerResult<()> {
        self.ensure_ready()?;
        let wager = self
            .wagers
            .iter()
            .find(|w| w.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        if !same_local_day(wager.placed_at, now) {
            return Err(TrackerError::SameDayOnly("deletion"));
        }
        self.wagers.retain(|w| w.id != id);
        tracing::info!(id, "wager deleted");
        Ok(())
    }

    /// Record a deposit or withdrawal. Movements are append-only;
    /// corrections are reversing entries.
    pub fn record_movement(
        &mut self,
        kind: MovementKind,
        amount: f64,
        description: String,
        now: DateTime<Utc>,
    ) -> TrackerResult<String> {
        self.ensure_ready()?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(TrackerError::InvalidValue(format!("amount must be positive, got {amount}")));
        }
        let movement = CashMovement::new(kind, amount, description, now);
        let id = movement.id.clone();
        self.movements.push(movement);
        Ok(id)
    }
}

fn same_local_day(placed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    placed_at.with_timezone(&Local).date_naive() == now.with_timezone(&Local).date_naive()
}

// ── Operation counters (lock-free) ──

pub struct OpCounters {
    pub imports_parsed: AtomicU64,
    pub bets_placed: AtomicU64,
    pub settlements: AtomicU64,
}

impl OpCounters {
    pub fn new() -> Self {
        Self {
            imports_parsed: AtomicU64::new(0),
            bets_placed: AtomicU64::new(0),
            settlements: AtomicU64::new(0),
        }
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub session: RwLock<Session>,
    pub counters: OpCounters,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            session: RwLock::new(Session::new()),
            counters: OpCounters::new(),
        })
    }

    /// Initial load of both collections. On success the session
    /// becomes Ready and saving unlocks; on failure it blocks.
    pub async fn run_initial_load(&self) {
        let (wagers, movements) = tokio::join!(self.store.load_wagers(), self.store.load_movements());
        let mut session = self.session.write().await;
        match (wagers, movements) {
            (Ok(wagers), Ok(movements)) => {
                tracing::info!(
                    wagers = wagers.len(),
                    movements = movements.len(),
                    "initial load complete, session ready"
                );
                session.wagers = wagers;
                session.movements = movements;
                session.phase = SessionPhase::Ready;
            }
            (w, m) => {
                if let Err(e) = w {
                    tracing::error!(error = %e, "wager load failed");
                }
                if let Err(e) = m {
                    tracing::error!(error = %e, "movement load failed");
                }
                session.phase = SessionPhase::LoadFailed;
                tracing::error!("initial load failed; saves suppressed until a reload succeeds");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Side, WagerStatus};
    use crate::stats::aggregate;
    use chrono::Duration;

    fn ready_session() -> Session {
        let mut s = Session::new();
        s.phase = SessionPhase::Ready;
        s
    }

    fn candidate(side: Side, prediction: f64, line: f64, odd: f64) -> CandidateMatch {
        CandidateMatch {
            id: format!("m-{}", uuid::Uuid::new_v4()),
            league: "Unknown".into(),
            home_team: "A".into(),
            away_team: "B".into(),
            referee: "Ref".into(),
            prediction,
            line,
            odd,
            edge: 15.0,
            side,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut s = ready_session();
        let t0 = Utc::now() - Duration::minutes(10);
        let t1 = Utc::now() - Duration::minutes(5);
        let now = Utc::now();

        s.record_movement(MovementKind::Deposit, 1000.0, "initial".into(), t0)
            .expect("deposit");
        assert_eq!(s.balance(t0), 1000.0);

        let ids = s
            .place_bets(
                vec![
                    candidate(Side::Under, 8.0, 10.0, 1.9),
                    candidate(Side::Over, 12.0, 10.0, 1.9),
                ],
                100.0,
                t1,
            )
            .expect("place");
        assert_eq!(s.balance(now), 800.0, "stakes committed at placement");

        let w1 = s.settle_wager(&ids[0], 9.0).expect("settle under");
        assert_eq!(w1.status, WagerStatus::Won);
        assert!((w1.profit - 90.0).abs() < 1e-9);

        let w2 = s.settle_wager(&ids[1], 9.0).expect("settle over");
        assert_eq!(w2.status, WagerStatus::Lost);
        assert_eq!(w2.profit, -100.0);

        // 1000 - 200 + 190 (won payout) + 0
        assert!((s.balance(now) - 990.0).abs() < 1e-9);

        let kpis = aggregate::compute_kpis(&s.wagers);
        assert!((kpis.total_profit - (-10.0)).abs() < 1e-9);
        assert_eq!(kpis.win_rate, 50.0);
        assert!((kpis.roi - (-5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_funds_rejected_before_mutation() {
        let mut s = ready_session();
        let now = Utc::now();
        s.record_movement(MovementKind::Deposit, 150.0, "small".into(), now)
            .expect("deposit");

        let err = s.place_bets(
            vec![
                candidate(Side::Under, 8.0, 10.0, 1.9),
                candidate(Side::Under, 8.0, 10.0, 1.9),
            ],
            100.0,
            now,
        );
        assert!(matches!(err, Err(TrackerError::InsufficientFunds { .. })));
        assert!(s.wagers.is_empty(), "no partial placement");
    }

    #[test]
    fn test_same_day_policy_blocks_old_wagers() {
        let mut s = ready_session();
        let now = Utc::now();
        let two_days_ago = now - Duration::days(2);

        s.record_movement(MovementKind::Deposit, 1000.0, "d".into(), two_days_ago)
            .expect("deposit");
        let ids = s
            .place_bets(vec![candidate(Side::Under, 8.0, 10.0, 1.9)], 100.0, two_days_ago)
            .expect("place");
        s.settle_wager(&ids[0], 9.0).expect("settle");

        let err = s.delete_wager(&ids[0], now);
        assert!(matches!(err, Err(TrackerError::SameDayOnly(_))));
        assert_eq!(s.wagers.len(), 1, "wager untouched");

        let err = s.reset_wager(&ids[0], now);
        assert!(matches!(err, Err(TrackerError::SameDayOnly(_))));
        assert_eq!(s.wagers[0].status, WagerStatus::Won, "status untouched");

        let err = s.reprice_wager(&ids[0], 2.0, now);
        assert!(matches!(err, Err(TrackerError::SameDayOnly(_))));
    }

    #[test]
    fn test_same_day_operations_allowed_today() {
        let mut s = ready_session();
        let now = Utc::now();
        s.record_movement(MovementKind::Deposit, 500.0, "d".into(), now)
            .expect("deposit");
        let ids = s
            .place_bets(vec![candidate(Side::Under, 8.0, 10.0, 1.9)], 100.0, now)
            .expect("place");

        s.settle_wager(&ids[0], 9.0).expect("settle");
        s.reset_wager(&ids[0], now).expect("same-day reset");
        assert_eq!(s.wagers[0].status, WagerStatus::Open);

        s.delete_wager(&ids[0], now).expect("same-day delete");
        assert!(s.wagers.is_empty());
        assert_eq!(s.balance(now), 500.0, "deleted stake returns to balance");
    }

    #[test]
    fn test_mutations_blocked_until_ready() {
        let mut s = Session::new();
        let err = s.record_movement(MovementKind::Deposit, 100.0, "d".into(), Utc::now());
        assert!(matches!(err, Err(TrackerError::NotReady(_))));

        s.phase = SessionPhase::LoadFailed;
        let err = s.place_bets(vec![candidate(Side::Under, 8.0, 10.0, 1.9)], 10.0, Utc::now());
        assert!(matches!(err, Err(TrackerError::NotReady(_))));
    }

    #[test]
    fn test_movement_validation() {
        let mut s = ready_session();
        let now = Utc::now();
        assert!(s.record_movement(MovementKind::Deposit, 0.0, "z".into(), now).is_err());
        assert!(s.record_movement(MovementKind::Deposit, f64::NAN, "n".into(), now).is_err());
        assert!(s.movements.is_empty());
    }

    #[test]
    fn test_settle_unknown_wager_is_not_found() {
        let mut s = ready_session();
        let err = s.settle_wager("missing", 9.0);
        assert!(matches!(err, Err(TrackerError::NotFound(_))));
    }
}
