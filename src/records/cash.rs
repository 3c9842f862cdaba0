use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    Deposit,
    Withdrawal,
}

/// One deposit or withdrawal. Append-only: corrections are recorded as
/// reversing entries, existing movements are never edited or deleted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashMovement {
    pub id: String,
    pub kind: MovementKind,
    pub amount: f64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl CashMovement {
    pub fn new(kind: MovementKind, amount: f64, description: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("tx-{}", uuid::Uuid::new_v4()),
            kind,
            amount,
            description,
            timestamp,
        }
    }

    /// Signed contribution to the transaction balance.
    #[inline]
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            MovementKind::Deposit => self.amount,
            MovementKind::Withdrawal => -self.amount,
        }
    }
}
