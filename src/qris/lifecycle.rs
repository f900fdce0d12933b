use chrono::{DateTime, Duration, Utc};

use crate::models::{TransactionRecord, TransactionStatus};

/// Cancellation backdates the expiry, so later evaluations land on the same
/// terminal path as a natural timeout.
pub const DEACTIVATION_BACKDATE_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Active,
    /// `newly_expired` asks the caller to persist the `expired` transition;
    /// it is false on every later evaluation of the same record.
    Inactive { newly_expired: bool },
}

impl Liveness {
    pub fn is_active(self) -> bool {
        matches!(self, Liveness::Active)
    }
}

/// Liveness rules, in order: missing record, past expiry, non-active stored
/// status, otherwise live.
pub fn evaluate(record: Option<&TransactionRecord>, now: DateTime<Utc>) -> Liveness {
    let Some(record) = record else {
        return Liveness::Inactive {
            newly_expired: false,
        };
    };
    if record.expired_at < now {
        return Liveness::Inactive {
            newly_expired: record.status != TransactionStatus::Expired,
        };
    }
    if record.status != TransactionStatus::Active {
        return Liveness::Inactive {
            newly_expired: false,
        };
    }
    Liveness::Active
}

/// Paid is a transient judgment, never a stored state: the record must be
/// live and the settled amount observed at the gateway must equal the total
/// the caller expects.
pub fn is_paid(liveness: Liveness, expected_total: u64, settled_amount: Option<u64>) -> bool {
    liveness.is_active() && settled_amount == Some(expected_total)
}

/// `TRX-` + an injected base36 fragment + the tail of the millisecond clock.
pub fn transaction_id(fragment: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().to_string();
    let suffix = millis.get(8..).unwrap_or("");
    format!("TRX-{fragment}{suffix}")
}

pub fn expiry(now: DateTime<Utc>, ttl_minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(ttl_minutes)
}

pub fn backdated_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::seconds(DEACTIVATION_BACKDATE_SECS)
}
