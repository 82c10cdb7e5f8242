pub mod availability;
pub mod booking;
pub mod expiry;
pub mod lifecycle;
pub mod payment;

use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Runs `f` inside an IMMEDIATE transaction and commits on success. The write
/// lock is taken at BEGIN, so concurrent writers queue behind `busy_timeout`.
/// A failed rollback is logged; the caller always gets the original error.
pub(crate) fn in_immediate_tx<T>(
    conn: &mut Connection,
    operation: &str,
    f: impl FnOnce(&Connection) -> AppResult<T>,
) -> AppResult<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    match f(&*tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(
                    operation,
                    error = %rollback_err,
                    "failed to roll back transaction"
                );
            }
            Err(err)
        }
    }
}

pub(crate) fn parse_id(what: &str, raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("invalid {what} id: {raw}")))
}
