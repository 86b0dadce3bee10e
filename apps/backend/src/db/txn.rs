use std::future::Future;
use std::pin::Pin;

use sea_orm::{DatabaseTransaction, TransactionTrait};
use tracing::warn;

use super::require_db;
use crate::error::AppError;
use crate::state::app_state::AppState;

/// Boxed future borrowed from the transaction for `'c`.
pub type TxnFuture<'c, R> = Pin<Box<dyn Future<Output = Result<R, AppError>> + 'c>>;

/// Run `f` inside one database transaction.
///
/// Commits on `Ok` and rolls back on `Err`. A future dropped midway also
/// rolls back, since `DatabaseTransaction` rolls back on drop.
///
/// ```ignore
/// with_txn(&state, |txn| Box::pin(async move {
///     lobbies::get_lobby(txn, &code).await.map_err(AppError::from)
/// })).await
/// ```
pub async fn with_txn<R, F>(state: &AppState, f: F) -> Result<R, AppError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxnFuture<'c, R>,
{
    let db = require_db(state)?;
    let txn = db.begin().await?;

    match f(&txn).await {
        Ok(val) => {
            txn.commit().await?;
            Ok(val)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "rollback failed after error");
            }
            Err(err)
        }
    }
}
