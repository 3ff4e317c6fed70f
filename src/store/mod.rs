mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::inventory::Outcome;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    /// Creates missing tables, adds missing columns and indexes. Idempotent,
    /// so it doubles as the repair action.
    fn initialize(&self) -> Result<()>;

    // Company operations
    fn create_company(&self, name: &str, reg_num: Option<&str>) -> Result<Company>;
    fn get_company(&self, id: i64) -> Result<Option<Company>>;
    /// Exact name match. Names are not unique; the oldest company wins.
    fn find_company_by_name(&self, name: &str) -> Result<Option<Company>>;
    fn list_companies(&self) -> Result<Vec<Company>>;
    fn delete_company(&self, id: i64) -> Result<bool>;

    // Stock operations
    /// Reconciles every lot in order inside one transaction. Either all
    /// outcomes are applied or none are.
    fn reconcile_lots(&self, lots: &[NewLot]) -> Result<Vec<Outcome>>;
    /// Like [`Store::reconcile_lots`], and writes the operation log in the
    /// same transaction: `describe(index, outcome)` for every lot, then
    /// `notes`. A failed log write rolls the stock changes back as well.
    fn reconcile_lots_logged(
        &self,
        lots: &[NewLot],
        user: &str,
        describe: &dyn Fn(usize, Outcome) -> String,
        notes: &[String],
    ) -> Result<Vec<Outcome>>;
    fn reconcile_lot(&self, lot: &NewLot) -> Result<Outcome> {
        let outcomes = self.reconcile_lots(std::slice::from_ref(lot))?;
        Ok(outcomes[0])
    }
    fn reconcile_lot_logged(
        &self,
        lot: &NewLot,
        user: &str,
        describe: &dyn Fn(Outcome) -> String,
    ) -> Result<Outcome> {
        let outcomes = self.reconcile_lots_logged(
            std::slice::from_ref(lot),
            user,
            &|_, outcome| describe(outcome),
            &[],
        )?;
        Ok(outcomes[0])
    }
    fn find_lot_by_jan(&self, jan: &str) -> Result<Option<StockLot>>;
    fn get_lot(&self, id: i64) -> Result<Option<StockLot>>;
    fn list_stock(&self) -> Result<Vec<StockView>>;
    fn list_stock_by_ids(&self, ids: &[i64]) -> Result<Vec<StockView>>;

    // Operation log
    fn append_log(&self, user: &str, action: &str) -> Result<()>;
    fn list_logs(&self, limit: i64) -> Result<Vec<LogEntry>>;

    // Account operations
    fn create_account(&self, username: &str, password_hash: &str, role: Role) -> Result<Account>;
    fn get_account(&self, id: i64) -> Result<Option<Account>>;
    fn get_account_by_username(&self, username: &str) -> Result<Option<Account>>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
    fn has_admin_account(&self) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn delete_expired_sessions(&self) -> Result<usize>;
}
