use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Local, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter};

use super::Store;
use super::schema::{COLLAPSE_DUPLICATE_JANS, SCHEMA, STOCK_ADDED_COLUMNS, STOCK_JAN_INDEX};
use crate::error::{Error, Result};
use crate::inventory::{LotRepository, Outcome, reconcile};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Operation log timestamps are local wall-clock time.
fn log_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

const LOT_COLUMNS: &str = "id, jan, COALESCE(item, ''), COALESCE(qty, 0), COALESCE(price, 0), \
                           COALESCE(company_id, 0), image";

fn lot_from_row(row: &Row<'_>) -> rusqlite::Result<StockLot> {
    Ok(StockLot {
        id: row.get(0)?,
        jan: row.get(1)?,
        item: row.get(2)?,
        qty: row.get(3)?,
        price: row.get(4)?,
        company_id: row.get(5)?,
        image: row.get(6)?,
    })
}

const STOCK_VIEW_SELECT: &str = "SELECT s.id, s.jan, COALESCE(s.item, ''), COALESCE(s.qty, 0), \
     COALESCE(s.price, 0), COALESCE(s.company_id, 0), c.name, \
     (s.image IS NOT NULL AND length(s.image) > 0) \
     FROM stock s LEFT JOIN companies c ON s.company_id = c.id";

fn stock_view_from_row(row: &Row<'_>) -> rusqlite::Result<StockView> {
    Ok(StockView {
        id: row.get(0)?,
        jan: row.get(1)?,
        item: row.get(2)?,
        qty: row.get(3)?,
        price: row.get(4)?,
        company_id: row.get(5)?,
        company_name: row.get(6)?,
        has_image: row.get(7)?,
    })
}

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        reg_num: row
            .get::<_, Option<String>>(2)?
            .filter(|s| !s.is_empty()),
    })
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let role: String = row.get(3)?;
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: Role::parse(&role).unwrap_or_default(),
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn query_lot_by_jan(conn: &Connection, jan: &str) -> Result<Option<StockLot>> {
    conn.query_row(
        &format!("SELECT {LOT_COLUMNS} FROM stock WHERE jan = ?1"),
        params![jan],
        lot_from_row,
    )
    .optional()
    .map_err(Error::from)
}

/// Lot primitives bound to an open transaction.
struct TxLots<'a> {
    conn: &'a Connection,
}

impl LotRepository for TxLots<'_> {
    fn find_lot_by_jan(&self, jan: &str) -> Result<Option<StockLot>> {
        query_lot_by_jan(self.conn, jan)
    }

    fn insert_lot(&self, lot: &NewLot) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO stock (jan, item, qty, price, company_id, image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                lot.jan,
                lot.item,
                lot.qty,
                lot.price,
                lot.company_id,
                lot.image,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete_lot_by_jan(&self, jan: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM stock WHERE jan = ?1", params![jan])?;
        Ok(())
    }
}

type LogSpec<'a> = (&'a str, &'a dyn Fn(usize, Outcome) -> String, &'a [String]);

fn insert_logs<I>(conn: &Connection, user: &str, actions: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let timestamp = log_timestamp();
    let mut stmt = conn.prepare("INSERT INTO logs (timestamp, user, action) VALUES (?1, ?2, ?3)")?;
    for action in actions {
        stmt.execute(params![timestamp, user, action.as_ref()])?;
    }
    Ok(())
}

impl SqliteStore {
    fn reconcile_in_tx(&self, lots: &[NewLot], log: Option<LogSpec<'_>>) -> Result<Vec<Outcome>> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let outcomes = {
            let repo = TxLots { conn: &tx };
            lots.iter()
                .map(|lot| reconcile(&repo, lot))
                .collect::<Result<Vec<_>>>()?
        };

        if let Some((user, describe, notes)) = log {
            let described = outcomes
                .iter()
                .enumerate()
                .map(|(i, outcome)| describe(i, *outcome));
            insert_logs(&tx, user, described.chain(notes.iter().cloned()))?;
        }

        tx.commit()?;
        Ok(outcomes)
    }

    fn migrate_stock(conn: &Connection) -> Result<()> {
        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(stock)")?
            .query_map([], |row| row.get(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (name, sql_type) in STOCK_ADDED_COLUMNS {
            if !columns.iter().any(|c| c == name) {
                tracing::info!("Adding missing column stock.{name}");
                conn.execute_batch(&format!("ALTER TABLE stock ADD COLUMN {name} {sql_type}"))?;
            }
        }

        let collapsed = conn.execute(COLLAPSE_DUPLICATE_JANS, [])?;
        if collapsed > 0 {
            tracing::warn!("Removed {collapsed} duplicate JAN lot(s), keeping the cheapest");
        }
        conn.execute_batch(STOCK_JAN_INDEX)?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        Self::migrate_stock(&tx)?;
        tx.commit()?;
        Ok(())
    }

    // Company operations

    fn create_company(&self, name: &str, reg_num: Option<&str>) -> Result<Company> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO companies (name, reg_num) VALUES (?1, ?2)",
            params![name, reg_num],
        )?;
        Ok(Company {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            reg_num: reg_num.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }

    fn get_company(&self, id: i64) -> Result<Option<Company>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, reg_num FROM companies WHERE id = ?1",
            params![id],
            company_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, reg_num FROM companies WHERE name = ?1 ORDER BY id LIMIT 1",
            params![name],
            company_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_companies(&self) -> Result<Vec<Company>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, reg_num FROM companies ORDER BY id")?;
        let rows = stmt.query_map([], company_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_company(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM companies WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Stock operations

    fn reconcile_lots(&self, lots: &[NewLot]) -> Result<Vec<Outcome>> {
        self.reconcile_in_tx(lots, None)
    }

    fn reconcile_lots_logged(
        &self,
        lots: &[NewLot],
        user: &str,
        describe: &dyn Fn(usize, Outcome) -> String,
        notes: &[String],
    ) -> Result<Vec<Outcome>> {
        self.reconcile_in_tx(lots, Some((user, describe, notes)))
    }

    fn find_lot_by_jan(&self, jan: &str) -> Result<Option<StockLot>> {
        query_lot_by_jan(&self.conn(), jan)
    }

    fn get_lot(&self, id: i64) -> Result<Option<StockLot>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {LOT_COLUMNS} FROM stock WHERE id = ?1"),
            params![id],
            lot_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_stock(&self) -> Result<Vec<StockView>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{STOCK_VIEW_SELECT} ORDER BY s.id"))?;
        let rows = stmt.query_map([], stock_view_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_stock_by_ids(&self, ids: &[i64]) -> Result<Vec<StockView>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{STOCK_VIEW_SELECT} WHERE s.id IN ({placeholders}) ORDER BY s.id"
        ))?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), stock_view_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Operation log

    fn append_log(&self, user: &str, action: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO logs (timestamp, user, action) VALUES (?1, ?2, ?3)",
            params![log_timestamp(), user, action],
        )?;
        Ok(())
    }

    fn list_logs(&self, limit: i64) -> Result<Vec<LogEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, COALESCE(timestamp, ''), COALESCE(user, ''), COALESCE(action, '')
             FROM logs ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(LogEntry {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                user: row.get(2)?,
                action: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Account operations

    fn create_account(&self, username: &str, password_hash: &str, role: Role) -> Result<Account> {
        let created_at = Utc::now();
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO accounts (username, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, password_hash, role.as_str(), format_datetime(&created_at)],
        );

        match result {
            Ok(_) => Ok(Account {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role,
                created_at,
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, username, password_hash, role, created_at FROM accounts WHERE id = ?1",
            params![id],
            account_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, username, password_hash, role, created_at
             FROM accounts WHERE username = ?1",
            params![username],
            account_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, username, password_hash, role, created_at FROM accounts ORDER BY id",
        )?;
        let rows = stmt.query_map([], account_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn has_admin_account(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO sessions (id, account_id, token_lookup, token_hash, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.account_id,
                session.token_lookup,
                session.token_hash,
                format_datetime(&session.created_at),
                format_datetime(&session.expires_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::SessionLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, account_id, token_lookup, token_hash, created_at, expires_at
             FROM sessions WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    token_lookup: row.get(2)?,
                    token_hash: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_expired_sessions(&self) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![format_datetime(&Utc::now())],
        )?;
        Ok(rows)
    }}
