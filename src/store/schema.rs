pub const SCHEMA: &str = r#"
-- Suppliers and customers; name is matched exactly by the importer
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY,
    name TEXT,
    reg_num TEXT                -- invoice registration number, e.g. T1234567890123
);

-- Inventory lots. company_id is intentionally not a foreign key: deleting a
-- company leaves its lots in place and they report as "unknown company".
CREATE TABLE IF NOT EXISTS stock (
    id INTEGER PRIMARY KEY,
    item TEXT,
    qty INTEGER,
    price INTEGER,
    company_id INTEGER,
    image BLOB,
    jan TEXT                    -- NULL = exempt from the one-lot-per-JAN rule
);

-- Append-only operation log
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY,
    timestamp TEXT,
    user TEXT,
    action TEXT
);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2id hash with embedded salt
    role TEXT NOT NULL DEFAULT 'staff',
    created_at TEXT DEFAULT (datetime('now'))
);

-- Login sessions; only the hash of the bearer token is kept
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    token_lookup TEXT NOT NULL,      -- first 8 chars of a UUID for fast lookup
    token_hash TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_lookup ON sessions(token_lookup);
CREATE INDEX IF NOT EXISTS idx_sessions_account ON sessions(account_id);
CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name);
"#;

/// Columns added to `stock` after its first release. Older databases get
/// them through `ALTER TABLE` at startup.
pub const STOCK_ADDED_COLUMNS: &[(&str, &str)] = &[("jan", "TEXT"), ("image", "BLOB")];

/// Collapses duplicate JAN lots left behind by older versions, keeping the
/// cheapest (lowest id on ties), so the unique index below can be created.
pub const COLLAPSE_DUPLICATE_JANS: &str = r#"
DELETE FROM stock
WHERE jan IS NOT NULL
  AND id NOT IN (
    SELECT id FROM (
        SELECT id, ROW_NUMBER() OVER (PARTITION BY jan ORDER BY price, id) AS rn
        FROM stock
        WHERE jan IS NOT NULL
    )
    WHERE rn = 1
  )
"#;

pub const STOCK_JAN_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_stock_jan ON stock(jan) WHERE jan IS NOT NULL";
