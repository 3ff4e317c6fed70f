mod commands;
mod import;
mod info;
mod init;
mod user;

pub use commands::{AdminCommands, ImportArgs, UserCommands};
pub use import::run_import;
pub use info::run_info;
pub use init::{ADMIN_PASSWORD_FILE, ADMIN_USERNAME, run_init};
pub use user::run_user_add;

use crate::config::DB_FILE_NAME;
use crate::store::{SqliteStore, Store};

/// Opens the store in an initialized data directory. The schema check is
/// re-run so databases from older releases gain missing columns.
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let data_path: std::path::PathBuf = data_dir.into();
    let db_path = data_path.join(DB_FILE_NAME);

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'shopdesk admin init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    Ok(store)
}
