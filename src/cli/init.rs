use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;

use crate::auth::{TokenGenerator, generate_password};
use crate::config::DB_FILE_NAME;
use crate::store::{SqliteStore, Store};
use crate::types::Role;

use super::user::{prompt_password, prompt_username};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD_FILE: &str = ".admin_password";

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

pub fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let data_path = PathBuf::from(data_dir);
    fs::create_dir_all(&data_path)?;

    let store = SqliteStore::new(data_path.join(DB_FILE_NAME))?;
    store.initialize()?;

    let password_file = data_path.join(ADMIN_PASSWORD_FILE);

    if store.has_admin_account()? {
        bail!(
            "Already initialized. Admin password was written to: {}",
            password_file.display()
        );
    }

    let generator = TokenGenerator::new();
    let password = generate_password();
    store.create_account(ADMIN_USERNAME, &generator.hash(&password)?, Role::Admin)?;
    store.append_log("cli", "Initialized data directory")?;

    fs::write(&password_file, &password)?;

    #[cfg(unix)]
    set_restrictive_permissions(&password_file);

    println!();
    println!("========================================");
    println!("Admin account '{ADMIN_USERNAME}' created with password:");
    println!();
    println!("  {password}");
    println!();
    println!("Password also written to: {}", password_file.display());
    println!("========================================");
    println!();

    if !non_interactive {
        create_staff_prompt(&store, &generator)?;
    }

    Ok(())
}

fn create_staff_prompt(store: &SqliteStore, generator: &TokenGenerator) -> anyhow::Result<()> {
    let create = inquire::Confirm::new("Would you like to create a staff account?")
        .with_default(false)
        .prompt()?;

    if !create {
        return Ok(());
    }

    let username = prompt_username()?;
    let password = prompt_password()?;
    store.create_account(&username, &generator.hash(&password)?, Role::Staff)?;

    println!();
    println!("Created staff account '{username}'");
    println!();

    Ok(())
}
