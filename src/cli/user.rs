use inquire::{Password, Text};

use crate::auth::{TokenGenerator, generate_password};
use crate::error::Error;
use crate::server::validation::validate_username;
use crate::store::Store;
use crate::types::Role;

use super::init_store;

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn prompt_username() -> anyhow::Result<String> {
    Text::new("Username:")
        .with_validator(|input: &str| {
            Ok(validate_username(input)
                .map(|()| inquire::validator::Validation::Valid)
                .unwrap_or_else(|e| inquire::validator::Validation::Invalid(e.into())))
        })
        .prompt()
        .map_err(Into::into)
}

pub(crate) fn prompt_password() -> anyhow::Result<String> {
    Password::new("Password:")
        .with_validator(|input: &str| {
            if input.chars().count() < MIN_PASSWORD_LEN {
                Ok(inquire::validator::Validation::Invalid(
                    format!("Password must have at least {MIN_PASSWORD_LEN} characters").into(),
                ))
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()
        .map_err(Into::into)
}

pub fn run_user_add(
    data_dir: String,
    username: Option<String>,
    role: Role,
    password: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let username = if let Some(name) = username {
        validate_username(&name).map_err(anyhow::Error::msg)?;
        name
    } else if non_interactive {
        anyhow::bail!("--username is required in non-interactive mode");
    } else {
        prompt_username()?
    };

    if store.get_account_by_username(&username)?.is_some() {
        anyhow::bail!("Account '{}' already exists", username);
    }

    let (password, generated) = match password {
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
            anyhow::bail!("Password must have at least {MIN_PASSWORD_LEN} characters")
        }
        Some(p) => (p, false),
        None if non_interactive => (generate_password(), true),
        None => (prompt_password()?, false),
    };

    let generator = TokenGenerator::new();
    let account = match store.create_account(&username, &generator.hash(&password)?, role) {
        Ok(account) => account,
        Err(Error::AlreadyExists) => anyhow::bail!("Account '{}' already exists", username),
        Err(e) => return Err(e.into()),
    };
    store.append_log("cli", &format!("Added {} account {}", role, account.username))?;

    println!();
    println!("Created {} account \"{}\"", account.role, account.username);
    if generated {
        println!("Password: {password}");
        println!("  Save this now - it cannot be retrieved later.");
    }
    println!();

    Ok(())
}
