use serde::Serialize;

use crate::store::Store;
use crate::types::Role;

use super::init_store;

const RECENT_LOG_ENTRIES: i64 = 5;

#[derive(Serialize)]
struct AccountOutput {
    username: String,
    role: Role,
    created_at: String,
}

#[derive(Serialize)]
struct LogOutput {
    timestamp: String,
    user: String,
    action: String,
}

#[derive(Serialize)]
struct DataInfo {
    companies: usize,
    lots: usize,
    lots_without_jan: usize,
    dangling_lots: usize,
    stock_value: i64,
    accounts: Vec<AccountOutput>,
    recent_log: Vec<LogOutput>,
}

pub fn run_info(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let companies = store.list_companies()?;
    let lots = store.list_stock()?;

    let info = DataInfo {
        companies: companies.len(),
        lots: lots.len(),
        lots_without_jan: lots.iter().filter(|l| l.jan.is_none()).count(),
        dangling_lots: lots.iter().filter(|l| l.company_name.is_none()).count(),
        stock_value: lots.iter().map(|l| l.total_value()).sum(),
        accounts: store
            .list_accounts()?
            .into_iter()
            .map(|a| AccountOutput {
                username: a.username,
                role: a.role,
                created_at: a.created_at.to_rfc3339(),
            })
            .collect(),
        recent_log: store
            .list_logs(RECENT_LOG_ENTRIES)?
            .into_iter()
            .map(|e| LogOutput {
                timestamp: e.timestamp,
                user: e.user,
                action: e.action,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("Companies:      {}", info.companies);
    println!(
        "Stock lots:     {} ({} without JAN, {} with unknown company)",
        info.lots, info.lots_without_jan, info.dangling_lots
    );
    println!("Stock value:    {}", info.stock_value);
    println!();
    println!("Accounts:");
    if info.accounts.is_empty() {
        println!("  (none)");
    }
    for account in &info.accounts {
        println!("  {:<20} {}", account.username, account.role);
    }
    println!();
    println!("Recent activity:");
    if info.recent_log.is_empty() {
        println!("  (none)");
    }
    for entry in &info.recent_log {
        println!("  {}  {:<12} {}", entry.timestamp, entry.user, entry.action);
    }
    println!();

    Ok(())
}
